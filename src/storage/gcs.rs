//! Google Cloud Storage backend, speaking the JSON API over HTTP.
//!
//! Three calls cover everything the gateway needs:
//!
//! - list:        `GET  {api}/storage/v1/b/{bucket}/o`
//! - write:       `POST {api}/upload/storage/v1/b/{bucket}/o?uploadType=media&name={name}`
//! - set public:  `POST {api}/storage/v1/b/{bucket}/o/{name}/acl`
//!
//! The write is a single-shot media upload (non-resumable). The API base is
//! configurable so tests and emulators (e.g. fake-gcs-server) can stand in
//! for the real service; the public URL base is configured separately because
//! public links must keep the canonical `storage.googleapis.com` form.
//!
//! Authentication is a static bearer token when one is configured. Token
//! acquisition (service accounts, workload identity) belongs to the
//! deployment harness, not this client.

use super::{ObjectMeta, ObjectStore, StorageError};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header::CONTENT_TYPE, RequestBuilder};
use serde::Deserialize;
use url::Url;

pub struct GcsStore {
    http: reqwest::Client,
    bucket: String,
    api_base: Url,
    public_base: String,
    auth_token: Option<String>,
}

impl GcsStore {
    pub fn new(bucket: impl Into<String>, api_base: Url, public_base: &Url, auth_token: Option<String>) -> anyhow::Result<Self> {
        anyhow::ensure!(
            !api_base.cannot_be_a_base(),
            "storage api_base must be an absolute http(s) URL"
        );
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            bucket: bucket.into(),
            api_base,
            public_base: public_base.as_str().trim_end_matches('/').to_string(),
            auth_token,
        })
    }

    /// Join percent-encoded path segments onto the API base.
    fn api_url(&self, segments: &[&str]) -> Url {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .expect("api_base validated in constructor")
            .pop_if_empty()
            .extend(segments);
        url
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StorageError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(StorageError::Backend {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ObjectStore for GcsStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn list(&self) -> Result<Vec<ObjectMeta>, StorageError> {
        let url = self.api_url(&["storage", "v1", "b", &self.bucket, "o"]);
        let response = self.authorized(self.http.get(url)).send().await?;
        let listing: ObjectListing = Self::check(response).await?.json().await?;
        Ok(listing
            .items
            .into_iter()
            .map(|object| ObjectMeta {
                name: object.name,
                self_link: object.self_link,
            })
            .collect())
    }

    async fn put(&self, name: &str, bytes: Bytes) -> Result<(), StorageError> {
        let mut url = self.api_url(&["upload", "storage", "v1", "b", &self.bucket, "o"]);
        url.query_pairs_mut()
            .append_pair("uploadType", "media")
            .append_pair("name", name);

        let content_type = mime_guess::from_path(name).first_or_octet_stream();
        tracing::debug!(object = %name, bytes = bytes.len(), "writing object");

        let response = self
            .authorized(self.http.post(url))
            .header(CONTENT_TYPE, content_type.as_ref())
            .body(bytes)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn make_public(&self, name: &str) -> Result<(), StorageError> {
        let url = self.api_url(&["storage", "v1", "b", &self.bucket, "o", name, "acl"]);
        let response = self
            .authorized(self.http.post(url))
            .json(&serde_json::json!({ "entity": "allUsers", "role": "READER" }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    fn public_url(&self, name: &str) -> String {
        format!("{}/{}/{}", self.public_base, self.bucket, name)
    }
}

#[derive(Debug, Deserialize)]
struct ObjectListing {
    // Absent entirely when the bucket is empty
    #[serde(default)]
    items: Vec<RawObject>,
}

#[derive(Debug, Deserialize)]
struct RawObject {
    name: String,
    // Some emulators omit selfLink
    #[serde(rename = "selfLink", default)]
    self_link: String,
}
