use crate::AppState;
use crate::api::forms;
use crate::api::models::objects::{ObjectSummary, RedirectQuery, UploadResponse};
use crate::errors::{Error, Result};
use axum::{
    Json,
    extract::{Multipart, Query, State, multipart::MultipartRejection, rejection::QueryRejection},
    http::{Method, StatusCode, header},
    response::{IntoResponse, Response},
};

#[utoipa::path(
    get,
    path = "/get-all",
    tag = "objects",
    summary = "List objects",
    description = "Returns every object in the bucket as a {name, url} pair, where url is the object's metadata self-link.",
    responses(
        (status = 200, description = "All objects in the bucket", body = Vec<ObjectSummary>),
        (status = 500, description = "Storage backend failure")
    )
)]
pub async fn list_objects(State(state): State<AppState>) -> Result<Json<Vec<ObjectSummary>>> {
    let objects = state.store.list().await?;
    Ok(Json(
        objects
            .into_iter()
            .map(|meta| ObjectSummary {
                name: meta.name,
                url: meta.self_link,
            })
            .collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/upload",
    tag = "objects",
    summary = "Upload file",
    description = "Stores the multipart `file` field as a bucket object named after the uploaded filename, then makes it public.",
    request_body(
        content_type = "multipart/form-data",
        description = "Multipart form with a `file` field"
    ),
    responses(
        (status = 200, description = "Object stored and publicly readable", body = UploadResponse),
        (status = 400, description = "No file field, or undecodable body"),
        (status = 405, description = "Method was not POST"),
        (status = 500, description = "Storage failure, or stored but not public", body = UploadResponse)
    )
)]
pub async fn upload_object(
    State(state): State<AppState>,
    method: Method,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Response> {
    // Method first: the route dispatches on path alone so this check can
    // answer with the documented message
    if method != Method::POST {
        return Err(Error::MethodNotAllowed);
    }

    let multipart = multipart.map_err(|err| Error::BadRequest {
        message: format!("Failed to parse multipart data: {err}"),
    })?;
    let form = forms::collect(multipart).await?;

    let file = form.file("file").ok_or_else(|| Error::BadRequest {
        message: "File expected".to_string(),
    })?;
    if file.bytes.is_empty() {
        // Only reachable when the decoder produced a file record with no
        // content
        return Err(Error::UploadProcessing);
    }

    tracing::info!(file = %file.filename, bytes = file.bytes.len(), "received upload");

    // The object is named after the uploaded filename; a write failure
    // propagates as a plain 500
    state.store.put(&file.filename, file.bytes.clone()).await?;

    let url = state.store.public_url(&file.filename);
    match state.store.make_public(&file.filename).await {
        Ok(()) => Ok((
            StatusCode::OK,
            Json(UploadResponse {
                message: format!("Upload completed: {}", file.filename),
                url,
            }),
        )
            .into_response()),
        Err(err) => {
            // Partial success: the object exists but stays private. Not
            // rolled back; the caller gets the URL anyway.
            tracing::warn!(file = %file.filename, error = %err, "object stored but public access was denied");
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(UploadResponse {
                    message: format!("Upload completed: {}, but public access is denied!", file.filename),
                    url,
                }),
            )
                .into_response())
        }
    }
}

#[utoipa::path(
    get,
    path = "/get",
    tag = "objects",
    summary = "Redirect to object",
    description = "Redirects to the object's canonical public URL. The object's existence is not checked.",
    params(RedirectQuery),
    responses(
        (status = 302, description = "Redirect to the object's public URL"),
        (status = 400, description = "Missing `name` query parameter")
    )
)]
pub async fn redirect_object(
    State(state): State<AppState>,
    query: std::result::Result<Query<RedirectQuery>, QueryRejection>,
) -> Result<Response> {
    let Query(query) = query.map_err(|err| Error::BadRequest {
        message: err.body_text(),
    })?;

    // Unconditional string construction; 302 exactly (axum's Redirect
    // helpers emit 303/307/308)
    let target = state.store.public_url(&query.name);
    Ok((StatusCode::FOUND, [(header::LOCATION, target)]).into_response())
}

#[cfg(test)]
mod tests {
    use crate::api::models::objects::{ObjectSummary, UploadResponse};
    use crate::storage::ObjectStore;
    use crate::test_utils::create_test_app;
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use bytes::Bytes;

    fn file_form(field: &str, filename: &str, content: &[u8]) -> MultipartForm {
        MultipartForm::new().add_part(field, Part::bytes(content.to_vec()).file_name(filename))
    }

    #[tokio::test]
    async fn upload_round_trips_bytes_and_reports_public_url() {
        let (server, store) = create_test_app();

        let response = server.post("/upload").multipart(file_form("file", "a.txt", b"hello")).await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let body: UploadResponse = response.json();
        assert_eq!(body.message, "Upload completed: a.txt");
        assert_eq!(body.url, "https://storage.googleapis.com/testing_app_files/a.txt");

        assert_eq!(store.contents("a.txt").unwrap(), Bytes::from_static(b"hello"));
        assert!(store.is_public("a.txt"));
    }

    #[test_log::test(tokio::test)]
    async fn upload_with_non_post_method_is_405() {
        let (server, _store) = create_test_app();

        let response = server.get("/upload").await;

        assert_eq!(response.status_code(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.text(), r#"error:expected method to be "POST""#);
    }

    #[tokio::test]
    async fn upload_with_non_multipart_body_is_400() {
        let (server, _store) = create_test_app();

        let response = server.post("/upload").text("not a multipart body").await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert!(response.text().starts_with("error:"));
    }

    #[tokio::test]
    async fn upload_without_file_field_is_400() {
        let (server, _store) = create_test_app();

        let form = MultipartForm::new().add_text("note", "no file here");
        let response = server.post("/upload").multipart(form).await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(response.text(), "error:File expected");
    }

    #[tokio::test]
    async fn upload_under_wrong_field_name_is_400() {
        let (server, store) = create_test_app();

        let response = server
            .post("/upload")
            .multipart(file_form("attachment", "a.txt", b"hello"))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert!(store.contents("a.txt").is_none());
    }

    #[tokio::test]
    async fn upload_of_empty_file_is_a_processing_error() {
        let (server, store) = create_test_app();

        let response = server.post("/upload").multipart(file_form("file", "empty.txt", b"")).await;

        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.text(), "error:Error processing file");
        assert!(store.contents("empty.txt").is_none());
    }

    #[tokio::test]
    async fn denied_public_access_still_keeps_the_object() {
        let (server, store) = create_test_app();
        store.deny_public_access();

        let response = server.post("/upload").multipart(file_form("file", "a.txt", b"hello")).await;

        assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: UploadResponse = response.json();
        assert_eq!(body.message, "Upload completed: a.txt, but public access is denied!");
        assert_eq!(body.url, "https://storage.googleapis.com/testing_app_files/a.txt");

        // The upload is not rolled back
        assert_eq!(store.contents("a.txt").unwrap(), Bytes::from_static(b"hello"));
        assert!(!store.is_public("a.txt"));
    }

    #[tokio::test]
    async fn list_returns_name_and_self_link_pairs() {
        let (server, store) = create_test_app();
        store.put("a.txt", Bytes::from_static(b"one")).await.unwrap();
        store.put("b.txt", Bytes::from_static(b"two")).await.unwrap();

        let response = server.get("/get-all").await;

        assert_eq!(response.status_code(), StatusCode::OK);
        let listed: Vec<ObjectSummary> = response.json();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].name, "a.txt");
        assert_eq!(
            listed[0].url,
            "https://www.googleapis.com/storage/v1/b/testing_app_files/o/a.txt"
        );
    }

    #[tokio::test]
    async fn list_of_empty_bucket_is_an_empty_array() {
        let (server, _store) = create_test_app();

        let response = server.get("/get-all").await;

        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.text(), "[]");
    }

    #[tokio::test]
    async fn redirect_targets_public_url_without_checking_existence() {
        let (server, _store) = create_test_app();

        let response = server.get("/get").add_query_param("name", "missing.txt").await;

        assert_eq!(response.status_code(), StatusCode::FOUND);
        assert_eq!(
            response.header("location").to_str().unwrap(),
            "https://storage.googleapis.com/testing_app_files/missing.txt"
        );
    }

    #[tokio::test]
    async fn redirect_without_name_is_400() {
        let (server, _store) = create_test_app();

        let response = server.get("/get").await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert!(response.text().starts_with("error:"));
    }
}
