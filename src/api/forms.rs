//! Multipart request body processing.
//!
//! [`collect`] drives the multipart decoder over the whole request body and
//! returns a [`ParsedForm`] only once every part has been fully drained, so
//! handlers never see a partially populated form.

use crate::errors::Error;
use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use bytes::Bytes;
use std::collections::HashMap;

/// A fully uploaded file: its original filename and complete content.
///
/// The buffer is complete and immutable by the time the record is visible -
/// [`collect`] commits it only after the part's byte stream has ended.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Bytes,
}

/// Decoded multipart form: text fields and uploaded files, each keyed by
/// form field name.
#[derive(Debug, Default)]
pub struct ParsedForm {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, UploadedFile>,
}

impl ParsedForm {
    pub fn file(&self, field: &str) -> Option<&UploadedFile> {
        self.files.get(field)
    }
}

/// Drain the decoder into a [`ParsedForm`].
///
/// Parts carrying a filename are files and are buffered whole; parts without
/// one are text fields. Repeated field names overwrite (last write wins).
/// Any decoder failure surfaces as a 400-class error.
pub async fn collect(mut multipart: Multipart) -> Result<ParsedForm, Error> {
    let mut form = ParsedForm::default();

    while let Some(field) = multipart.next_field().await.map_err(decode_error)? {
        let name = field.name().unwrap_or_default().to_string();

        match field.file_name().map(str::to_owned) {
            Some(filename) => {
                tracing::debug!(field = %name, file = %filename, "processing file part");
                let bytes = field.bytes().await.map_err(decode_error)?;
                form.files.insert(name, UploadedFile { filename, bytes });
            }
            None => {
                tracing::debug!(field = %name, "processing text part");
                let value = field.text().await.map_err(decode_error)?;
                form.fields.insert(name, value);
            }
        }
    }

    tracing::debug!(fields = form.fields.len(), files = form.files.len(), "form processed");
    Ok(form)
}

fn decode_error(err: MultipartError) -> Error {
    Error::BadRequest {
        message: format!("Failed to parse multipart data: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::{FromRequest, Request};
    use axum::http::header::CONTENT_TYPE;

    const BOUNDARY: &str = "zzz-test-boundary";

    async fn multipart_for(body: String) -> Multipart {
        let request = Request::builder()
            .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap();
        // Extraction only parses the boundary; the body streams lazily
        Multipart::from_request(request, &()).await.unwrap()
    }

    fn text_part(name: &str, value: &str) -> String {
        format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
    }

    fn file_part(name: &str, filename: &str, content: &str) -> String {
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: text/plain\r\n\r\n{content}\r\n"
        )
    }

    fn closed(parts: &[String]) -> String {
        format!("{}--{BOUNDARY}--\r\n", parts.concat())
    }

    #[tokio::test]
    async fn collects_fields_and_files() {
        let body = closed(&[
            text_part("color", "blue"),
            file_part("file", "a.txt", "hello"),
        ]);
        let form = collect(multipart_for(body).await).await.unwrap();

        assert_eq!(form.fields.get("color").map(String::as_str), Some("blue"));
        let file = form.file("file").expect("file field present");
        assert_eq!(file.filename, "a.txt");
        assert_eq!(file.bytes, Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn repeated_fields_overwrite() {
        let body = closed(&[text_part("color", "blue"), text_part("color", "green")]);
        let form = collect(multipart_for(body).await).await.unwrap();

        assert_eq!(form.fields.len(), 1);
        assert_eq!(form.fields.get("color").map(String::as_str), Some("green"));
    }

    #[tokio::test]
    async fn part_without_filename_is_a_text_field() {
        let body = closed(&[text_part("file", "not really a file")]);
        let form = collect(multipart_for(body).await).await.unwrap();

        assert!(form.file("file").is_none());
        assert_eq!(form.fields.get("file").map(String::as_str), Some("not really a file"));
    }

    #[tokio::test]
    async fn truncated_body_is_a_bad_request() {
        // No closing boundary marker
        let body = text_part("color", "blue");
        let err = collect(multipart_for(body).await).await.unwrap_err();

        assert!(matches!(err, Error::BadRequest { .. }));
    }

    #[tokio::test]
    async fn empty_file_part_is_committed_with_empty_buffer() {
        let body = closed(&[file_part("file", "empty.txt", "")]);
        let form = collect(multipart_for(body).await).await.unwrap();

        let file = form.file("file").expect("file field present");
        assert_eq!(file.filename, "empty.txt");
        assert!(file.bytes.is_empty());
    }
}
