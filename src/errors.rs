use crate::storage::StorageError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Request used a method the operation does not support
    #[error("expected method to be \"POST\"")]
    MethodNotAllowed,

    /// Invalid request data (missing form field, undecodable body, bad query)
    #[error("{message}")]
    BadRequest { message: String },

    /// A file part was present but its buffer was empty or unusable
    #[error("Error processing file")]
    UploadProcessing,

    /// Storage backend operation error
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::UploadProcessing => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// User-visible error message. Storage failures surface the backend's
    /// status and message; internal chains are not expanded further.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details - level matched to severity class
        match &self {
            Error::Storage(_) | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::UploadProcessing => {
                tracing::warn!("Upload processing error: {}", self);
            }
            Error::MethodNotAllowed | Error::BadRequest { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        // Flat text body, "error:" prefix. The 404 fallback and the
        // partial-success upload response are produced elsewhere and keep
        // their own formats.
        (self.status_code(), format!("error:{}", self.user_message())).into_response()
    }
}

/// Type alias for handler results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(Error::MethodNotAllowed.status_code(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            Error::BadRequest {
                message: "File expected".into()
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(Error::UploadProcessing.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            Error::Storage(StorageError::Backend {
                status: 503,
                message: "unavailable".into()
            })
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn method_not_allowed_message_is_exact() {
        assert_eq!(Error::MethodNotAllowed.user_message(), r#"expected method to be "POST""#);
    }
}
