//! API layer for HTTP request handling and data models.
//!
//! - **[`forms`]**: multipart body processing into a per-request form
//! - **[`handlers`]**: Axum route handlers for the three operations
//! - **[`models`]**: request/response data structures
//!
//! # Routes
//!
//! - `GET /get-all` - list bucket objects as `{name, url}` pairs
//! - `POST /upload` - multipart upload of a `file` form field
//! - `GET /get?name=...` - redirect to an object's public URL
//!
//! Unknown paths fall through to a plain `404 Not found`. Handler failures
//! are rendered by [`crate::errors::Error`]'s response conversion.

pub mod forms;
pub mod handlers;
pub mod models;
