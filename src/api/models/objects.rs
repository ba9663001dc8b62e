use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// One bucket object in a listing: its name and metadata self-link.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ObjectSummary {
    pub name: String,
    pub url: String,
}

/// Upload outcome. Returned with 200 when the object was stored and made
/// public, and with 500 when the object was stored but granting public
/// access failed (the upload is not rolled back).
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    pub message: String,
    pub url: String,
}

/// Query parameters for the redirect operation
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RedirectQuery {
    /// Object name to link to; existence is not checked
    pub name: String,
}
