//! OpenAPI document for the gateway's routes, served at `/openapi.json`.

use axum::Json;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "filegate",
        description = "HTTP gateway for listing, uploading, and linking files in a cloud storage bucket"
    ),
    paths(
        crate::api::handlers::objects::list_objects,
        crate::api::handlers::objects::upload_object,
        crate::api::handlers::objects::redirect_object,
    ),
    components(schemas(
        crate::api::models::objects::ObjectSummary,
        crate::api::models::objects::UploadResponse,
    )),
    tags((name = "objects", description = "Bucket object operations"))
)]
pub struct ApiDoc;

pub async fn serve_openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
