//! # filegate: an HTTP gateway in front of a storage bucket
//!
//! `filegate` exposes three operations against a single cloud object-storage
//! bucket: list the objects it holds, upload a file from a multipart form,
//! and redirect to an object's public URL. It is deliberately small - the
//! service buffers one upload at a time, hands the bytes to the storage
//! backend, and reports the canonical public link back to the caller.
//!
//! ## Request Flow
//!
//! Requests hit a fixed route table:
//!
//! - `GET /get-all` lists every object as a `{name, url}` pair, the `url`
//!   being the backend's metadata self-link.
//! - `POST /upload` decodes a multipart body, requires a `file` field,
//!   writes the buffer to an object named after the uploaded filename, and
//!   marks it publicly readable. If the object is stored but the access
//!   grant fails, the response is a 500 that still carries the public URL -
//!   the upload is not rolled back.
//! - `GET /get?name=...` answers `302 Found` pointing at
//!   `https://storage.googleapis.com/{bucket}/{name}` without checking that
//!   the object exists.
//!
//! Unknown paths get a plain `404 Not found`. Any handler failure funnels
//! through [`errors::Error`], which renders `status + "error:" + message`.
//!
//! ## Architecture
//!
//! The HTTP layer is [Axum](https://github.com/tokio-rs/axum); the storage
//! backend sits behind the [`storage::ObjectStore`] trait so the Google
//! Cloud Storage client ([`storage::GcsStore`]) can be swapped for the
//! in-process [`storage::MemoryStore`] in development and tests. A single
//! store handle is built at startup from configuration and injected into
//! handlers through [`AppState`] - there is no ambient global client.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use filegate::{Application, Config, telemetry};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = filegate::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config)?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod config;
pub mod errors;
pub mod openapi;
pub mod storage;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod test_utils;

use crate::storage::{GcsStore, MemoryStore, ObjectStore};
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, StatusCode};
use axum::{
    Router,
    routing::{any, get},
};
use bon::Builder;
pub use config::Config;
use config::{CorsOrigin, StorageConfig};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info};

/// Application state shared across all request handlers.
///
/// Holds the loaded configuration and the object-store handle, constructed
/// once at startup.
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn ObjectStore>,
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let wildcard = config
        .cors
        .allowed_origins
        .iter()
        .any(|origin| matches!(origin, CorsOrigin::Wildcard));
    if wildcard {
        // Credentials cannot be combined with a wildcard origin
        return Ok(CorsLayer::new().allow_origin(Any));
    }

    let mut origins = Vec::new();
    for origin in &config.cors.allowed_origins {
        if let CorsOrigin::Url(url) = origin {
            origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
        }
    }

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(config.cors.allow_credentials))
}

/// Build the application router: the three object routes, the ambient
/// `/healthz` and `/openapi.json` endpoints, a `404 Not found` fallback, and
/// the CORS and tracing layers.
///
/// The route set is fixed - an unknown path is handled by the fallback, not
/// by a lookup that can drift at runtime. All three routes dispatch on path
/// alone; the upload handler enforces POST itself so the 405 carries its
/// documented message.
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    // Upload gets its own body cap; everything else keeps axum's default
    let upload_router = Router::new()
        .route("/upload", any(api::handlers::objects::upload_object))
        .layer(DefaultBodyLimit::max(state.config.limits.max_upload_bytes));

    let router = Router::new()
        .route("/get-all", any(api::handlers::objects::list_objects))
        .route("/get", any(api::handlers::objects::redirect_object))
        .merge(upload_router)
        .route("/healthz", get(|| async { "OK" }))
        .route("/openapi.json", get(openapi::serve_openapi))
        .fallback(|| async { (StatusCode::NOT_FOUND, "Not found") })
        .with_state(state.clone());

    let cors_layer = create_cors_layer(&state.config)?;

    Ok(router.layer(cors_layer).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    ))
}

/// Main application struct that owns the router and configuration.
///
/// 1. **Create**: [`Application::new`] builds the store from configuration
///    and assembles the router
/// 2. **Serve**: [`Application::serve`] binds a TCP port and handles
///    requests until the shutdown future resolves
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create a new application instance, constructing the storage backend
    /// selected by the configuration.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        tracing::debug!("Starting filegate with configuration: {:#?}", config);

        let store: Arc<dyn ObjectStore> = match &config.storage {
            StorageConfig::Gcs {
                bucket,
                api_base,
                public_base,
                auth_token,
            } => {
                info!(bucket = %bucket, api_base = %api_base, "using GCS storage backend");
                Arc::new(GcsStore::new(
                    bucket.clone(),
                    api_base.clone(),
                    public_base,
                    auth_token.clone(),
                )?)
            }
            StorageConfig::Memory { bucket } => {
                info!(bucket = %bucket, "using in-memory storage backend");
                Arc::new(MemoryStore::new(bucket.clone()))
            }
        };

        Self::with_store(config, store)
    }

    /// Create an application around an already-constructed store.
    pub fn with_store(config: Config, store: Arc<dyn ObjectStore>) -> anyhow::Result<Self> {
        let state = AppState::builder().config(config.clone()).store(store).build();
        let router = build_router(&state)?;
        Ok(Self { router, config })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "filegate listening on http://{}, serving bucket {}",
            bind_addr,
            self.config.storage.bucket()
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
