//! # wip-api
//!
//! HTTP API for the wip done-items log.
//!
//! | Method | Path          | Purpose |
//! |--------|---------------|---------|
//! | GET    | `/items`      | One page, newest first |
//! | POST   | `/items`      | Create an item (201) |
//! | PATCH  | `/items/:id`  | Partial update |
//! | DELETE | `/items/:id`  | Delete |
//! | POST   | `/upload`     | Multipart media upload, field `files` |
//! | GET    | `/health`     | Liveness |
//!
//! Stored media is served under `/media` by [`app`].

pub mod config;
pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, patch, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::warn;

use wip_core::defaults::MEDIA_ROUTE;
use wip_core::{BlobStore, ItemStore};

pub use config::ApiConfig;
pub use error::ApiError;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub items: Arc<dyn ItemStore>,
    pub blobs: Arc<dyn BlobStore>,
}

impl AppState {
    pub fn new(items: Arc<dyn ItemStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { items, blobs }
    }
}

/// API routes without middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/items", get(handlers::list_items).post(handlers::create_item))
        .route(
            "/items/:id",
            patch(handlers::update_item).delete(handlers::delete_item),
        )
        .route("/upload", post(handlers::upload))
        .with_state(state)
}

/// Full application: routes, media files, and middleware.
pub fn app(state: AppState, config: &ApiConfig) -> Router {
    router(state)
        .nest_service(MEDIA_ROUTE, ServeDir::new(&config.blob_storage_path))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(cors_layer(&config.allowed_origins))
        .layer(CatchPanicLayer::new())
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(RequestBodyLimitLayer::new(config.max_upload_bytes))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .max_age(std::time::Duration::from_secs(3600))
}
