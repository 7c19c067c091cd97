//! CORS middleware
//!
//! The forms are served from the marketing site and from preview deploys, so
//! every origin is allowed.

use axum::http::{header, Method};
use tower_http::cors::{Any, CorsLayer};

pub fn cors_middleware() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}
