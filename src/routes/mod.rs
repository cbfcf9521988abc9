pub mod admin;
pub mod auth;
pub mod photos;
pub mod reports;
pub mod uploads;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the full application router. Shared by the binary and the
/// integration tests.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(state.config.server.cors_origin.as_deref());
    // Multipart bodies carry boundary overhead on top of the image itself
    let body_limit = state.config.storage.max_upload_bytes + 64 * 1024;

    Router::new()
        .merge(auth::router())
        .merge(photos::router())
        .merge(reports::router())
        .merge(admin::router())
        .route("/uploads/{file}", get(uploads::serve))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    match origin.and_then(|o| o.parse::<HeaderValue>().ok()) {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::permissive(),
    }
}
