//! Axum router construction.

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::context::AppContext;
use crate::routes;

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/register", post(routes::proxy::register))
        .route("/proxy", get(routes::proxy::proxy_index))
        .route("/schedulers", get(routes::epg::scheduler_statuses))
        // Streaming
        .route("/stream/{slug}", get(routes::proxy::stream_redirect))
        .route("/hls/{file}", get(routes::hls::hls_manifest))
        .route("/segment/{slug}/{file}", get(routes::segment::relay_segment))
        // EPG
        .route("/{provider}/rebuild_epg", get(routes::epg::rebuild_epg))
        .route("/{provider}/build_epg", get(routes::epg::build_epg))
        .route("/{provider}/{file}", get(routes::epg::serve_epg_file))
        .route("/{file}", get(routes::epg::serve_default_epg))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
