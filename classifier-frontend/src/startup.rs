use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::middleware::{
    metrics_middleware, request_id_middleware, security_headers_middleware,
};
use time::Duration;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::handlers::{
    app::{dismiss_message, health_check, index, view_snapshot},
    documents::{refresh_documents, toggle_document},
    metrics::metrics,
    upload::upload_handler,
};
use crate::AppState;

pub fn build_router(state: AppState) -> Router {
    // Session setup; the view state lives in the session
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(state.secure_cookies)
        .with_expiry(Expiry::OnInactivity(Duration::hours(24)));

    Router::new()
        .route("/", get(index))
        .route("/upload", post(upload_handler))
        .route("/documents/refresh", post(refresh_documents))
        .route("/documents/:id/toggle", post(toggle_document))
        .route("/message/dismiss", post(dismiss_message))
        .route("/api/view", get(view_snapshot))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(session_layer)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        // Outermost, so the trace span sees the request id
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}
