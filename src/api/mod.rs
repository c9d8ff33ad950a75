//! HTTP API server

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

pub mod handlers;
pub mod state;

pub use handlers::ApiError;
pub use state::AppState;

/// Build the API router using the provided application state
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .nest(
            "/data",
            Router::new()
                .route("/document/:id", get(handlers::document_by_id))
                .route("/document/async/:id", get(handlers::document_by_id_async))
                .route(
                    "/document/async/firstname/:search",
                    get(handlers::documents_by_first_name),
                ),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
