pub mod dto;
pub mod error;
pub mod handlers;
pub mod server;
pub mod state;
pub mod ws;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use server::ApiServer;
pub use state::AppState;

use axum::routing::get;
use axum::Router;

/// Builds the full route table over the shared state.
///
/// The WebSocket stream is mounted at both `/ws` and `/api/ws`; existing
/// dashboards connect to either path.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/api/tags", get(handlers::list_tags))
        .route("/api/history", get(handlers::get_history))
        .route("/api/stats", get(handlers::get_stats))
        .route("/ws", get(ws::ws_handler))
        .route("/api/ws", get(ws::ws_handler))
        .with_state(state)
}
