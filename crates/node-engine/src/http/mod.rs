mod handlers;
mod state;

pub use state::AppState;

use axum::routing::{get, post};
use axum::Router;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/invoke", post(handlers::invoke))
        .route("/invoke_component", post(handlers::invoke_component))
        .route("/registry", get(handlers::list_registry))
        .route("/sse", get(handlers::sse))
        .route("/emit_sse_message", post(handlers::emit_sse_message))
        .with_state(state)
}
