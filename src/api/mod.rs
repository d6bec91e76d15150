mod handlers;

pub use handlers::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::tools::ToolDispatcher;

/// HTTP transport: JSON-RPC 2.0 tool calls on `POST /mcp`.
pub fn create_router(dispatcher: ToolDispatcher) -> Router {
    Router::new()
        .route("/mcp", post(handlers::rpc))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(dispatcher)
}
