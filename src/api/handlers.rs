use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::mcp::McpServer;
use crate::tools::{ToolDispatcher, ToolError, ToolErrorKind};

/// Method that returns the tool catalogue instead of calling a tool.
pub const DISCOVER_METHOD: &str = "mcp.discover";

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;
const INTERNAL_ERROR: i64 = -32603;
const TOOL_FAILED: i64 = -32000;

// ============================================================
// Wire Types
// ============================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

impl From<&ToolError> for JsonRpcError {
    fn from(e: &ToolError) -> Self {
        let code = match e.kind {
            ToolErrorKind::UnknownTool => METHOD_NOT_FOUND,
            ToolErrorKind::InvalidArguments => INVALID_PARAMS,
            ToolErrorKind::Failed => TOOL_FAILED,
        };
        Self {
            code,
            message: e.message.clone(),
        }
    }
}

// ============================================================
// Handlers
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Answer one JSON-RPC request. Notifications (no `id`) get `204 No Content`.
pub async fn rpc(
    State(dispatcher): State<ToolDispatcher>,
    payload: Result<Json<JsonRpcRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::warn!("Malformed JSON-RPC request: {}", rejection);
            return Json(JsonRpcResponse::error(
                Value::Null,
                PARSE_ERROR,
                rejection.body_text(),
            ))
            .into_response();
        }
    };

    let id = request.id.clone();
    let response = handle(dispatcher, request).await;

    match id {
        Some(_) => Json(response).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

async fn handle(dispatcher: ToolDispatcher, request: JsonRpcRequest) -> JsonRpcResponse {
    let id = request.id.unwrap_or(Value::Null);

    if request.jsonrpc != "2.0" {
        return JsonRpcResponse::error(id, INVALID_REQUEST, "jsonrpc must be \"2.0\"");
    }

    if request.method == DISCOVER_METHOD {
        return match serde_json::to_value(McpServer::tool_catalog()) {
            Ok(tools) => JsonRpcResponse::result(id, tools),
            Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, e.to_string()),
        };
    }

    let method = request.method;
    let params = request.params;
    let outcome =
        tokio::task::spawn_blocking(move || dispatcher.dispatch(&method, params)).await;
    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(e) => return JsonRpcResponse::error(id, INTERNAL_ERROR, e.to_string()),
    };

    match outcome {
        Ok(output) => match serde_json::to_value(&output) {
            Ok(value) => JsonRpcResponse::result(id, value),
            Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, e.to_string()),
        },
        Err(e) => {
            let error = JsonRpcError::from(&e);
            JsonRpcResponse::error(id, error.code, error.message)
        }
    }
}
