//! MCP (Model Context Protocol) JSON-RPC handler.
//!
//! Implements the [MCP specification](https://spec.modelcontextprotocol.io/)
//! over stdio: reads JSON-RPC 2.0 requests from stdin (one per line) and
//! writes responses to stdout.
//!
//! ## Supported methods
//!
//! | Method              | Description                       |
//! |---------------------|-----------------------------------|
//! | `initialize`        | Handshake, returns capabilities   |
//! | `tools/list`        | List available tool definitions   |
//! | `tools/call`        | Execute a tool and return result  |
//! | `resources/list`    | List the embedded documents       |
//! | `resources/read`    | Return one embedded document      |
//! | `ping`              | Liveness check                    |
//!
//! Notifications (`notifications/initialized`, `notifications/cancelled`) are
//! acknowledged silently.

use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, warn};

use crate::docs;
use crate::examples;
use crate::tools::{self, ToolContext};

const SERVER_NAME: &str = "scpl-mcp";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i64 = -32700;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;
const RESOURCE_NOT_FOUND: i64 = -32002;

const EXAMPLES_URI: &str = "scpl://examples";
const SYNTAX_URI: &str = "scpl://syntax";

/// Run the MCP server on stdio, processing JSON-RPC requests until EOF.
pub async fn run_stdio(ctx: ToolContext) {
    serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout(), &ctx).await;
}

/// Serve newline-delimited JSON-RPC from `reader` to `writer` until EOF.
/// Lines that are not UTF-8 or not JSON get a parse error and the loop goes on.
async fn serve<R, W>(mut reader: R, mut writer: W, ctx: &ToolContext)
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                error!("stdin read error: {e}");
                break;
            }
        }

        let response = match std::str::from_utf8(&buf) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => match serde_json::from_str::<Value>(line.trim()) {
                Ok(request) => handle_message(&request, ctx).await,
                Err(e) => Some(error_response(
                    Value::Null,
                    PARSE_ERROR,
                    format!("Parse error: {e}"),
                )),
            },
            Err(e) => {
                warn!("request is not valid UTF-8: {e}");
                Some(error_response(
                    Value::Null,
                    PARSE_ERROR,
                    format!("Parse error: invalid UTF-8: {e}"),
                ))
            }
        };

        if let Some(response) = response {
            write_response(&mut writer, &response).await;
        }
    }
    debug!("stdin closed, shutting down");
}

/// Handle one decoded JSON-RPC message. Returns `None` for notifications.
pub async fn handle_message(request: &Value, ctx: &ToolContext) -> Option<Value> {
    let method = request.get("method").and_then(Value::as_str).unwrap_or("");

    // Notifications (no id): acknowledge silently
    let Some(id) = request.get("id").cloned() else {
        match method {
            "notifications/initialized" | "notifications/cancelled" => {}
            _ => warn!("unknown notification: {method}"),
        }
        return None;
    };

    let params = request.get("params").cloned().unwrap_or(json!({}));
    let outcome = match method {
        "initialize" => Ok(handle_initialize()),
        "tools/list" => Ok(json!({ "tools": tools::tool_definitions() })),
        "tools/call" => handle_tools_call(&params, ctx).await,
        "resources/list" => Ok(handle_resources_list()),
        "resources/read" => handle_resources_read(&params, ctx),
        "ping" => Ok(json!({})),
        _ => Err((METHOD_NOT_FOUND, format!("Method not found: {method}"))),
    };

    Some(match outcome {
        Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
        Err((code, message)) => error_response(id, code, message),
    })
}

type RpcResult = Result<Value, (i64, String)>;

fn error_response(id: Value, code: i64, message: String) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message }
    })
}

/// Handle `initialize`: return protocol version, capabilities, and server info.
fn handle_initialize() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": {},
            "resources": {}
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": SERVER_VERSION
        }
    })
}

/// Handle `tools/call`: dispatch to the tool handler. Tool failures are
/// reported in the result (`isError`), never as JSON-RPC errors.
async fn handle_tools_call(params: &Value, ctx: &ToolContext) -> RpcResult {
    let Some(name) = params.get("name").and_then(Value::as_str) else {
        return Err((INVALID_PARAMS, "Missing required parameter: name".into()));
    };
    let args = params.get("arguments").cloned().unwrap_or(json!({}));

    debug!(tool = name, "tools/call");
    let result = tools::handle_tool_call(name, &args, ctx).await;

    let mut response_result = json!({ "content": result.content });
    if result.is_error {
        response_result["isError"] = json!(true);
    }
    Ok(response_result)
}

fn handle_resources_list() -> Value {
    json!({
        "resources": [
            {
                "uri": EXAMPLES_URI,
                "name": "ScPL Examples",
                "description": "Example shortcuts written in ScPL",
                "mimeType": "text/markdown"
            },
            {
                "uri": SYNTAX_URI,
                "name": "ScPL Syntax Reference",
                "description": "ScPL language syntax: text, variables, conditionals, menus and loops",
                "mimeType": "text/markdown"
            }
        ]
    })
}

fn handle_resources_read(params: &Value, ctx: &ToolContext) -> RpcResult {
    let Some(uri) = params.get("uri").and_then(Value::as_str) else {
        return Err((INVALID_PARAMS, "Missing required parameter: uri".into()));
    };
    let text = match uri {
        EXAMPLES_URI => {
            let all: Vec<_> = ctx.examples().all().iter().collect();
            examples::render(&all)
        }
        SYNTAX_URI => docs::SYNTAX.to_string(),
        _ => return Err((RESOURCE_NOT_FOUND, format!("Unknown resource: {uri}"))),
    };
    Ok(json!({
        "contents": [{ "uri": uri, "mimeType": "text/markdown", "text": text }]
    }))
}

/// Write a JSON-RPC response (one line, flushed immediately).
async fn write_response<W: AsyncWrite + Unpin>(stdout: &mut W, response: &Value) {
    let mut output = serde_json::to_string(response).unwrap_or_default();
    output.push('\n');
    if let Err(e) = stdout.write_all(output.as_bytes()).await {
        error!("stdout write error: {e}");
    }
    if let Err(e) = stdout.flush().await {
        error!("stdout flush error: {e}");
    }
}
