//! MCP Server implementation
//!
//! Implements the MCP server that communicates over stdio using JSON-RPC 2.0.

use super::handlers::ToolHandler;
use super::protocol::*;
use super::tools::all_tools;
use crate::hex::HexApi;
use anyhow::Result;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

const PROTOCOL_VERSION: &str = "2024-11-05";
const SERVER_NAME: &str = "hex-mcp-server";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// MCP Server that handles JSON-RPC 2.0 requests over stdio
pub struct McpServer {
    tool_handler: Arc<ToolHandler>,
    initialized: bool,
}

impl McpServer {
    /// Create a new MCP server backed by the given API client
    pub fn new(api: Arc<dyn HexApi>, app_url: &str) -> Self {
        Self {
            tool_handler: Arc::new(ToolHandler::new(api, app_url)),
            initialized: false,
        }
    }

    /// Run the server, reading from stdin and writing to stdout
    pub async fn run(&mut self) -> Result<()> {
        let reader = BufReader::new(tokio::io::stdin());
        let writer = tokio::io::stdout();
        self.serve(reader, writer).await
    }

    /// Serve newline-delimited JSON-RPC messages until the reader hits EOF.
    ///
    /// Tool calls run as separate tasks and answer whenever they finish, so
    /// later messages (including `ping`) are not held up by a slow API call.
    /// Everything else is answered in arrival order. On EOF the loop waits
    /// for in-flight tool calls and writes their responses before returning.
    pub async fn serve<R, W>(&mut self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("MCP server starting on stdio");

        let (tx, mut rx) = mpsc::unbounded_channel::<JsonRpcResponse>();
        let mut responses = Some(tx);
        let mut lines = reader.lines();

        loop {
            tokio::select! {
                line = lines.next_line(), if responses.is_some() => {
                    let line = match line {
                        Ok(Some(l)) => l,
                        Ok(None) => {
                            // Only in-flight tool calls still hold a sender
                            responses = None;
                            continue;
                        }
                        Err(e) => {
                            error!("Failed to read line: {}", e);
                            responses = None;
                            continue;
                        }
                    };

                    if line.trim().is_empty() {
                        continue;
                    }

                    debug!("Received: {}", line);

                    let resp = match (self.parse_message(&line), responses.as_ref()) {
                        (Ok(request), Some(tx)) if self.is_tool_call(&request) => {
                            self.spawn_tool_call(request, tx.clone());
                            None
                        }
                        (Ok(request), _) => self.handle_parsed(request).await,
                        (Err(resp), _) => Some(resp),
                    };
                    if let Some(resp) = resp {
                        write_response(&mut writer, &resp).await?;
                    }
                }
                Some(resp) = rx.recv() => {
                    write_response(&mut writer, &resp).await?;
                }
                else => break,
            }
        }

        info!("MCP server shutting down");
        Ok(())
    }

    /// Handle a single JSON-RPC message, awaiting any tool call inline
    #[cfg(test)]
    async fn handle_message(&mut self, message: &str) -> Option<JsonRpcResponse> {
        match self.parse_message(message) {
            Ok(request) => self.handle_parsed(request).await,
            Err(resp) => Some(resp),
        }
    }

    fn parse_message(&self, message: &str) -> Result<JsonRpcRequest, JsonRpcResponse> {
        serde_json::from_str(message).map_err(|e| {
            JsonRpcResponse::error(Value::Null, JsonRpcError::parse_error(e.to_string()))
        })
    }

    /// Tool calls that can run detached: they have an id to answer and the
    /// initialize gate is already passed
    fn is_tool_call(&self, request: &JsonRpcRequest) -> bool {
        self.initialized && request.id.is_some() && request.method == "tools/call"
    }

    fn spawn_tool_call(&self, request: JsonRpcRequest, tx: mpsc::UnboundedSender<JsonRpcResponse>) {
        let handler = self.tool_handler.clone();
        let JsonRpcRequest { id, params, .. } = request;
        let id = id.unwrap_or(Value::Null);
        tokio::spawn(async move {
            let resp = match call_tool(&handler, &params).await {
                Ok(value) => JsonRpcResponse::success(id, value),
                Err(error) => JsonRpcResponse::error(id, error),
            };
            if tx.send(resp).is_err() {
                warn!("Dropping tool call response: output closed");
            }
        });
    }

    async fn handle_parsed(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        // Notifications have no ID and get no response
        let id = match &request.id {
            Some(id) => id.clone(),
            None => {
                self.handle_notification(&request);
                return None;
            }
        };

        let result = self.handle_request(&request).await;

        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(error) => JsonRpcResponse::error(id, error),
        })
    }

    fn handle_notification(&mut self, request: &JsonRpcRequest) {
        match request.method.as_str() {
            "notifications/initialized" => {
                info!("Client confirmed initialization");
            }
            "notifications/cancelled" => {
                // In-flight HTTP calls cannot be aborted
                warn!("Request cancelled by client");
            }
            _ => {
                debug!("Unknown notification: {}", request.method);
            }
        }
    }

    async fn handle_request(&mut self, request: &JsonRpcRequest) -> Result<Value, JsonRpcError> {
        match request.method.as_str() {
            "initialize" => self.handle_initialize(&request.params),
            "ping" => Ok(json!({})),
            "tools/list" => self.handle_tools_list(),
            "tools/call" => self.handle_tools_call(&request.params).await,
            _ => Err(JsonRpcError::method_not_found(&request.method)),
        }
    }

    fn handle_initialize(&mut self, params: &Option<Value>) -> Result<Value, JsonRpcError> {
        let params: InitializeParams = params
            .as_ref()
            .map(|p| serde_json::from_value(p.clone()))
            .transpose()
            .map_err(|e| JsonRpcError::invalid_params(e.to_string()))?
            .unwrap_or(InitializeParams {
                protocol_version: PROTOCOL_VERSION.to_string(),
                capabilities: ClientCapabilities::default(),
                client_info: None,
            });

        info!(
            "Initializing MCP server (client protocol: {})",
            params.protocol_version
        );

        if let Some(ref client) = params.client_info {
            info!(
                "Client: {} v{}",
                client.name,
                client.version.as_deref().unwrap_or("unknown")
            );
        }

        self.initialized = true;

        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
            },
        };

        serde_json::to_value(result).map_err(|e| JsonRpcError::internal_error(e.to_string()))
    }

    fn handle_tools_list(&self) -> Result<Value, JsonRpcError> {
        if !self.initialized {
            return Err(JsonRpcError::invalid_request("Server not initialized"));
        }

        let result = ToolsListResult { tools: all_tools() };

        serde_json::to_value(result).map_err(|e| JsonRpcError::internal_error(e.to_string()))
    }

    async fn handle_tools_call(&self, params: &Option<Value>) -> Result<Value, JsonRpcError> {
        if !self.initialized {
            return Err(JsonRpcError::invalid_request("Server not initialized"));
        }
        call_tool(&self.tool_handler, params).await
    }
}

async fn call_tool(handler: &ToolHandler, params: &Option<Value>) -> Result<Value, JsonRpcError> {
    let params: ToolCallParams = params
        .as_ref()
        .ok_or_else(|| JsonRpcError::invalid_params("params required"))?
        .clone()
        .pipe(serde_json::from_value)
        .map_err(|e| JsonRpcError::invalid_params(e.to_string()))?;

    info!("Tool call: {}", params.name);
    debug!("Arguments: {:?}", params.arguments);

    let tool_result = handler
        .handle(&params.name, params.arguments)
        .await
        .map_err(|e| {
            error!("Tool error: {}", e);
            e.to_json_rpc()
        })?;

    debug!("Tool result: {}", tool_result.text());

    serde_json::to_value(tool_result).map_err(|e| JsonRpcError::internal_error(e.to_string()))
}

async fn write_response<W: AsyncWrite + Unpin>(writer: &mut W, resp: &JsonRpcResponse) -> Result<()> {
    let json = serde_json::to_string(resp)?;
    debug!("Sending: {}", json);
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

/// Extension trait for pipe operator
trait Pipe: Sized {
    fn pipe<F, R>(self, f: F) -> R
    where
        F: FnOnce(Self) -> R,
    {
        f(self)
    }
}

impl<T> Pipe for T {}
