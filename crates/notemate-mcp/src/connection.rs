//! Newline-delimited JSON-RPC session

use crate::types::{McpError, ToolInfo, ToolOutput};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

pub const PROTOCOL_VERSION: &str = "2024-11-05";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// One JSON-RPC session over a line-oriented reader/writer pair.
///
/// Requests are answered in order; anything on the read side that is not the
/// awaited response (notifications, server log lines) is skipped.
pub struct Connection<R, W> {
    reader: R,
    writer: W,
    next_id: u64,
    timeout: Duration,
}

impl<R, W> Connection<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            next_id: 1,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `initialize` handshake followed by `notifications/initialized`
    pub async fn initialize(&mut self, client_name: &str, client_version: &str) -> Result<Value, McpError> {
        let result = self
            .request(
                "initialize",
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {},
                    "clientInfo": {
                        "name": client_name,
                        "version": client_version
                    }
                }),
            )
            .await?;

        self.notify("notifications/initialized", None).await?;
        Ok(result)
    }

    pub async fn list_tools(&mut self) -> Result<Vec<ToolInfo>, McpError> {
        let result = self.request("tools/list", json!({})).await?;
        match result.get("tools") {
            Some(tools) => Ok(serde_json::from_value(tools.clone())?),
            None => Ok(Vec::new()),
        }
    }

    /// Invoke a tool. A tool-level failure (`isError`) is an error here.
    pub async fn call_tool(&mut self, name: &str, arguments: Value) -> Result<ToolOutput, McpError> {
        let result = self
            .request(
                "tools/call",
                json!({
                    "name": name,
                    "arguments": arguments
                }),
            )
            .await?;

        let output: ToolOutput = serde_json::from_value(result)?;
        if output.is_error {
            return Err(McpError::Tool {
                tool: name.to_string(),
                message: output.text(),
            });
        }
        Ok(output)
    }

    pub async fn request(&mut self, method: &str, params: Value) -> Result<Value, McpError> {
        let id = self.next_id;
        self.next_id += 1;

        let message = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params
        });
        tracing::debug!(method, id, "mcp request");
        self.send(&message).await?;

        let secs = self.timeout.as_secs();
        match tokio::time::timeout(self.timeout, self.read_response(id)).await {
            Ok(response) => response,
            Err(_) => Err(McpError::Timeout {
                method: method.to_string(),
                secs,
            }),
        }
    }

    pub async fn notify(&mut self, method: &str, params: Option<Value>) -> Result<(), McpError> {
        let mut message = json!({
            "jsonrpc": "2.0",
            "method": method
        });
        if let Some(params) = params {
            message["params"] = params;
        }
        self.send(&message).await
    }

    async fn send(&mut self, message: &Value) -> Result<(), McpError> {
        let line = serde_json::to_string(message)?;
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn read_response(&mut self, id: u64) -> Result<Value, McpError> {
        loop {
            let mut line = String::new();
            let read = self.reader.read_line(&mut line).await?;
            if read == 0 {
                return Err(McpError::Closed);
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let message: Value = match serde_json::from_str(trimmed) {
                Ok(v) => v,
                Err(_) => {
                    tracing::trace!(line = trimmed, "skipping non-JSON server output");
                    continue;
                }
            };

            // Server-initiated requests and notifications carry a method
            if message.get("method").is_some() {
                continue;
            }
            if message.get("id").and_then(Value::as_u64) != Some(id) {
                continue;
            }

            if let Some(error) = message.get("error") {
                return Err(McpError::Rpc {
                    code: error.get("code").and_then(Value::as_i64).unwrap_or(0),
                    message: error
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown error")
                        .to_string(),
                });
            }

            return message
                .get("result")
                .cloned()
                .ok_or_else(|| McpError::Protocol(format!("response {} has no result", id)));
        }
    }
}
