//! Tool server launched as a child process

use crate::connection::Connection;
use crate::types::{McpError, ServerConfig, ToolInfo, ToolOutput};
use serde_json::Value;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::BufReader;
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

/// MCP client speaking to a subprocess over stdin/stdout.
///
/// The child is killed when the client is dropped.
pub struct StdioClient {
    config: ServerConfig,
    conn: Connection<BufReader<ChildStdout>, ChildStdin>,
    child: Child,
}

impl StdioClient {
    /// Spawn the server and complete the `initialize` handshake
    pub async fn spawn(config: ServerConfig) -> Result<Self, McpError> {
        Self::spawn_with_timeout(config, Duration::from_secs(60)).await
    }

    pub async fn spawn_with_timeout(config: ServerConfig, timeout: Duration) -> Result<Self, McpError> {
        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args)
            .envs(&config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            // stderr is never drained, so a chatty server must not block on it
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| McpError::Spawn {
            name: config.name.clone(),
            source,
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| McpError::Protocol("child stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| McpError::Protocol("child stdout unavailable".to_string()))?;

        let mut conn = Connection::new(BufReader::new(stdout), stdin).with_timeout(timeout);
        conn.initialize(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
            .await?;

        tracing::info!(server = %config.name, command = %config.command, "tool server connected");

        Ok(Self {
            config,
            conn,
            child,
        })
    }

    pub fn server_config(&self) -> &ServerConfig {
        &self.config
    }

    pub async fn list_tools(&mut self) -> Result<Vec<ToolInfo>, McpError> {
        self.conn.list_tools().await
    }

    pub async fn call_tool(&mut self, name: &str, arguments: Value) -> Result<ToolOutput, McpError> {
        tracing::debug!(server = %self.config.name, tool = name, "calling tool");
        self.conn.call_tool(name, arguments).await
    }

    /// Terminate the server now instead of waiting for drop
    pub async fn shutdown(mut self) -> Result<(), McpError> {
        self.child.kill().await?;
        Ok(())
    }
}
