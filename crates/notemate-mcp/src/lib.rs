//! Tool-calling bridge: a JSON-RPC (MCP) client over a child process's stdio

mod connection;
mod stdio;
mod types;

pub use connection::{Connection, PROTOCOL_VERSION};
pub use stdio::StdioClient;
pub use types::{find_tool, ContentPart, McpError, ServerConfig, ToolInfo, ToolOutput};
