use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, thiserror::Error)]
pub enum McpError {
    #[error("failed to spawn tool server '{name}': {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("tool server I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON from tool server: {0}")]
    Json(#[from] serde_json::Error),
    #[error("tool server closed the connection")]
    Closed,
    #[error("no response to '{method}' within {secs}s")]
    Timeout { method: String, secs: u64 },
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("tool '{tool}' failed: {message}")]
    Tool { tool: String, message: String },
    #[error("unexpected response to '{0}'")]
    Protocol(String),
}

/// How to launch a stdio tool server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

/// A tool advertised by `tools/list`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "inputSchema")]
    pub input_schema: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPart {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

/// Result payload of `tools/call`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    #[serde(default)]
    pub content: Vec<ContentPart>,
    #[serde(default, rename = "isError")]
    pub is_error: bool,
}

impl ToolOutput {
    /// Text parts joined by newlines
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// First tool whose name contains `needle`, ignoring case
pub fn find_tool<'a>(tools: &'a [ToolInfo], needle: &str) -> Option<&'a ToolInfo> {
    let needle = needle.to_lowercase();
    tools
        .iter()
        .find(|tool| tool.name.to_lowercase().contains(&needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(name: &str) -> ToolInfo {
        ToolInfo {
            name: name.to_string(),
            description: None,
            input_schema: Value::Null,
        }
    }

    #[test]
    fn test_find_tool_case_insensitive() {
        let tools = vec![tool("API-get-self"), tool("API-post-search"), tool("API-patch-block-children")];
        assert_eq!(find_tool(&tools, "search").unwrap().name, "API-post-search");
        assert_eq!(
            find_tool(&tools, "PATCH-BLOCK-CHILDREN").unwrap().name,
            "API-patch-block-children"
        );
        assert!(find_tool(&tools, "delete").is_none());
    }

    #[test]
    fn test_tool_output_text_skips_non_text() {
        let output: ToolOutput = serde_json::from_value(serde_json::json!({
            "content": [
                {"type": "text", "text": "first"},
                {"type": "image", "data": "..."},
                {"type": "text", "text": "second"}
            ]
        }))
        .unwrap();

        assert!(!output.is_error);
        assert_eq!(output.text(), "first\nsecond");
    }

    #[test]
    fn test_tool_info_schema_optional() {
        let info: ToolInfo = serde_json::from_str(r#"{"name":"API-post-search"}"#).unwrap();
        assert_eq!(info.input_schema, Value::Null);
    }
}
