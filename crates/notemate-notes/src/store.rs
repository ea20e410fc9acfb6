//! Remote page store reached through the MCP bridge

use crate::error::NoteError;
use async_trait::async_trait;
use notemate_mcp::{find_tool, Connection, McpError, ServerConfig, StdioClient, ToolInfo, ToolOutput};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncWrite};
use tokio::sync::Mutex;

const SEARCH_TOOL: &str = "search";
const APPEND_TOOL: &str = "patch-block-children";
const UNTITLED: &str = "Untitled";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotionPage {
    pub id: String,
    pub title: String,
}

/// Where notes are written
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Pages visible to the integration, in search order
    async fn list_pages(&self) -> Result<Vec<NotionPage>, NoteError>;

    /// Append Notion block objects as children of `page_id`
    async fn append_blocks(&self, page_id: &str, blocks: &[Value]) -> Result<(), NoteError>;
}

fn page_title(result: &Value) -> String {
    result
        .get("properties")
        .and_then(Value::as_object)
        .and_then(|props| {
            props
                .values()
                .find(|prop| prop.get("type").and_then(Value::as_str) == Some("title"))
        })
        .and_then(|prop| prop.pointer("/title/0/plain_text"))
        .and_then(Value::as_str)
        .unwrap_or(UNTITLED)
        .to_string()
}

/// Pages from the text of a search tool result.
///
/// The server wraps the API response in text content, sometimes with a
/// prefix; anything that is not a `results` list yields no pages.
pub fn parse_pages(text: &str) -> Vec<NotionPage> {
    let Some(json) = notemate_llm::extract_json_object(text) else {
        return Vec::new();
    };
    let body: Value = match serde_json::from_str(json) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "unparseable search result");
            return Vec::new();
        }
    };

    body.get("results")
        .and_then(Value::as_array)
        .map(|results| {
            results
                .iter()
                .filter_map(|result| {
                    let id = result.get("id").and_then(Value::as_str)?;
                    Some(NotionPage {
                        id: id.to_string(),
                        title: page_title(result),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// An MCP session that can list and call tools
#[async_trait]
pub trait ToolCaller: Send {
    async fn list_tools(&mut self) -> Result<Vec<ToolInfo>, McpError>;
    async fn call_tool(&mut self, name: &str, arguments: Value) -> Result<ToolOutput, McpError>;
}

#[async_trait]
impl ToolCaller for StdioClient {
    async fn list_tools(&mut self) -> Result<Vec<ToolInfo>, McpError> {
        StdioClient::list_tools(self).await
    }

    async fn call_tool(&mut self, name: &str, arguments: Value) -> Result<ToolOutput, McpError> {
        StdioClient::call_tool(self, name, arguments).await
    }
}

#[async_trait]
impl<R, W> ToolCaller for Connection<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn list_tools(&mut self) -> Result<Vec<ToolInfo>, McpError> {
        Connection::list_tools(self).await
    }

    async fn call_tool(&mut self, name: &str, arguments: Value) -> Result<ToolOutput, McpError> {
        Connection::call_tool(self, name, arguments).await
    }
}

/// `NoteStore` backed by the Notion MCP server
pub struct McpNoteStore<C = StdioClient> {
    client: Mutex<C>,
    tools: Vec<ToolInfo>,
}

impl McpNoteStore {
    /// Spawn the server and discover its tools
    pub async fn connect(config: ServerConfig) -> Result<Self, NoteError> {
        let client = StdioClient::spawn(config).await?;
        Self::with_client(client).await
    }

    pub async fn shutdown(self) -> Result<(), NoteError> {
        self.client.into_inner().shutdown().await?;
        Ok(())
    }
}

impl<C: ToolCaller> McpNoteStore<C> {
    /// Discover the tools of an already initialized session
    pub async fn with_client(mut client: C) -> Result<Self, NoteError> {
        let tools = client.list_tools().await?;
        tracing::debug!(count = tools.len(), "discovered tools");
        Ok(Self {
            client: Mutex::new(client),
            tools,
        })
    }

    pub fn tools(&self) -> &[ToolInfo] {
        &self.tools
    }

    fn tool(&self, needle: &str, label: &str) -> Result<String, NoteError> {
        find_tool(&self.tools, needle)
            .map(|t| t.name.clone())
            .ok_or_else(|| NoteError::ToolNotFound(label.to_string()))
    }
}

#[async_trait]
impl<C: ToolCaller> NoteStore for McpNoteStore<C> {
    async fn list_pages(&self) -> Result<Vec<NotionPage>, NoteError> {
        let tool = self.tool(SEARCH_TOOL, "Search")?;
        let output = self
            .client
            .lock()
            .await
            .call_tool(&tool, json!({ "query": "" }))
            .await?;
        Ok(parse_pages(&output.text()))
    }

    async fn append_blocks(&self, page_id: &str, blocks: &[Value]) -> Result<(), NoteError> {
        let tool = self.tool(APPEND_TOOL, "Append blocks")?;
        self.client
            .lock()
            .await
            .call_tool(&tool, json!({ "block_id": page_id, "children": blocks }))
            .await?;
        tracing::info!(page_id, blocks = blocks.len(), "appended blocks");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, ReadHalf, WriteHalf};

    type ClientConnection = Connection<BufReader<ReadHalf<DuplexStream>>, WriteHalf<DuplexStream>>;

    /// Fake Notion server: answers `tools/list` with `tools`, then replies to
    /// each `tools/call` with the next canned result. Returns the calls it saw.
    fn serve(tools: Value, results: Vec<Value>) -> (ClientConnection, tokio::task::JoinHandle<Vec<Value>>) {
        let (client, server) = duplex(64 * 1024);
        let (client_read, client_write) = tokio::io::split(client);
        let (server_read, mut server_write) = tokio::io::split(server);

        let handle = tokio::spawn(async move {
            let mut reader = BufReader::new(server_read);
            let mut calls = Vec::new();
            let mut results = results.into_iter();
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).await.unwrap() == 0 {
                    break;
                }
                let req: Value = serde_json::from_str(&line).unwrap();
                let result = if req["method"] == "tools/list" {
                    json!({ "tools": tools })
                } else {
                    calls.push(req["params"].clone());
                    match results.next() {
                        Some(result) => result,
                        None => break,
                    }
                };
                let reply = json!({"jsonrpc": "2.0", "id": req["id"], "result": result});
                server_write
                    .write_all(format!("{}\n", reply).as_bytes())
                    .await
                    .unwrap();
            }
            calls
        });

        (Connection::new(BufReader::new(client_read), client_write), handle)
    }

    fn notion_tools() -> Value {
        json!([
            {"name": "API-get-self"},
            {"name": "API-post-search"},
            {"name": "API-patch-block-children"}
        ])
    }

    fn text_result(text: &str, is_error: bool) -> Value {
        json!({"content": [{"type": "text", "text": text}], "isError": is_error})
    }

    #[tokio::test]
    async fn test_mcp_store_lists_and_appends() {
        let (conn, server) = serve(
            notion_tools(),
            vec![text_result(SEARCH_RESPONSE, false), text_result("{}", false)],
        );
        let store = McpNoteStore::with_client(conn).await.unwrap();
        assert_eq!(store.tools().len(), 3);

        let pages = store.list_pages().await.unwrap();
        assert_eq!(pages[0].title, "Health Notes");

        let blocks = vec![json!({"object": "block", "type": "divider", "divider": {}})];
        store.append_blocks("1f2e-aa", &blocks).await.unwrap();
        drop(store);

        let calls = server.await.unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0]["name"], "API-post-search");
        assert_eq!(calls[0]["arguments"], json!({"query": ""}));
        assert_eq!(calls[1]["name"], "API-patch-block-children");
        assert_eq!(
            calls[1]["arguments"],
            json!({"block_id": "1f2e-aa", "children": blocks})
        );
    }

    #[tokio::test]
    async fn test_mcp_store_append_tool_error() {
        let (conn, _server) = serve(notion_tools(), vec![text_result("object_not_found", true)]);
        let store = McpNoteStore::with_client(conn).await.unwrap();

        let err = store.append_blocks("missing", &[json!({})]).await.unwrap_err();
        match err {
            NoteError::Mcp(McpError::Tool { tool, message }) => {
                assert_eq!(tool, "API-patch-block-children");
                assert_eq!(message, "object_not_found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_mcp_store_missing_tools() {
        let (conn, _server) = serve(json!([{"name": "API-get-self"}]), vec![]);
        let store = McpNoteStore::with_client(conn).await.unwrap();

        let err = store.list_pages().await.unwrap_err();
        assert_eq!(err.to_string(), "Search tool not found in MCP");
        let err = store.append_blocks("p", &[]).await.unwrap_err();
        assert_eq!(err.to_string(), "Append blocks tool not found in MCP");
    }

    const SEARCH_RESPONSE: &str = r#"{"object":"list","results":[
        {"object":"page","id":"1f2e-aa","properties":{
            "Status":{"type":"select","select":null},
            "Name":{"type":"title","title":[{"plain_text":"Health Notes"}]}}},
        {"object":"page","id":"2b3c-bb","properties":{
            "title":{"type":"title","title":[]}}},
        {"object":"database","properties":{}}
    ],"has_more":false}"#;

    #[test]
    fn test_parse_pages() {
        let pages = parse_pages(SEARCH_RESPONSE);
        assert_eq!(
            pages,
            vec![
                NotionPage {
                    id: "1f2e-aa".to_string(),
                    title: "Health Notes".to_string()
                },
                NotionPage {
                    id: "2b3c-bb".to_string(),
                    title: "Untitled".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_parse_pages_with_prefix() {
        let text = format!("Search results: {}", SEARCH_RESPONSE);
        assert_eq!(parse_pages(&text).len(), 2);
    }

    #[test]
    fn test_parse_pages_garbage() {
        assert!(parse_pages("").is_empty());
        assert!(parse_pages("rate limited").is_empty());
        assert!(parse_pages(r#"{"object":"error","message":"unauthorized"}"#).is_empty());
        assert!(parse_pages("{not json}").is_empty());
    }
}
