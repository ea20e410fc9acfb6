//! Note blocks and their Notion API representation

use notemate_telemetry::truncate_chars;
use serde::Deserialize;
use serde_json::{json, Value};

/// Notion caps a single rich-text item at this many characters
pub const MAX_TEXT_CHARS: usize = 2000;

/// One unit of formatted note content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteBlock {
    Heading1(String),
    Heading2(String),
    Heading3(String),
    Paragraph(String),
    BulletedListItem(String),
    NumberedListItem(String),
    Quote(String),
    Divider,
    Bookmark(String),
}

/// Block as the formatter model emits it
#[derive(Debug, Clone, Deserialize)]
pub struct RawBlock {
    pub block_type: String,
    #[serde(default)]
    pub content: String,
}

impl NoteBlock {
    /// Build a block from a formatter `(block_type, content)` pair.
    /// Unknown block types yield `None`.
    pub fn from_parts(block_type: &str, content: &str) -> Option<Self> {
        let content = content.to_string();
        let block = match block_type.trim() {
            "heading_1" => Self::Heading1(content),
            "heading_2" => Self::Heading2(content),
            "heading_3" => Self::Heading3(content),
            "paragraph" => Self::Paragraph(content),
            "bulleted_list_item" => Self::BulletedListItem(content),
            "numbered_list_item" => Self::NumberedListItem(content),
            "quote" => Self::Quote(content),
            "divider" => Self::Divider,
            "bookmark" => Self::Bookmark(content.trim().to_string()),
            other => {
                tracing::debug!(block_type = other, "dropping unknown block type");
                return None;
            }
        };
        Some(block)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Heading1(_) => "heading_1",
            Self::Heading2(_) => "heading_2",
            Self::Heading3(_) => "heading_3",
            Self::Paragraph(_) => "paragraph",
            Self::BulletedListItem(_) => "bulleted_list_item",
            Self::NumberedListItem(_) => "numbered_list_item",
            Self::Quote(_) => "quote",
            Self::Divider => "divider",
            Self::Bookmark(_) => "bookmark",
        }
    }

    /// Notion API block object; `None` for bookmarks without an http(s) URL
    pub fn to_notion(&self) -> Option<Value> {
        let kind = self.kind();
        match self {
            Self::Divider => Some(json!({
                "object": "block",
                "type": "divider",
                "divider": {}
            })),
            Self::Bookmark(url) => {
                if !url.starts_with("http") {
                    return None;
                }
                Some(json!({
                    "object": "block",
                    "type": "bookmark",
                    "bookmark": { "url": url }
                }))
            }
            Self::Heading1(text)
            | Self::Heading2(text)
            | Self::Heading3(text)
            | Self::Paragraph(text)
            | Self::BulletedListItem(text)
            | Self::NumberedListItem(text)
            | Self::Quote(text) => Some(json!({
                "object": "block",
                "type": kind,
                kind: { "rich_text": rich_text(text) }
            })),
        }
    }
}

fn rich_text(text: &str) -> Value {
    json!([{
        "type": "text",
        "text": { "content": truncate_chars(text, MAX_TEXT_CHARS) }
    }])
}

/// Parse a formatter reply of the form `{"blocks": [...], "reasoning": "..."}`
pub fn parse_formatter_reply(reply: &str) -> Result<Vec<NoteBlock>, serde_json::Error> {
    #[derive(Deserialize)]
    struct Formatting {
        blocks: Vec<RawBlock>,
        #[serde(default)]
        reasoning: String,
    }

    let json = notemate_llm::extract_json_object(reply).unwrap_or(reply);
    let formatting: Formatting = serde_json::from_str(json)?;
    if !formatting.reasoning.is_empty() {
        tracing::debug!(reasoning = %formatting.reasoning, "formatter reasoning");
    }

    Ok(formatting
        .blocks
        .iter()
        .filter_map(|b| NoteBlock::from_parts(&b.block_type, &b.content))
        .collect())
}

/// Serialize blocks for the append call, dropping those Notion would reject
pub fn to_notion_blocks(blocks: &[NoteBlock]) -> Vec<Value> {
    blocks.iter().filter_map(NoteBlock::to_notion).collect()
}

/// Plain layout used when the formatter model is unavailable or unparseable
pub fn fallback_blocks(topic: &str, summary: &str, image_url: &str, timestamp: &str) -> Vec<NoteBlock> {
    let mut blocks = vec![
        NoteBlock::Divider,
        NoteBlock::Heading1(topic.to_string()),
        NoteBlock::Paragraph(format!("Added: {}", timestamp)),
        NoteBlock::Heading2("Summary".to_string()),
        NoteBlock::Paragraph(truncate_chars(summary, MAX_TEXT_CHARS).to_string()),
    ];

    if !image_url.is_empty() {
        blocks.push(NoteBlock::Heading3("Reference Image".to_string()));
        blocks.push(NoteBlock::Bookmark(image_url.to_string()));
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts() {
        assert_eq!(
            NoteBlock::from_parts("heading_2", "Key Points"),
            Some(NoteBlock::Heading2("Key Points".to_string()))
        );
        assert_eq!(NoteBlock::from_parts("divider", "ignored"), Some(NoteBlock::Divider));
        assert_eq!(NoteBlock::from_parts("table", "x"), None);
    }

    #[test]
    fn test_to_notion_paragraph() {
        let block = NoteBlock::Paragraph("hello".to_string()).to_notion().unwrap();
        assert_eq!(block["type"], "paragraph");
        assert_eq!(block["paragraph"]["rich_text"][0]["text"]["content"], "hello");
    }

    #[test]
    fn test_to_notion_truncates_long_text() {
        let long = "é".repeat(2500);
        let block = NoteBlock::Quote(long).to_notion().unwrap();
        let content = block["quote"]["rich_text"][0]["text"]["content"].as_str().unwrap();
        assert_eq!(content.chars().count(), MAX_TEXT_CHARS);
    }

    #[test]
    fn test_bookmark_requires_http() {
        assert!(NoteBlock::Bookmark("ftp://x".to_string()).to_notion().is_none());
        assert!(NoteBlock::Bookmark(String::new()).to_notion().is_none());
        let block = NoteBlock::Bookmark("https://img.example/a.png".to_string())
            .to_notion()
            .unwrap();
        assert_eq!(block["bookmark"]["url"], "https://img.example/a.png");
    }

    #[test]
    fn test_divider_shape() {
        let block = NoteBlock::Divider.to_notion().unwrap();
        assert_eq!(block, json!({"object": "block", "type": "divider", "divider": {}}));
    }

    #[test]
    fn test_parse_formatter_reply_with_fence() {
        let reply = "```json\n{\"blocks\": [\
            {\"block_type\": \"heading_1\", \"content\": \"Gut Health\"},\
            {\"block_type\": \"sparkles\", \"content\": \"?\"},\
            {\"block_type\": \"divider\"}\
        ], \"reasoning\": \"simple\"}\n```";
        let blocks = parse_formatter_reply(reply).unwrap();
        assert_eq!(
            blocks,
            vec![NoteBlock::Heading1("Gut Health".to_string()), NoteBlock::Divider]
        );
    }

    #[test]
    fn test_parse_formatter_reply_rejects_prose() {
        assert!(parse_formatter_reply("I cannot format this.").is_err());
    }

    #[test]
    fn test_fallback_blocks_without_image() {
        let blocks = fallback_blocks("Gastritis", "summary text", "", "2025-01-01 09:00:00");
        assert_eq!(blocks.len(), 5);
        assert_eq!(blocks[0], NoteBlock::Divider);
        assert_eq!(blocks[2], NoteBlock::Paragraph("Added: 2025-01-01 09:00:00".to_string()));
    }

    #[test]
    fn test_fallback_blocks_with_image() {
        let blocks = fallback_blocks("Gastritis", "s", "https://img.example/g.jpg", "t");
        assert_eq!(blocks.len(), 7);
        assert_eq!(blocks[5], NoteBlock::Heading3("Reference Image".to_string()));
        assert_eq!(to_notion_blocks(&blocks).len(), 7);
    }
}
