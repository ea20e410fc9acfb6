use crate::session::ChatSession;
use colored::Colorize;
use notemate_core::Config;
use notemate_llm::ChatModel;
use notemate_notes::{ImageSearch, NoteError, NoteOutcome, NotePipeline, NoteStore};
use notemate_telemetry::{append_jsonl, NoteRunRecord, Paths};
use std::sync::Arc;

pub const NO_HISTORY: &str = "No chat history available to create a note.";

/// Run the note pipeline and log the run to `runs.jsonl`
#[allow(clippy::too_many_arguments)]
pub async fn write_note(
    paths: &Paths,
    config: &Config,
    model: Arc<dyn ChatModel>,
    images: Option<Arc<dyn ImageSearch>>,
    store: Arc<dyn NoteStore>,
    session_id: &str,
    chat_history: &str,
    page_id: Option<&str>,
) -> Result<NoteOutcome, NoteError> {
    let pipeline = NotePipeline::standard(config, model, images, store);
    let result = pipeline.create_note(chat_history, page_id).await;

    let record = match &result {
        Ok(outcome) => NoteRunRecord {
            run_id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            timestamp: chrono::Utc::now(),
            topic: outcome.topic.clone(),
            page_id: outcome.page_id.clone(),
            page_title: outcome.page_title.clone(),
            write_success: outcome.write_success,
            block_count: outcome.block_count,
            error: outcome.error.clone(),
        },
        Err(e) => NoteRunRecord {
            run_id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            timestamp: chrono::Utc::now(),
            topic: String::new(),
            page_id: page_id.unwrap_or_default().to_string(),
            page_title: String::new(),
            write_success: false,
            block_count: 0,
            error: Some(e.to_string()),
        },
    };

    if let Err(e) = append_jsonl(&paths.runs_file(), &record) {
        tracing::warn!(error = %e, "failed to record note run");
    }
    result
}

/// Human-readable result lines
pub fn describe(outcome: &NoteOutcome) -> Vec<String> {
    if !outcome.write_success {
        return vec![format!(
            "Notion write failed: {}",
            outcome.error.as_deref().unwrap_or("Unknown error")
        )];
    }

    let mut lines = vec![format!("Note added to '{}'", outcome.page_title)];
    if !outcome.topic.is_empty() {
        lines.push(format!("Topic: {}", outcome.topic));
    }
    if let Some(url) = outcome.page_url() {
        lines.push(format!("Open in Notion: {}", url));
    }
    lines
}

pub fn print_outcome(outcome: &NoteOutcome) {
    for (i, line) in describe(outcome).iter().enumerate() {
        if !outcome.write_success {
            println!("{}", line.red());
        } else if i == 0 {
            println!("{}", line.green());
        } else {
            println!("{}", line);
        }
    }
}

pub fn run(session_id: &str, page: Option<&str>) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let config = Config::load(&paths);
    let session = ChatSession::open_existing(&paths, session_id)?;

    let history = session.conversation().full_history();
    if history.is_empty() {
        anyhow::bail!(NO_HISTORY);
    }

    let model = super::chat_model(&config)?;
    let images = super::image_search(&config);

    let rt = super::runtime()?;
    let outcome = rt.block_on(async {
        let store = Arc::new(super::connect_notion(&config).await?);
        let outcome = write_note(
            &paths, &config, model, images, store, &session.id, &history, page,
        )
        .await?;
        anyhow::Ok(outcome)
    })?;

    print_outcome(&outcome);
    if !outcome.write_success {
        anyhow::bail!("note was not written");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_success() {
        let outcome = NoteOutcome {
            topic: "Gut Health".to_string(),
            write_success: true,
            page_id: "ab-cd".to_string(),
            page_title: "Health".to_string(),
            ..Default::default()
        };
        assert_eq!(
            describe(&outcome),
            vec![
                "Note added to 'Health'".to_string(),
                "Topic: Gut Health".to_string(),
                "Open in Notion: https://notion.so/abcd".to_string(),
            ]
        );
    }

    #[test]
    fn test_describe_failure() {
        let outcome = NoteOutcome {
            error: Some("No pages found in Notion workspace".to_string()),
            ..Default::default()
        };
        assert_eq!(
            describe(&outcome),
            vec!["Notion write failed: No pages found in Notion workspace".to_string()]
        );
        assert_eq!(
            describe(&NoteOutcome::default()),
            vec!["Notion write failed: Unknown error".to_string()]
        );
    }
}
