use std::borrow::Cow::{self, Borrowed, Owned};
use std::path::PathBuf;
use std::sync::Arc;

use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use notemate_core::{prompts, Config, Conversation, Role};
use notemate_index::{format_context, VectorStore};
use notemate_llm::{ChatModel, ChatRequest};
use notemate_notes::{McpNoteStore, NoteStore, NotionPage};
use notemate_telemetry::Paths;

use super::ingest::{added_notice, ingest_path};
use super::note::{print_outcome, write_note, NO_HISTORY};
use crate::session::ChatSession;

const COMMANDS: &[&str] = &["/note", "/pages", "/ingest", "/history", "/help", "/quit"];

/// Slash commands understood by the chat loop
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    /// Write the conversation to Notion, optionally to a page given by title or id
    Note(Option<String>),
    Pages,
    Ingest(PathBuf),
    History,
    Help,
    Quit,
    Invalid(String),
}

/// `None` for ordinary chat input
pub fn parse_command(line: &str) -> Option<ReplCommand> {
    let line = line.trim();
    let rest = line.strip_prefix('/')?;
    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, Some(arg.trim()).filter(|a| !a.is_empty())),
        None => (rest, None),
    };

    let command = match name {
        "note" => ReplCommand::Note(arg.map(str::to_string)),
        "pages" => ReplCommand::Pages,
        "ingest" => match arg {
            Some(path) => ReplCommand::Ingest(PathBuf::from(path)),
            None => ReplCommand::Invalid("usage: /ingest <path>".to_string()),
        },
        "history" => ReplCommand::History,
        "help" => ReplCommand::Help,
        "quit" | "exit" => ReplCommand::Quit,
        other => ReplCommand::Invalid(format!("unknown command: /{}", other)),
    };
    Some(command)
}

/// Match a `/note` argument against known pages by title (case-insensitive),
/// otherwise treat it as a page id
pub fn resolve_page(pages: &[NotionPage], wanted: &str) -> String {
    pages
        .iter()
        .find(|p| p.title.eq_ignore_ascii_case(wanted))
        .map(|p| p.id.clone())
        .unwrap_or_else(|| wanted.to_string())
}

/// Answer `input` from retrieved context and recent history.
///
/// `conversation` must already contain the user's message.
pub async fn answer(
    index: &mut VectorStore,
    model: &dyn ChatModel,
    config: &Config,
    conversation: &Conversation,
    input: &str,
) -> anyhow::Result<String> {
    let chunks = index.similarity_search(input, config.top_k)?;
    tracing::debug!(retrieved = chunks.len(), "retrieved context");

    let prompt = prompts::rag_prompt(
        &conversation.recent_history(config.history_turns),
        &format_context(&chunks),
        input,
    );
    let request = ChatRequest::new(&config.chat_model).user(prompt);
    let reply = model.complete(request).await?;
    Ok(reply.trim().to_string())
}

#[derive(Clone)]
struct ReplHelper;

impl Helper for ReplHelper {}

impl Completer for ReplHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        if !line.starts_with('/') || line.contains(' ') {
            return Ok((0, vec![]));
        }
        let candidates = COMMANDS
            .iter()
            .filter(|cmd| cmd.starts_with(line))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for ReplHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for ReplHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        if !line.starts_with('/') || line.contains(' ') {
            return None;
        }
        COMMANDS
            .iter()
            .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
            .map(|cmd| cmd[line.len()..].to_string())
    }
}

impl Validator for ReplHelper {}

struct Repl {
    paths: Paths,
    config: Config,
    rt: tokio::runtime::Runtime,
    model: Arc<dyn ChatModel>,
    index: VectorStore,
    session: ChatSession,
    notion: Option<Arc<McpNoteStore>>,
    pages: Vec<NotionPage>,
}

impl Repl {
    fn notion(&mut self) -> anyhow::Result<Arc<McpNoteStore>> {
        if let Some(store) = &self.notion {
            return Ok(store.clone());
        }
        println!("{}", "Connecting to Notion...".bright_black());
        let store = Arc::new(self.rt.block_on(super::connect_notion(&self.config))?);
        self.notion = Some(store.clone());
        Ok(store)
    }

    fn handle_input(&mut self, input: &str) -> anyhow::Result<()> {
        self.session.push(Role::User, input)?;

        let reply = self.rt.block_on(answer(
            &mut self.index,
            self.model.as_ref(),
            &self.config,
            self.session.conversation(),
            input,
        ))?;

        for line in reply.lines() {
            println!("{}", line.bright_blue());
        }
        self.session.push(Role::Assistant, reply)?;
        Ok(())
    }

    fn handle_pages(&mut self) -> anyhow::Result<()> {
        let store = self.notion()?;
        self.pages = self.rt.block_on(store.list_pages())?;
        if self.pages.is_empty() {
            println!("{}", "No Notion pages found. Check the integration's page access.".yellow());
        }
        for page in &self.pages {
            println!("  {}  {}", page.title.bold(), page.id.bright_black());
        }
        Ok(())
    }

    fn handle_note(&mut self, page: Option<&str>) -> anyhow::Result<()> {
        let history = self.session.conversation().full_history();
        if history.is_empty() {
            println!("{}", NO_HISTORY.yellow());
            return Ok(());
        }

        let page_id = page.map(|p| resolve_page(&self.pages, p));
        let store = self.notion()?;
        println!("{}", "Creating summary and writing to Notion...".bright_black());

        let outcome = self.rt.block_on(write_note(
            &self.paths,
            &self.config,
            self.model.clone(),
            super::image_search(&self.config),
            store,
            &self.session.id,
            &history,
            page_id.as_deref(),
        ))?;
        print_outcome(&outcome);
        Ok(())
    }

    fn handle_ingest(&mut self, path: &std::path::Path) -> anyhow::Result<()> {
        println!("{}", format!("Processing {}...", path.display()).bright_black());
        let report = ingest_path(&mut self.index, path)?;
        for (source, chunks) in &report.sources {
            println!(
                "{}",
                format!("Processed {}. Added {} chunks to the knowledge base.", source, chunks)
                    .green()
            );
            self.session.push(Role::System, added_notice(source))?;
        }
        Ok(())
    }

    fn print_history(&self) {
        for message in self.session.conversation().messages() {
            let tag = format!("[{}]", message.role);
            let tag = match message.role {
                Role::User => tag.green(),
                Role::Assistant => tag.bright_blue(),
                Role::System => tag.yellow(),
            };
            println!("{} {}", tag, message.content);
        }
    }

    /// Returns false when the loop should stop
    fn dispatch(&mut self, command: ReplCommand) -> anyhow::Result<bool> {
        match command {
            ReplCommand::Note(page) => self.handle_note(page.as_deref())?,
            ReplCommand::Pages => self.handle_pages()?,
            ReplCommand::Ingest(path) => self.handle_ingest(&path)?,
            ReplCommand::History => self.print_history(),
            ReplCommand::Help => print_help(),
            ReplCommand::Quit => return Ok(false),
            ReplCommand::Invalid(message) => println!("{}", message.yellow()),
        }
        Ok(true)
    }
}

fn print_help() {
    println!("{}", "Commands:".bold());
    println!("  /note [page]     summarize this chat and write it to Notion");
    println!("  /pages           list Notion pages");
    println!("  /ingest <path>   add a PDF, text or markdown file (or directory)");
    println!("  /history         show this session's messages");
    println!("  /quit            exit");
}

pub fn run(session: Option<&str>) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let config = Config::load(&paths);
    let model = super::chat_model(&config)?;
    let index = super::open_index(&paths, &config)?;
    let session = match session {
        Some(id) => ChatSession::open(&paths, id)?,
        None => ChatSession::create(&paths),
    };

    let mut rl: Editor<ReplHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(ReplHelper));
    let history_file = paths.history_file();
    if rl.load_history(&history_file).is_err() {
        tracing::debug!("no REPL history yet");
    }

    let stats = index.stats()?;
    println!("{}", "=== NoteMate ===".bright_magenta().bold());
    println!(
        "{}",
        format!(
            "Session {} | {} chunks from {} sources | /help for commands",
            session.id, stats.chunks, stats.sources
        )
        .bright_black()
    );
    if !session.conversation().is_empty() {
        println!(
            "{}",
            format!("Resumed {} messages", session.conversation().len()).bright_black()
        );
    }
    println!();

    let mut repl = Repl {
        paths,
        config,
        rt: super::runtime()?,
        model,
        index,
        session,
        notion: None,
        pages: Vec::new(),
    };

    loop {
        match rl.readline("you> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                let result = match parse_command(trimmed) {
                    Some(command) => repl.dispatch(command),
                    None => repl.handle_input(trimmed).map(|_| true),
                };
                match result {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => eprintln!("{}", format!("Error: {:#}", e).red()),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type /quit to exit.".yellow());
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    if let Some(parent) = history_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if let Err(e) = rl.save_history(&history_file) {
        tracing::warn!(error = %e, "failed to save REPL history");
    }
    println!(
        "{}",
        format!("Session saved as {}", repl.session.id).bright_green()
    );
    Ok(())
}
