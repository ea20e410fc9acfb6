use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "notemate")]
#[command(version)]
#[command(about = "Chat with your documents and save the conversation to Notion")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat over the knowledge base
    Chat {
        /// Resume a saved session (new session if omitted)
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Add a PDF, text or markdown file (or a directory of them) to the knowledge base
    Ingest {
        /// File or directory to ingest
        path: PathBuf,
    },

    /// List Notion pages the integration can write to
    Pages,

    /// Summarize a saved session and write it to Notion
    Note {
        /// Session id to summarize
        #[arg(short, long)]
        session: String,

        /// Target page id (first page found if omitted)
        #[arg(short, long)]
        page: Option<String>,
    },

    /// Show knowledge base and configuration status
    Status,

    /// Write a default config file
    Init,

    /// Print version information
    Version,
}
