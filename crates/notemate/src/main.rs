mod cli;
mod commands;
mod session;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Secrets usually live in a .env next to where the app is started
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Chat { session } => commands::chat::run(session.as_deref()),
        Commands::Ingest { path } => commands::ingest::run(&path),
        Commands::Pages => commands::pages::run(),
        Commands::Note { session, page } => commands::note::run(&session, page.as_deref()),
        Commands::Status => commands::status::run(),
        Commands::Init => commands::init::run(),
        Commands::Version => commands::version::run(),
    }
}
