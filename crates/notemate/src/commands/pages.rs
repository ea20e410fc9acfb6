use notemate_core::Config;
use notemate_notes::NoteStore;
use notemate_telemetry::Paths;

pub fn run() -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let config = Config::load(&paths);

    let rt = super::runtime()?;
    let pages = rt.block_on(async {
        let store = super::connect_notion(&config).await?;
        let pages = store.list_pages().await;
        if let Err(e) = store.shutdown().await {
            tracing::debug!(error = %e, "tool server shutdown failed");
        }
        anyhow::Ok(pages?)
    })?;

    if pages.is_empty() {
        println!("No Notion pages found. Share a page with the integration first.");
        return Ok(());
    }

    let width = pages.iter().map(|p| p.title.chars().count()).max().unwrap_or(0);
    for page in &pages {
        println!("{:<width$}  {}", page.title, page.id, width = width);
    }
    Ok(())
}
