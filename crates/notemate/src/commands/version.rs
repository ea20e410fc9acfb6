pub fn run() -> anyhow::Result<()> {
    println!("notemate {}", env!("CARGO_PKG_VERSION"));
    println!("Document chat with Notion note publishing");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_output() {
        assert!(run().is_ok());
    }
}
