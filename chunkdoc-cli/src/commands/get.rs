//! Get Command
//!
//! Prints a document, or one key of it.

use super::CliStore;
use anyhow::{Context, Result};
use console::style;

/// Run get command
pub async fn run(store: &CliStore, name: &str, key: Option<&str>) -> Result<()> {
    let doc = store
        .load_document(name)
        .await
        .with_context(|| format!("Failed to load {}", name))?
        .with_context(|| format!("Document not found: {}", name))?;

    match key {
        Some(key) => {
            let value = doc
                .get(key)
                .with_context(|| format!("Key not found: {}", key))?;
            println!("{}", value);
        }
        None => {
            if doc.is_empty() {
                println!("{}", style("(empty)").dim());
            }
            for (key, value) in &doc {
                println!("{} = {}", style(key).cyan(), value);
            }
        }
    }

    Ok(())
}
