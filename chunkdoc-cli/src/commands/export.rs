//! Export Command
//!
//! Writes the raw reconstructed log of a document to a file.

use super::{format_bytes, mark, CliStore};
use anyhow::{Context, Result};
use console::style;
use std::path::Path;

/// Run export command
pub async fn run(store: &CliStore, name: &str, output: &Path) -> Result<()> {
    let bytes = store
        .load(name)
        .await
        .with_context(|| format!("Failed to load {}", name))?
        .with_context(|| format!("Document not found: {}", name))?;

    tokio::fs::write(output, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "{} Exported {} ({}) to {}",
        mark::ok(),
        style(name).bold(),
        format_bytes(bytes.len() as u64),
        output.display()
    );
    Ok(())
}
