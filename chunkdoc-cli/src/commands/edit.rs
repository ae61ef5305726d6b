//! Set / Del Commands
//!
//! Append one key assignment to a document's log.

use super::{format_bytes, mark, CliStore};
use anyhow::{Context, Result};
use chunkdoc_engine::{LogEntry, UpdateOutcome};
use console::style;

/// Run set command
pub async fn set(store: &CliStore, name: &str, key: &str, value: &str) -> Result<()> {
    let outcome = write(store, name, LogEntry::set(key, value)).await?;
    println!(
        "{} Set {} in {}",
        mark::ok(),
        style(key).cyan(),
        style(name).bold()
    );
    print_outcome(&outcome);
    Ok(())
}

/// Run del command
pub async fn del(store: &CliStore, name: &str, key: &str) -> Result<()> {
    let exists = store
        .load_document(name)
        .await
        .context("Failed to read document")?
        .is_some_and(|doc| doc.contains_key(key));
    if !exists {
        println!(
            "{} {} has no key {}",
            mark::warn(),
            name,
            key
        );
        return Ok(());
    }

    let outcome = write(store, name, LogEntry::remove(key)).await?;
    println!(
        "{} Removed {} from {}",
        mark::ok(),
        style(key).cyan(),
        style(name).bold()
    );
    print_outcome(&outcome);
    Ok(())
}

async fn write(store: &CliStore, name: &str, entry: LogEntry) -> Result<UpdateOutcome> {
    let update = entry.to_update()?;
    store
        .apply_update(name, &update, None)
        .await
        .with_context(|| format!("Failed to update {}", name))
}

pub(crate) fn print_outcome(outcome: &UpdateOutcome) {
    let stats = &outcome.stats;
    println!(
        "  Chunks:   {} reused, {} written, {} deleted",
        style(stats.chunks_reused).cyan(),
        style(stats.chunks_written).cyan(),
        style(stats.chunks_deleted).cyan()
    );
    println!(
        "  Written:  {} of {}",
        format_bytes(stats.bytes_total - stats.bytes_reused),
        format_bytes(stats.bytes_total)
    );
    if outcome.materialized {
        println!("  {}", style("(log compacted)").dim());
    }
}
