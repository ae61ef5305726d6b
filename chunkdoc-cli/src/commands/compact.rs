//! Compact Command
//!
//! Forces a materialization: the log is replayed and rewritten with one
//! entry per live key.

use super::{edit::print_outcome, format_bytes, mark, CliStore};
use anyhow::{Context, Result};
use chunkdoc_engine::{LogDocument, Validator};
use console::style;

/// Run compact command
pub async fn run(store: &CliStore, name: &str) -> Result<()> {
    let before = store
        .load_meta(name)
        .await
        .with_context(|| format!("Failed to load {}", name))?
        .with_context(|| format!("Document not found: {}", name))?;

    // supplying a validator is what forces materialization
    let accept_all: &dyn Validator<LogDocument> =
        &|_: &LogDocument| -> std::result::Result<(), String> { Ok(()) };
    let outcome = store
        .apply_update(name, &[], Some(accept_all))
        .await
        .with_context(|| format!("Failed to compact {}", name))?;

    println!(
        "{} Compacted {}: {} -> {}",
        mark::ok(),
        style(name).bold(),
        format_bytes(before.total_length),
        format_bytes(outcome.meta.total_length)
    );
    print_outcome(&outcome);
    Ok(())
}
