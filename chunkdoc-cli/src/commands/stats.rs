//! Stats Command
//!
//! Shows the chunk meta of a stored document.

use super::{format_bytes, CliStore};
use anyhow::{Context, Result};
use console::style;

/// Run stats command
pub async fn run(store: &CliStore, name: &str) -> Result<()> {
    let meta = store
        .load_meta(name)
        .await
        .with_context(|| format!("Failed to load {}", name))?
        .with_context(|| format!("Document not found: {}", name))?;

    let distinct = meta.referenced().len();
    let every = store.config().materialize.every;

    println!("{}", style(format!("Document: {}", name)).bold().underlined());
    println!();
    println!("  Chunks:       {}", style(meta.ordered_hashes.len()).cyan());
    println!("  Distinct:     {}", style(distinct).cyan());
    println!("  Total Size:   {}", style(format_bytes(meta.total_length)).cyan());
    println!("  Writes:       {}", style(meta.write_count).cyan());
    if every == 0 {
        println!("  Compaction:   {}", style("manual only").dim());
    } else {
        let next = every - meta.write_count % every;
        println!("  Compaction:   in {} write(s)", style(next).cyan());
    }

    if !meta.ordered_hashes.is_empty() {
        let average = meta.total_length / meta.ordered_hashes.len() as u64;
        println!("  Avg Chunk:    {}", format_bytes(average));
    }

    Ok(())
}
