//! Chunk Command
//!
//! Dry-run chunking report for a local file. Nothing is stored.

use super::{format_bytes, mark};
use anyhow::{Context, Result};
use chunkdoc_core::{chunk, Blake3Hasher, ChunkingConfig};
use console::style;
use std::path::Path;

/// Summary of one chunking pass
#[derive(Debug, PartialEq, Eq)]
pub struct ChunkReport {
    pub total_bytes: u64,
    pub chunks: usize,
    pub distinct: usize,
    pub min_size: usize,
    pub max_size: usize,
}

impl ChunkReport {
    pub fn average_size(&self) -> u64 {
        if self.chunks == 0 {
            0
        } else {
            self.total_bytes / self.chunks as u64
        }
    }

    pub fn duplicates(&self) -> usize {
        self.chunks - self.distinct
    }
}

/// Chunk `data` and summarize the result
pub async fn report(config: &ChunkingConfig, data: &[u8]) -> Result<ChunkReport> {
    let set = chunk(config, data, &Blake3Hasher).await?;
    let sizes = set.ordered_hashes.iter().map(|h| set.chunks[h].len());

    Ok(ChunkReport {
        total_bytes: data.len() as u64,
        chunks: set.ordered_hashes.len(),
        distinct: set.chunks.len(),
        min_size: sizes.clone().min().unwrap_or(0),
        max_size: sizes.max().unwrap_or(0),
    })
}

/// Run chunk command
pub async fn run(config: &ChunkingConfig, path: &Path) -> Result<()> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let report = report(config, &data).await?;

    println!("{}", style(format!("File: {}", path.display())).bold().underlined());
    println!();
    println!(
        "  Bounds:       {} / {} / {} (min / avg / max)",
        config.minimum, config.average, config.maximum
    );
    println!("  Size:         {}", style(format_bytes(report.total_bytes)).cyan());
    println!("  Chunks:       {}", style(report.chunks).cyan());
    println!(
        "  Chunk Size:   {} min, {} avg, {} max",
        format_bytes(report.min_size as u64),
        format_bytes(report.average_size()),
        format_bytes(report.max_size as u64)
    );

    if report.duplicates() > 0 {
        println!(
            "  {} {} duplicate chunk(s), {} distinct",
            mark::info(),
            report.duplicates(),
            report.distinct
        );
    } else {
        println!("  Duplicates:   none");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_report_zeros() {
        let config = ChunkingConfig::new(1024, 256, 2048);
        let report = report(&config, &[0u8; 5000]).await.unwrap();

        assert_eq!(
            report,
            ChunkReport {
                total_bytes: 5000,
                chunks: 3,
                distinct: 2,
                min_size: 904,
                max_size: 2048,
            }
        );
        assert_eq!(report.duplicates(), 1);
        assert_eq!(report.average_size(), 1666);
    }

    #[tokio::test]
    async fn test_report_empty() {
        let report = report(&ChunkingConfig::default(), &[]).await.unwrap();
        assert_eq!(report.chunks, 0);
        assert_eq!(report.average_size(), 0);
    }
}
