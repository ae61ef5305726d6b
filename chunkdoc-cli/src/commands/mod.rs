//! CLI Commands

pub mod chunk;
pub mod compact;
pub mod edit;
pub mod export;
pub mod get;
pub mod stats;

use crate::config::CliConfig;
use anyhow::{Context, Result};
use chunkdoc_engine::{AppendLogCodec, DocumentStore};
use chunkdoc_storage::{AsyncWrapper, SledStore};

/// Document store every command runs against
pub type CliStore = DocumentStore<AsyncWrapper<SledStore>, AppendLogCodec>;

/// Open the sled store named by `config`
pub fn open_store(config: &CliConfig) -> Result<CliStore> {
    config.validate().context("Invalid configuration")?;

    let sled = SledStore::open(config.storage_config()).with_context(|| {
        format!("Failed to open store at {}", config.storage.data_dir.display())
    })?;

    DocumentStore::new(AsyncWrapper(sled), AppendLogCodec, config.engine_config())
        .context("Failed to initialize document store")
}

/// Status markers printed before a result line
///
/// Windows consoles get ASCII brackets instead of the glyphs.
pub mod mark {
    use console::{style, StyledObject};

    const fn pick(glyph: &'static str, ascii: &'static str) -> &'static str {
        if cfg!(windows) {
            ascii
        } else {
            glyph
        }
    }

    pub fn ok() -> StyledObject<&'static str> {
        style(pick("\u{2713}", "[OK]")).green()
    }

    pub fn warn() -> StyledObject<&'static str> {
        style(pick("!", "[!]")).yellow()
    }

    pub fn info() -> StyledObject<&'static str> {
        style(pick("*", "[*]")).cyan()
    }
}

/// Format bytes as human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
