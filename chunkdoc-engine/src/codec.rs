//! Update codecs
//!
//! A codec owns the format of the accumulated update log: how an incoming
//! update is merged onto it, and how it is decoded into a document and
//! re-encoded in compacted form.

use bytes::{BufMut, Bytes, BytesMut};
use chunkdoc_core::error::{ChunkDocError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Format of an accumulated update log
pub trait UpdateCodec: Send + Sync {
    /// Materialized form of the log
    type Document: Send;

    /// Append `update` to the accumulated log
    fn merge(&self, accumulated: &[u8], update: &[u8]) -> Result<Bytes>;

    /// Replay a log into a document
    fn decode(&self, log: &[u8]) -> Result<Self::Document>;

    /// Encode a document as a single compacted update
    fn encode(&self, document: &Self::Document) -> Result<Bytes>;
}

/// One key assignment; `None` removes the key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub key: String,
    pub value: Option<String>,
}

impl LogEntry {
    pub fn set(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }

    pub fn remove(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
        }
    }

    /// Encode this entry as a standalone update
    pub fn to_update(&self) -> Result<Bytes> {
        let mut buf = BytesMut::new();
        write_frame(&mut buf, self)?;
        Ok(buf.freeze())
    }
}

/// Key/value document replayed from a log
pub type LogDocument = BTreeMap<String, String>;

/// Length-prefixed log of bincode `LogEntry` frames
///
/// Each frame is a little-endian `u32` byte length followed by the entry.
/// Later entries win; compaction writes one frame per live key in key order.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppendLogCodec;

impl AppendLogCodec {
    /// Parse every frame of a log, in order
    pub fn entries(log: &[u8]) -> Result<Vec<LogEntry>> {
        let mut entries = Vec::new();
        let mut rest = log;

        while !rest.is_empty() {
            if rest.len() < 4 {
                return Err(ChunkDocError::Codec(format!(
                    "truncated frame header at offset {}",
                    log.len() - rest.len()
                )));
            }
            let (header, body) = rest.split_at(4);
            let len = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
            if body.len() < len {
                return Err(ChunkDocError::Codec(format!(
                    "frame at offset {} needs {} bytes, {} left",
                    log.len() - rest.len(),
                    len,
                    body.len()
                )));
            }

            let entry = bincode::deserialize(&body[..len])
                .map_err(|e| ChunkDocError::Codec(format!("bad frame: {e}")))?;
            entries.push(entry);
            rest = &body[len..];
        }

        Ok(entries)
    }
}

fn write_frame(buf: &mut BytesMut, entry: &LogEntry) -> Result<()> {
    let body = bincode::serialize(entry)?;
    let len = u32::try_from(body.len())
        .map_err(|_| ChunkDocError::Codec(format!("entry of {} bytes too large", body.len())))?;
    buf.put_u32_le(len);
    buf.put_slice(&body);
    Ok(())
}

impl UpdateCodec for AppendLogCodec {
    type Document = LogDocument;

    fn merge(&self, accumulated: &[u8], update: &[u8]) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(accumulated.len() + update.len());
        buf.put_slice(accumulated);
        buf.put_slice(update);
        Ok(buf.freeze())
    }

    fn decode(&self, log: &[u8]) -> Result<LogDocument> {
        let mut doc = LogDocument::new();
        for entry in Self::entries(log)? {
            match entry.value {
                Some(value) => doc.insert(entry.key, value),
                None => doc.remove(&entry.key),
            };
        }
        Ok(doc)
    }

    fn encode(&self, document: &LogDocument) -> Result<Bytes> {
        let mut buf = BytesMut::new();
        for (key, value) in document {
            write_frame(&mut buf, &LogEntry::set(key.clone(), value.clone()))?;
        }
        Ok(buf.freeze())
    }
}
