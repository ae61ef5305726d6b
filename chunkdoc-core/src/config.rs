//! Chunking parameters
//!
//! The (average, minimum, maximum) triple fixes chunk boundaries. Changing it
//! for an existing document is safe but defeats reuse for the next write,
//! since every boundary moves.

use crate::error::{ChunkDocError, Result};
use serde::{Deserialize, Serialize};

pub const AVERAGE_MIN: usize = 256;
pub const AVERAGE_MAX: usize = 268_435_456;
pub const MINIMUM_MIN: usize = 64;
pub const MINIMUM_MAX: usize = 67_108_864;
pub const MAXIMUM_MIN: usize = 1024;
pub const MAXIMUM_MAX: usize = 1_073_741_824;

/// Bounds on `round(log2(average))`
const BITS_MIN: u32 = 8;
const BITS_MAX: u32 = 28;

/// Chunk size bounds for content-defined chunking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target average chunk size in bytes
    #[serde(default = "default_average")]
    pub average: usize,

    /// Minimum size of every chunk but the last
    #[serde(default = "default_minimum")]
    pub minimum: usize,

    /// Hard upper bound on chunk size
    #[serde(default = "default_maximum")]
    pub maximum: usize,
}

fn default_average() -> usize {
    crate::DEFAULT_AVERAGE_CHUNK_SIZE
}

fn default_minimum() -> usize {
    crate::DEFAULT_MIN_CHUNK_SIZE
}

fn default_maximum() -> usize {
    crate::DEFAULT_MAX_CHUNK_SIZE
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            average: default_average(),
            minimum: default_minimum(),
            maximum: default_maximum(),
        }
    }
}

impl ChunkingConfig {
    pub fn new(average: usize, minimum: usize, maximum: usize) -> Self {
        Self {
            average,
            minimum,
            maximum,
        }
    }

    /// Check every bound and return `round(log2(average))`.
    pub fn validate(&self) -> Result<u32> {
        let Self {
            average,
            minimum,
            maximum,
        } = *self;

        if average < AVERAGE_MIN {
            return Err(invalid(format!("average {average} < {AVERAGE_MIN}")));
        }
        if average > AVERAGE_MAX {
            return Err(invalid(format!("average {average} > {AVERAGE_MAX}")));
        }
        if minimum < MINIMUM_MIN {
            return Err(invalid(format!("minimum {minimum} < {MINIMUM_MIN}")));
        }
        if minimum > MINIMUM_MAX {
            return Err(invalid(format!("minimum {minimum} > {MINIMUM_MAX}")));
        }
        if minimum >= average {
            return Err(invalid(format!(
                "minimum {minimum} must be below average {average}"
            )));
        }
        if maximum < MAXIMUM_MIN {
            return Err(invalid(format!("maximum {maximum} < {MAXIMUM_MIN}")));
        }
        if maximum > MAXIMUM_MAX {
            return Err(invalid(format!("maximum {maximum} > {MAXIMUM_MAX}")));
        }
        if maximum <= average {
            return Err(invalid(format!(
                "maximum {maximum} must be above average {average}"
            )));
        }
        if maximum - minimum < average {
            return Err(invalid(format!(
                "maximum - minimum ({}) must be at least average {average}",
                maximum - minimum
            )));
        }

        let bits = (average as f64).log2().round() as u32;
        if !(BITS_MIN..=BITS_MAX).contains(&bits) {
            return Err(invalid(format!(
                "average must round to {BITS_MIN}..={BITS_MAX} bits, got {bits}"
            )));
        }
        Ok(bits)
    }
}

fn invalid(msg: String) -> ChunkDocError {
    ChunkDocError::Configuration(msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(ChunkingConfig::default().validate().unwrap(), 10);
    }

    #[test]
    fn test_average_below_minimum_bound() {
        let err = ChunkingConfig::new(64, 64, 2048).validate().unwrap_err();
        assert!(matches!(err, ChunkDocError::Configuration(_)));
    }

    #[test]
    fn test_relationships() {
        // minimum must be strictly below average
        assert!(ChunkingConfig::new(1024, 1024, 4096).validate().is_err());
        // maximum must be strictly above average
        assert!(ChunkingConfig::new(1024, 256, 1024).validate().is_err());
        // window must span at least one average
        assert!(ChunkingConfig::new(1024, 900, 1500).validate().is_err());
        assert!(ChunkingConfig::new(1024, 256, 1280).validate().is_ok());
    }

    #[test]
    fn test_bits_rounding() {
        // 362 still rounds down to 2^8
        assert_eq!(ChunkingConfig::new(362, 64, 1024).validate().unwrap(), 8);
        assert_eq!(ChunkingConfig::new(65536, 16384, 262144).validate().unwrap(), 16);
    }

    #[test]
    fn test_serde_defaults_fill_in() {
        let cfg: ChunkingConfig = serde_json::from_str(r#"{"average": 4096}"#).unwrap();
        assert_eq!(cfg.average, 4096);
        assert_eq!(cfg.minimum, crate::DEFAULT_MIN_CHUNK_SIZE);
        assert_eq!(cfg.maximum, crate::DEFAULT_MAX_CHUNK_SIZE);
    }
}
