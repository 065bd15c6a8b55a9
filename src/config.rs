//! Deserializable console configuration (spec §5, ambient config layer).

use crate::error::{MixError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for constructing a [`crate::console::Console`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConsoleConfig {
    pub sample_rate: f32,
    pub block_size: usize,
    pub num_channels: usize,
    /// Names of auxiliary (non-master) busses; the master bus is implicit.
    #[serde(default)]
    pub aux_bus_names: Vec<String>,
    /// Seed threaded through every `randomize` call for reproducibility.
    pub seed: u64,
    #[serde(default)]
    pub verbose: bool,
    /// Directory of impulse-response WAVs (spec §6); channels whose
    /// convolutional reverb should instead start from an in-memory impulse
    /// (e.g. tests, an offline render tool) leave this `None`.
    #[serde(default)]
    pub ir_dir: Option<PathBuf>,
}

impl ConsoleConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| MixError::Resource(format!("{}: {e}", path.as_ref().display())))?;
        serde_json::from_str(&text).map_err(|e| MixError::Resource(e.to_string()))
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            block_size: 512,
            num_channels: 1,
            aux_bus_names: Vec::new(),
            seed: 0,
            verbose: false,
            ir_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = ConsoleConfig::default();
        assert_eq!(cfg.block_size, 512);
        assert_eq!(cfg.num_channels, 1);
    }

    #[test]
    fn deserializes_minimal_json() {
        let json = r#"{"sample_rate": 44100.0, "block_size": 256, "num_channels": 2, "seed": 7}"#;
        let cfg: ConsoleConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.num_channels, 2);
        assert!(!cfg.verbose);
    }
}
