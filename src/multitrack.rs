//! Block-at-a-time source of per-channel mono audio (spec §4.4, §4.14).

use crate::error::{MixError, Result};
use crate::processor::AudioBlock;
use crate::wave;
use std::path::Path;

/// Feeds the console one block per channel at a time. Built either from a
/// multichannel WAV file (each file channel becomes a console channel) or
/// directly from in-memory sample buffers, e.g. for synthetic test signals.
#[derive(Debug)]
pub struct Multitrack {
    channels: Vec<Vec<f32>>,
    block_size: usize,
    sample_rate: u32,
    cursor: usize,
}

impl Multitrack {
    pub fn from_channels(channels: Vec<Vec<f32>>, sample_rate: u32, block_size: usize) -> Result<Self> {
        if channels.is_empty() {
            return Err(MixError::InvalidConstruction("multitrack requires at least one channel".into()));
        }
        let len = channels[0].len();
        if channels.iter().any(|c| c.len() != len) {
            return Err(MixError::InvalidConstruction("all multitrack channels must have equal length".into()));
        }
        Ok(Self { channels, block_size, sample_rate, cursor: 0 })
    }

    pub fn from_wav(path: impl AsRef<Path>, block_size: usize) -> Result<Self> {
        let (channels, sample_rate) = wave::read_wav(path)?;
        Self::from_channels(channels, sample_rate, block_size)
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Total number of full blocks available; a trailing partial block is
    /// dropped, matching the reference console's block accounting.
    pub fn num_blocks(&self) -> usize {
        self.channels[0].len() / self.block_size
    }

    /// Advance by one block, returning one mono [`AudioBlock`] per channel,
    /// or `None` once fewer than `block_size` samples remain.
    pub fn next_block(&mut self) -> Option<Vec<AudioBlock>> {
        if self.cursor + self.block_size > self.channels[0].len() {
            return None;
        }
        let start = self.cursor;
        let end = start + self.block_size;
        self.cursor = end;
        Some(
            self.channels
                .iter()
                .map(|c| AudioBlock::mono(c[start..end].to_vec()))
                .collect(),
        )
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_exact_number_of_blocks() {
        let mut mt = Multitrack::from_channels(vec![vec![0.0; 10], vec![0.0; 10]], 48_000, 4).unwrap();
        assert_eq!(mt.num_blocks(), 2);
        assert!(mt.next_block().is_some());
        assert!(mt.next_block().is_some());
        assert!(mt.next_block().is_none());
    }

    #[test]
    fn mismatched_channel_lengths_rejected() {
        assert!(Multitrack::from_channels(vec![vec![0.0; 4], vec![0.0; 5]], 48_000, 2).is_err());
    }
}
