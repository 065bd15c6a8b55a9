//! The `Processor` trait shared by every DSP block (spec §4.5).

use crate::error::{MixError, Result};
use crate::parameter::{ParameterValue, RandomDistribution};
use crate::parameter_list::ParameterList;
use rand::RngCore;
use serde_json::{Map, Value as Json};

/// A block of audio: one `Vec<f32>` per channel, all of equal length.
///
/// Mono processors (pre/core chain) operate on a single-channel block;
/// post-processing and the bus graph operate on two-channel blocks. Kept
/// as a thin wrapper rather than a fixed-width array so the same type
/// serves both without generics leaking into the `Processor` trait object.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AudioBlock {
    pub channels: Vec<Vec<f32>>,
}

impl AudioBlock {
    pub fn mono(samples: Vec<f32>) -> Self {
        Self { channels: vec![samples] }
    }

    pub fn stereo(left: Vec<f32>, right: Vec<f32>) -> Self {
        Self { channels: vec![left, right] }
    }

    pub fn silence(num_channels: usize, block_size: usize) -> Self {
        Self { channels: vec![vec![0.0; block_size]; num_channels] }
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn block_size(&self) -> usize {
        self.channels.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_mono(&self) -> bool {
        self.channels.len() == 1
    }

    /// Duplicate a mono block across two channels in place (spec §4.7 mono-to-stereo).
    pub fn to_stereo(&mut self) {
        if self.channels.len() == 1 {
            let mono = self.channels[0].clone();
            self.channels.push(mono);
        }
    }

    /// Average a stereo block down to mono in place (spec §4.7 stereo-to-mono).
    pub fn to_mono(&mut self) {
        if self.channels.len() == 2 {
            let (l, r) = (self.channels[0].clone(), self.channels.remove(1));
            self.channels[0] = l.iter().zip(r.iter()).map(|(a, b)| 0.5 * (a + b)).collect();
        }
    }

    /// Count samples whose absolute value reaches or exceeds full scale (spec §4.14).
    pub fn count_clipped(&self) -> usize {
        self.channels
            .iter()
            .flat_map(|c| c.iter())
            .filter(|s| s.abs() >= 1.0)
            .count()
    }

    pub fn add_assign(&mut self, other: &AudioBlock) {
        for (a, b) in self.channels.iter_mut().zip(other.channels.iter()) {
            for (x, y) in a.iter_mut().zip(b.iter()) {
                *x += y;
            }
        }
    }

    pub fn scale(&mut self, gain: f32) {
        for c in &mut self.channels {
            for x in c.iter_mut() {
                *x *= gain;
            }
        }
    }
}

/// Common lifecycle for every gain stage, filter, dynamics, delay, and
/// reverb implementation (spec §4.5). Object-safe so chains can hold
/// `Box<dyn Processor>`.
pub trait Processor: std::fmt::Debug {
    fn name(&self) -> &str;
    fn parameters(&self) -> &ParameterList;
    fn parameters_mut(&mut self) -> &mut ParameterList;

    /// Process one block in place. Implementations own their filter/delay
    /// state and must be sample-accurate across block boundaries.
    fn process(&mut self, block: &mut AudioBlock) -> Result<()>;

    /// Recompute any derived/cached state after a parameter changed.
    /// `name` is `None` after a bulk update (e.g. `randomize`).
    fn update(&mut self, name: Option<&str>);

    /// Validate and store a new parameter value, then call `update`.
    ///
    /// This is the single synchronization point that stands in for the
    /// parameter-to-processor back-reference: rather than a `Parameter`
    /// holding a callback into its owning `Processor` (which would need a
    /// cycle or unsafe aliasing), callers always set values through the
    /// owning processor, which can safely borrow both sides.
    fn set(&mut self, name: &str, value: ParameterValue) -> Result<()> {
        self.parameters_mut()
            .get_mut(name)
            .ok_or_else(|| MixError::MissingProcessor(name.to_string()))?
            .set(value)?;
        self.update(Some(name));
        Ok(())
    }

    /// Restore every parameter to its default and resync derived state.
    fn reset(&mut self) {
        self.parameters_mut().reset();
        self.update(None);
    }

    /// Randomize every randomizable parameter and resync derived state.
    fn randomize(&mut self, rng: &mut dyn RngCore) {
        self.parameters_mut().randomize(RandomDistribution::Default, rng);
        self.update(None);
    }

    /// Current parameter values, keyed by name (spec §4.5).
    fn serialize(&self) -> Map<String, Json> {
        self.parameters().serialize(false, false)
    }

    /// Restore parameter values from a previously `serialize`d document and
    /// resync derived state (spec §4.5, §6 document round-trip).
    fn apply(&mut self, doc: &Map<String, Json>) -> Result<()> {
        self.parameters_mut().apply(doc)?;
        self.update(None);
        Ok(())
    }

    /// Current parameter values as a flat normalized vector (spec §4.5).
    fn vectorize(&self) -> Vec<f32> {
        self.parameters().vectorize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stereo_roundtrip_averages() {
        let mut b = AudioBlock::mono(vec![1.0, -1.0, 0.5]);
        b.to_stereo();
        assert_eq!(b.channels.len(), 2);
        b.to_mono();
        assert_eq!(b.channels[0], vec![1.0, -1.0, 0.5]);
    }

    #[test]
    fn count_clipped_counts_full_scale_samples() {
        let b = AudioBlock::stereo(vec![1.0, 0.2], vec![-1.5, 0.1]);
        assert_eq!(b.count_clipped(), 2);
    }
}
