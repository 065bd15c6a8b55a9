//! Impulse response loading for [`crate::processors::ConvolutionalReverb`].

use crate::error::{MixError, Result};
use crate::wave;
use std::path::{Path, PathBuf};

/// The closed set of room types a [`crate::processors::ConvolutionalReverb`]
/// can be pointed at, and the filename each maps to inside an IR directory
/// (spec §6).
pub const IR_TYPES: [&str; 5] = ["sm-room", "md-room", "lg-room", "hall", "plate"];

fn filename_for(ir_type: &str) -> Option<&'static str> {
    match ir_type {
        "sm-room" => Some("small_room.wav"),
        "md-room" => Some("medium_room.wav"),
        "lg-room" => Some("large_room.wav"),
        "hall" => Some("hall.wav"),
        "plate" => Some("plate.wav"),
        _ => None,
    }
}

/// A loaded impulse response: one buffer per channel, plus the sample rate
/// it was recorded at.
pub struct Impulse {
    pub channels: Vec<Vec<f32>>,
    pub sample_rate: u32,
}

impl Impulse {
    /// A single-sample unit impulse, i.e. a convolutional reverb that leaves
    /// its input unchanged (mono, broadcast to stereo by the caller).
    pub fn unit(sample_rate: u32) -> Self {
        Self { channels: vec![vec![1.0]], sample_rate }
    }
}

/// Load `ir_type`'s WAV file from `dir`, requiring its sample rate equal
/// `expected_sample_rate` (spec §4.11, §6).
pub fn load_from_dir(dir: impl AsRef<Path>, ir_type: &str, expected_sample_rate: u32) -> Result<Impulse> {
    let filename = filename_for(ir_type)
        .ok_or_else(|| MixError::InvalidParameter {
            name: "type".to_string(),
            value: ir_type.to_string(),
            reason: format!("must be one of {IR_TYPES:?}"),
        })?;
    let path: PathBuf = dir.as_ref().join(filename);
    let (channels, sample_rate) = wave::read_wav(&path)?;
    if sample_rate != expected_sample_rate {
        return Err(MixError::Resource(format!(
            "impulse '{}' is at {sample_rate}Hz, console expects {expected_sample_rate}Hz",
            path.display()
        )));
    }
    if channels.is_empty() || channels[0].is_empty() {
        return Err(MixError::Resource(format!("impulse '{}' is empty", path.display())));
    }
    Ok(Impulse { channels, sample_rate })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_impulse_is_a_single_sample() {
        let unit = Impulse::unit(48_000);
        assert_eq!(unit.channels, vec![vec![1.0]]);
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(load_from_dir("/nonexistent", "garage", 48_000).is_err());
    }
}
