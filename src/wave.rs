//! Minimal WAV read/write helpers built on `hound` (spec §5, ambient I/O).

use crate::error::{MixError, Result};
use std::path::Path;

/// Read a WAV file and return its samples as `f32` in `[-1, 1]`, one
/// `Vec<f32>` per channel, interleaved channel order preserved.
pub fn read_wav(path: impl AsRef<Path>) -> Result<(Vec<Vec<f32>>, u32)> {
    let mut reader = hound::WavReader::open(path.as_ref())
        .map_err(|e| MixError::Resource(format!("{}: {e}", path.as_ref().display())))?;
    let spec = reader.spec();
    let num_channels = spec.channels as usize;
    let sample_rate = spec.sample_rate;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| MixError::Resource(e.to_string()))?,
        hound::SampleFormat::Int => {
            let max = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| MixError::Resource(e.to_string()))?
        }
    };

    let mut channels = vec![Vec::with_capacity(interleaved.len() / num_channels.max(1)); num_channels];
    for (i, sample) in interleaved.into_iter().enumerate() {
        channels[i % num_channels].push(sample);
    }
    Ok((channels, sample_rate))
}

/// Write interleaved stereo `f32` channels to a 32-bit float WAV file.
pub fn write_wav(path: impl AsRef<Path>, channels: &[Vec<f32>], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: channels.len() as u16,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path.as_ref(), spec)
        .map_err(|e| MixError::Resource(format!("{}: {e}", path.as_ref().display())))?;
    let len = channels.first().map(|c| c.len()).unwrap_or(0);
    for i in 0..len {
        for channel in channels {
            writer
                .write_sample(channel[i])
                .map_err(|e| MixError::Resource(e.to_string()))?;
        }
    }
    writer.finalize().map_err(|e| MixError::Resource(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::temp_dir;

    #[test]
    fn write_then_read_roundtrips() {
        let path = temp_dir().join("mixconsole_wave_roundtrip_test.wav");
        let channels = vec![vec![0.5_f32, -0.5, 0.25], vec![0.1, -0.1, 0.2]];
        write_wav(&path, &channels, 48_000).unwrap();
        let (read_back, sr) = read_wav(&path).unwrap();
        assert_eq!(sr, 48_000);
        assert_eq!(read_back.len(), 2);
        for (a, b) in read_back[0].iter().zip(channels[0].iter()) {
            assert!((a - b).abs() < 1e-4);
        }
        std::fs::remove_file(path).ok();
    }
}
