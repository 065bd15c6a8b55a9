//! Convolutional reverb: partitioned overlap-add FFT convolution against a
//! room impulse response selected from a closed set (spec §4.11).

use crate::error::{MixError, Result};
use crate::ir::{self, Impulse, IR_TYPES};
use crate::parameter::Parameter;
use crate::parameter_list::ParameterList;
use crate::processor::{AudioBlock, Processor};
use realfft::num_complex::Complex32;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use std::path::PathBuf;
use std::sync::Arc;

/// Scales a raw loaded impulse down to headroom, grounded on the reference
/// console's `1/2^16` normalization but widened per spec §4.11's explicit
/// `1/32768 · 0.125` factor.
const IR_SCALE: f32 = (1.0 / 32_768.0) * 0.125;

/// Where a `ConvolutionalReverb` loads its impulse responses from: a real
/// directory on disk (production), or a fixed in-memory impulse (tests and
/// any caller that already has a buffer, e.g. an offline render tool).
#[derive(Clone, Debug)]
pub enum ImpulseSource {
    Directory(PathBuf),
    Memory(Vec<Vec<f32>>),
}

/// One impulse-response segment, pre-transformed to the frequency domain.
struct Partition {
    spectrum: Vec<Complex32>,
}

/// Convolves each incoming block against every impulse partition and
/// accumulates the (overlapping) results into a running output buffer,
/// the textbook partitioned overlap-add scheme: each partition is the same
/// length as the processing block, so an `N`-sample input block only ever
/// needs one forward FFT per block regardless of impulse length.
struct PartitionedConvolver {
    block_size: usize,
    fft_size: usize,
    forward: Arc<dyn RealToComplex<f32>>,
    inverse: Arc<dyn ComplexToReal<f32>>,
}

impl std::fmt::Debug for PartitionedConvolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartitionedConvolver").field("block_size", &self.block_size).finish()
    }
}

impl PartitionedConvolver {
    fn new(block_size: usize) -> Self {
        let fft_size = (2 * block_size).max(2);
        let mut planner = RealFftPlanner::<f32>::new();
        Self {
            block_size,
            fft_size,
            forward: planner.plan_fft_forward(fft_size),
            inverse: planner.plan_fft_inverse(fft_size),
        }
    }

    fn partition(&self, impulse: &[f32]) -> Vec<Partition> {
        impulse
            .chunks(self.block_size)
            .map(|chunk| {
                let mut time = vec![0.0_f32; self.fft_size];
                time[..chunk.len()].copy_from_slice(chunk);
                let mut spectrum = self.forward.make_output_vec();
                let mut scratch = self.forward.make_scratch_vec();
                self.forward.process_with_scratch(&mut time, &mut spectrum, &mut scratch).ok();
                Partition { spectrum }
            })
            .collect()
    }

    fn forward_spectrum(&self, block: &[f32]) -> Vec<Complex32> {
        let mut time = vec![0.0_f32; self.fft_size];
        time[..block.len()].copy_from_slice(block);
        let mut spectrum = self.forward.make_output_vec();
        let mut scratch = self.forward.make_scratch_vec();
        self.forward.process_with_scratch(&mut time, &mut spectrum, &mut scratch).ok();
        spectrum
    }

    fn inverse_block(&self, spectrum: &mut [Complex32]) -> Vec<f32> {
        let mut time = self.inverse.make_output_vec();
        let mut scratch = self.inverse.make_scratch_vec();
        self.inverse.process_with_scratch(spectrum, &mut time, &mut scratch).ok();
        let norm = 1.0 / self.fft_size as f32;
        time.iter().map(|s| s * norm).collect()
    }
}

/// Per-channel convolution state: partitions of `h` plus the running
/// overlap-add tail.
struct ChannelConvolver {
    partitions: Vec<Partition>,
    overlap: Vec<f32>,
}

impl ChannelConvolver {
    fn new(convolver: &PartitionedConvolver, impulse: &[f32]) -> Self {
        let partitions = convolver.partition(impulse);
        let overlap_len = (partitions.len() + 1) * convolver.block_size;
        Self { partitions, overlap: vec![0.0; overlap_len] }
    }

    fn process(&mut self, convolver: &PartitionedConvolver, block: &mut [f32]) {
        let n = convolver.block_size;
        let input_spectrum = convolver.forward_spectrum(block);
        for (k, partition) in self.partitions.iter().enumerate() {
            let mut product: Vec<Complex32> =
                input_spectrum.iter().zip(partition.spectrum.iter()).map(|(a, b)| a * b).collect();
            let time = convolver.inverse_block(&mut product);
            let offset = k * n;
            for (i, sample) in time.iter().enumerate() {
                self.overlap[offset + i] += sample;
            }
        }
        block.copy_from_slice(&self.overlap[..n]);
        self.overlap.copy_within(n.., 0);
        let tail = self.overlap.len() - n;
        self.overlap[tail..].iter_mut().for_each(|s| *s = 0.0);
    }

    fn reset(&mut self) {
        self.overlap.iter_mut().for_each(|s| *s = 0.0);
    }
}

#[derive(Debug)]
pub struct ConvolutionalReverb {
    name: String,
    parameters: ParameterList,
    block_size: usize,
    sample_rate: u32,
    source: ImpulseSource,
    convolver: PartitionedConvolver,
    channels: Vec<ChannelConvolver>,
    bypass: bool,
    dry_mix: f32,
    wet_mix: f32,
}

impl ConvolutionalReverb {
    pub fn new(name: impl Into<String>, block_size: usize, sample_rate: u32, source: ImpulseSource) -> Result<Self> {
        let mut parameters = ParameterList::new();
        parameters.add(Parameter::boolean("bypass", false))?;
        parameters.add(
            Parameter::string("type", IR_TYPES[0], IR_TYPES.iter().map(|s| s.to_string()).collect())?
                .not_randomized(),
        )?;
        parameters.add(Parameter::float("decay", 1.0, 0.0, 1.0, "")?)?;
        parameters.add(Parameter::float("dry_mix", 0.5, 0.0, 1.0, "")?)?;
        parameters.add(Parameter::float("wet_mix", 0.5, 0.0, 1.0, "")?)?;

        let convolver = PartitionedConvolver::new(block_size);
        let mut reverb = Self {
            name: name.into(),
            parameters,
            block_size,
            sample_rate,
            source,
            convolver,
            channels: Vec::new(),
            bypass: false,
            dry_mix: 0.5,
            wet_mix: 0.5,
        };
        reverb.load_impulse()?;
        reverb.update(None);
        Ok(reverb)
    }

    /// Construct with a fixed in-memory impulse, bypassing the `type`
    /// parameter's directory lookup — used by tests and by callers that
    /// already hold a decoded impulse buffer.
    pub fn with_impulse(name: impl Into<String>, block_size: usize, sample_rate: u32, impulse: Vec<Vec<f32>>) -> Result<Self> {
        Self::new(name, block_size, sample_rate, ImpulseSource::Memory(impulse))
    }

    fn raw_impulse(&self) -> Result<Impulse> {
        match &self.source {
            ImpulseSource::Directory(dir) => {
                let ir_type = self.parameters.get("type").unwrap().get_str();
                ir::load_from_dir(dir, ir_type, self.sample_rate)
            }
            ImpulseSource::Memory(channels) => {
                if channels.is_empty() || channels[0].is_empty() {
                    return Err(MixError::Resource("in-memory impulse is empty".into()));
                }
                Ok(Impulse { channels: channels.clone(), sample_rate: self.sample_rate })
            }
        }
    }

    /// Scale, apply the decay fade, and re-partition the impulse per
    /// channel (spec §4.11).
    fn load_impulse(&mut self) -> Result<()> {
        let mut impulse = self.raw_impulse()?;
        let decay = self.parameters.get("decay").unwrap().get_f32();
        let fade_samples = (0.02 * self.sample_rate as f32).round() as usize;
        for channel in &mut impulse.channels {
            scale_and_fade(channel, decay, fade_samples);
        }
        if impulse.channels.len() == 1 {
            let mono = impulse.channels[0].clone();
            impulse.channels.push(mono);
        }
        self.channels = impulse
            .channels
            .iter()
            .map(|h| ChannelConvolver::new(&self.convolver, h))
            .collect();
        Ok(())
    }
}

/// Scale `h` by [`IR_SCALE`], then fade it to silence starting at
/// `⌊decay·L⌋` over `fade_samples`, truncating everything after the fade
/// (spec §4.11: `g(k) = 10^(−5·(1 − k/flen))`, i.e. 100 dB of attenuation
/// across the fade window).
fn scale_and_fade(h: &mut Vec<f32>, decay: f32, fade_samples: usize) {
    for s in h.iter_mut() {
        *s *= IR_SCALE;
    }
    let len = h.len();
    let start = ((decay * len as f32).floor() as usize).min(len);
    let flen = fade_samples.max(1);
    let end = (start + flen).min(len);
    for (k, sample) in h[start..end].iter_mut().enumerate() {
        let g = 10f32.powf(-5.0 * (1.0 - k as f32 / flen as f32));
        *sample *= g;
    }
    h.truncate(end);
}

impl Processor for ConvolutionalReverb {
    fn name(&self) -> &str {
        &self.name
    }
    fn parameters(&self) -> &ParameterList {
        &self.parameters
    }
    fn parameters_mut(&mut self) -> &mut ParameterList {
        &mut self.parameters
    }

    fn process(&mut self, block: &mut AudioBlock) -> Result<()> {
        block.to_stereo();
        if self.bypass {
            return Ok(());
        }
        let n = block.block_size();
        for (ch_idx, channel) in block.channels.iter_mut().enumerate() {
            let conv = &mut self.channels[ch_idx.min(self.channels.len() - 1)];
            let dry: Vec<f32> = channel.clone();
            conv.process(&self.convolver, channel);
            for i in 0..n {
                channel[i] = self.dry_mix * dry[i] + self.wet_mix * channel[i];
            }
        }
        Ok(())
    }

    /// Reloading the impulse response is only needed when `type` or `decay`
    /// change; other parameters (bypass, mix) are cheap reads at `process`
    /// time (spec §4.11: "On `update(type|decay)`: load impulse...").
    fn update(&mut self, name: Option<&str>) {
        self.bypass = self.parameters.get("bypass").unwrap().get_bool();
        self.dry_mix = self.parameters.get("dry_mix").unwrap().get_f32();
        self.wet_mix = self.parameters.get("wet_mix").unwrap().get_f32();
        if matches!(name, None | Some("type") | Some("decay")) {
            if let Err(e) = self.load_impulse() {
                tracing::warn!(processor = %self.name, error = %e, "failed to (re)load impulse response");
            }
        }
    }

    fn reset(&mut self) {
        self.parameters.reset();
        for conv in &mut self.channels {
            conv.reset();
        }
        self.update(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::ParameterValue;

    fn unit_impulse_reverb(block_size: usize) -> ConvolutionalReverb {
        let impulse = vec![1.0_f32; 1];
        ConvolutionalReverb::with_impulse("reverb", block_size, 48_000, vec![impulse]).unwrap()
    }

    #[test]
    fn dry_only_is_identity() {
        let mut rev = unit_impulse_reverb(8);
        rev.set("dry_mix", ParameterValue::Float(1.0)).unwrap();
        rev.set("wet_mix", ParameterValue::Float(0.0)).unwrap();
        let input = vec![0.2, -0.4, 0.6, 0.1, 0.0, 0.0, 0.0, 0.0];
        let mut block = AudioBlock::mono(input.clone());
        rev.process(&mut block).unwrap();
        for (a, b) in block.channels[0].iter().zip(input.iter()) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn wet_only_with_unit_impulse_equals_scaled_input() {
        let mut rev = unit_impulse_reverb(8);
        rev.set("decay", ParameterValue::Float(1.0)).unwrap();
        rev.set("dry_mix", ParameterValue::Float(0.0)).unwrap();
        rev.set("wet_mix", ParameterValue::Float(1.0)).unwrap();
        let input = vec![0.2, -0.4, 0.6, 0.1, 0.0, 0.0, 0.0, 0.0];
        let mut block = AudioBlock::mono(input.clone());
        rev.process(&mut block).unwrap();
        let expected: Vec<f32> = input.iter().map(|s| s * IR_SCALE).collect();
        for (a, b) in block.channels[0].iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn bypass_still_broadcasts_mono_to_stereo() {
        let mut rev = unit_impulse_reverb(8);
        rev.set("bypass", ParameterValue::Bool(true)).unwrap();
        let mut block = AudioBlock::mono(vec![0.2; 8]);
        rev.process(&mut block).unwrap();
        assert_eq!(block.num_channels(), 2);
        assert_eq!(block.channels[0], block.channels[1]);
    }

    #[test]
    fn empty_in_memory_impulse_is_rejected() {
        assert!(ConvolutionalReverb::with_impulse("reverb", 8, 48_000, vec![vec![]]).is_err());
    }

    #[test]
    fn missing_ir_directory_is_rejected_at_construction() {
        let err = ConvolutionalReverb::new(
            "reverb",
            8,
            48_000,
            ImpulseSource::Directory(PathBuf::from("/nonexistent")),
        );
        assert!(err.is_err());
    }
}
