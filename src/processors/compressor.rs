//! Feed-forward log-domain dynamic range compressor (spec §4.8).

use crate::error::Result;
use crate::math::db2linear;
use crate::parameter::Parameter;
use crate::parameter_list::ParameterList;
use crate::processor::{AudioBlock, Processor};

const NEAR_ZERO: f32 = 1e-6;
const FLOOR_DB: f32 = -120.0;

#[derive(Debug)]
pub struct Compressor {
    name: String,
    parameters: ParameterList,
    sample_rate: f32,
    bypass: bool,
    threshold: f32,
    ratio: f32,
    makeup_gain: f32,
    attack_coeff: f32,
    release_coeff: f32,
    /// Smoothed gain reduction (dB) carried across samples and blocks.
    y_prev: f32,
}

impl Compressor {
    pub fn new(name: impl Into<String>, sample_rate: f32) -> Result<Self> {
        let mut parameters = ParameterList::new();
        parameters.add(Parameter::boolean("bypass", false))?;
        parameters.add(Parameter::float_normal(
            "threshold", 0.0, -80.0, 0.0, "dB", -6.0, 2.0,
        )?)?;
        parameters.add(Parameter::float("attack_time", 10.0, 0.1, 500.0, "ms")?)?;
        parameters.add(Parameter::float("release_time", 100.0, 1.0, 4000.0, "ms")?)?;
        parameters.add(Parameter::float("ratio", 2.0, 1.0, 20.0, ":1")?)?;
        parameters.add(Parameter::float("makeup_gain", 0.0, -12.0, 24.0, "dB")?)?;
        let mut c = Self {
            name: name.into(),
            parameters,
            sample_rate,
            bypass: false,
            threshold: 0.0,
            ratio: 2.0,
            makeup_gain: 0.0,
            attack_coeff: 0.0,
            release_coeff: 0.0,
            y_prev: 0.0,
        };
        c.update(None);
        Ok(c)
    }

    fn time_coeff(sample_rate: f32, time_ms: f32) -> f32 {
        (-1.0 / (0.001 * sample_rate * time_ms)).exp()
    }
}

impl Processor for Compressor {
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
        if self.bypass {
            return Ok(());
        }
        let len = block.block_size();
        // Side-chain detector: mono downmix of a stereo block, otherwise the
        // signal itself (spec §4.8).
        let side_chain: Vec<f32> = if block.num_channels() == 2 {
            (0..len).map(|i| 0.5 * (block.channels[0][i] + block.channels[1][i])).collect()
        } else {
            block.channels[0].clone()
        };

        for i in 0..len {
            let side = side_chain[i];
            let x_g = if side.abs() < NEAR_ZERO {
                FLOOR_DB
            } else {
                20.0 * side.abs().log10()
            };
            let y_g = if x_g > self.threshold {
                self.threshold + (x_g - self.threshold) / self.ratio
            } else {
                x_g
            };
            let x_l = x_g - y_g;
            let coeff = if x_l > self.y_prev { self.attack_coeff } else { self.release_coeff };
            let y_l = coeff * self.y_prev + (1.0 - coeff) * x_l;
            self.y_prev = y_l;
            let gain_lin = db2linear(self.makeup_gain - y_l);
            for channel in &mut block.channels {
                channel[i] *= gain_lin;
            }
        }
        Ok(())
    }

    fn update(&mut self, _name: Option<&str>) {
        self.bypass = self.parameters.get("bypass").unwrap().get_bool();
        self.threshold = self.parameters.get("threshold").unwrap().get_f32();
        self.ratio = self.parameters.get("ratio").unwrap().get_f32();
        self.makeup_gain = self.parameters.get("makeup_gain").unwrap().get_f32();
        let attack_ms = self.parameters.get("attack_time").unwrap().get_f32();
        let release_ms = self.parameters.get("release_time").unwrap().get_f32();
        self.attack_coeff = Self::time_coeff(self.sample_rate, attack_ms);
        self.release_coeff = Self::time_coeff(self.sample_rate, release_ms);
    }

    fn reset(&mut self) {
        self.parameters.reset();
        self.y_prev = 0.0;
        self.update(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::ParameterValue;

    #[test]
    fn signal_below_threshold_passes_near_unity() {
        let mut c = Compressor::new("compressor", 48_000.0).unwrap();
        c.set("threshold", ParameterValue::Float(-6.0)).unwrap();
        let mut block = AudioBlock::mono(vec![0.01; 256]);
        c.process(&mut block).unwrap();
        let last = *block.channels[0].last().unwrap();
        assert!((last - 0.01).abs() < 0.001);
    }

    #[test]
    fn loud_signal_gets_gain_reduced() {
        let mut c = Compressor::new("compressor", 48_000.0).unwrap();
        c.set("threshold", ParameterValue::Float(-20.0)).unwrap();
        c.set("ratio", ParameterValue::Float(8.0)).unwrap();
        let mut block = AudioBlock::mono(vec![0.9; 2048]);
        c.process(&mut block).unwrap();
        let last = *block.channels[0].last().unwrap();
        assert!(last < 0.9);
    }

    #[test]
    fn unity_ratio_at_zero_threshold_is_identity() {
        let mut c = Compressor::new("compressor", 48_000.0).unwrap();
        c.set("threshold", ParameterValue::Float(0.0)).unwrap();
        c.set("ratio", ParameterValue::Float(1.0)).unwrap();
        c.set("makeup_gain", ParameterValue::Float(0.0)).unwrap();
        let input = vec![0.3, -0.5, 0.9, -0.9, 0.1];
        let mut block = AudioBlock::mono(input.clone());
        c.process(&mut block).unwrap();
        for (a, b) in block.channels[0].iter().zip(input.iter()) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn stereo_side_chain_applies_uniform_gain_to_both_channels() {
        let mut c = Compressor::new("compressor", 48_000.0).unwrap();
        c.set("threshold", ParameterValue::Float(-20.0)).unwrap();
        c.set("ratio", ParameterValue::Float(4.0)).unwrap();
        // Asymmetric L/R content; the detector sees their average, and the
        // resulting gain reduction is applied identically to both.
        let mut block = AudioBlock::stereo(vec![0.9; 64], vec![0.1; 64]);
        c.process(&mut block).unwrap();
        let ratio_l = block.channels[0][63] / 0.9;
        let ratio_r = block.channels[1][63] / 0.1;
        assert!((ratio_l - ratio_r).abs() < 1e-5);
    }

    #[test]
    fn bypass_is_identity() {
        let mut c = Compressor::new("compressor", 48_000.0).unwrap();
        c.set("bypass", ParameterValue::Bool(true)).unwrap();
        c.set("threshold", ParameterValue::Float(-40.0)).unwrap();
        c.set("ratio", ParameterValue::Float(10.0)).unwrap();
        let input = vec![0.95; 32];
        let mut block = AudioBlock::mono(input.clone());
        c.process(&mut block).unwrap();
        assert_eq!(block.channels[0], input);
    }
}
