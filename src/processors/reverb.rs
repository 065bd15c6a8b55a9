//! Freeverb-style algorithmic reverb: parallel combs feeding series allpasses,
//! one network per stereo channel, decorrelated by a fixed sample offset
//! (spec §4.10).

use crate::components::{Allpass, Comb};
use crate::error::Result;
use crate::parameter::Parameter;
use crate::parameter_list::ParameterList;
use crate::processor::{AudioBlock, Processor};

/// Freeverb's stereo decorrelation offset, in samples at 44.1kHz; scaled by
/// `sample_rate / 44100` for other rates.
const STEREO_SPREAD: usize = 23;

/// Comb delay lengths (samples at 44.1kHz) for the left channel; the right
/// channel uses the same lengths plus `STEREO_SPREAD`.
const COMB_LENGTHS: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];

/// Allpass delay lengths (samples at 44.1kHz) for the left channel.
///
/// The last entry is 225 on the left channel; the right channel's last
/// allpass is built from a different base length, 255, plus the spread
/// (278 total, not 225 + spread = 248) — an asymmetry inherited from the
/// reference Freeverb implementation and preserved here deliberately
/// (see DESIGN.md, Open Question ii).
const ALLPASS_LENGTHS: [usize; 4] = [556, 441, 341, 225];
const RIGHT_LAST_ALLPASS_BASE: usize = 255;

const SCALE_GAIN: f32 = 0.2;

struct ChannelState {
    combs: Vec<Comb>,
    allpasses: Vec<Allpass>,
}

impl ChannelState {
    fn new(sample_rate: f32, spread: usize) -> Self {
        let scale = sample_rate / 44_100.0;
        let combs = COMB_LENGTHS
            .iter()
            .map(|&len| Comb::new((((len + spread) as f32) * scale).round() as usize))
            .collect();
        let mut allpasses: Vec<Allpass> = ALLPASS_LENGTHS[..3]
            .iter()
            .map(|&len| Allpass::new((((len + spread) as f32) * scale).round() as usize))
            .collect();
        let last_len = if spread == 0 { ALLPASS_LENGTHS[3] } else { RIGHT_LAST_ALLPASS_BASE + spread };
        allpasses.push(Allpass::new(((last_len as f32) * scale).round() as usize));
        Self { combs, allpasses }
    }

    fn tick(&mut self, input: f32) -> f32 {
        let comb_in = input * SCALE_GAIN;
        let mut out = 0.0;
        for comb in &mut self.combs {
            out += comb.tick(comb_in);
        }
        for allpass in &mut self.allpasses {
            out = allpass.tick(out);
        }
        out
    }

    fn set_feedback(&mut self, feedback: f32) {
        for comb in &mut self.combs {
            comb.set_feedback(feedback);
        }
        for allpass in &mut self.allpasses {
            allpass.set_feedback(feedback);
        }
    }

    fn set_damping(&mut self, damping: f32) {
        for comb in &mut self.combs {
            comb.set_damping(damping);
        }
    }

    fn reset(&mut self) {
        for comb in &mut self.combs {
            comb.reset();
        }
        for allpass in &mut self.allpasses {
            allpass.reset();
        }
    }
}

impl std::fmt::Debug for ChannelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelState").field("combs", &self.combs.len()).finish()
    }
}

#[derive(Debug)]
pub struct AlgorithmicReverb {
    name: String,
    parameters: ParameterList,
    left: ChannelState,
    right: ChannelState,
    bypass: bool,
    dry_mix: f32,
    wet_mix: f32,
    width: f32,
}

impl AlgorithmicReverb {
    pub fn new(name: impl Into<String>, sample_rate: f32) -> Result<Self> {
        let mut parameters = ParameterList::new();
        parameters.add(Parameter::boolean("bypass", false))?;
        parameters.add(Parameter::float("room_size", 0.5, 0.05, 0.85, "")?)?;
        parameters.add(Parameter::float("damping", 0.1, 0.0, 1.0, "")?)?;
        parameters.add(Parameter::float("dry_mix", 0.9, 0.0, 1.0, "")?)?;
        parameters.add(Parameter::float("wet_mix", 0.1, 0.0, 1.0, "")?)?;
        parameters.add(Parameter::float("width", 0.7, 0.0, 1.0, "")?)?;
        let mut r = Self {
            name: name.into(),
            parameters,
            left: ChannelState::new(sample_rate, 0),
            right: ChannelState::new(sample_rate, STEREO_SPREAD),
            bypass: false,
            dry_mix: 0.9,
            wet_mix: 0.1,
            width: 0.7,
        };
        r.update(None);
        Ok(r)
    }
}

impl Processor for AlgorithmicReverb {
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
        let len = block.block_size();
        let wet1 = self.wet_mix * (self.width / 2.0 + 0.5);
        let wet2 = self.wet_mix * ((1.0 - self.width) / 2.0);
        for i in 0..len {
            let dry_l = block.channels[0][i];
            let dry_r = block.channels[1][i];
            let wet_l = self.left.tick(dry_l);
            let wet_r = self.right.tick(dry_r);
            block.channels[0][i] = wet1 * wet_l + wet2 * wet_r + self.dry_mix * dry_l;
            block.channels[1][i] = wet1 * wet_r + wet2 * wet_l + self.dry_mix * dry_r;
        }
        Ok(())
    }

    fn update(&mut self, _name: Option<&str>) {
        self.bypass = self.parameters.get("bypass").unwrap().get_bool();
        let room_size = self.parameters.get("room_size").unwrap().get_f32();
        let damping = self.parameters.get("damping").unwrap().get_f32();
        self.dry_mix = self.parameters.get("dry_mix").unwrap().get_f32();
        self.wet_mix = self.parameters.get("wet_mix").unwrap().get_f32();
        self.width = self.parameters.get("width").unwrap().get_f32();
        self.left.set_feedback(room_size);
        self.right.set_feedback(room_size);
        self.left.set_damping(damping);
        self.right.set_damping(damping);
    }

    fn reset(&mut self) {
        self.parameters.reset();
        self.left.reset();
        self.right.reset();
        self.update(None);
    }
}
