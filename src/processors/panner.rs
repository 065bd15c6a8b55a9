//! Mono-to-stereo panner with three selectable pan laws (spec §4.8).

use crate::error::Result;
use crate::parameter::Parameter;
use crate::parameter_list::ParameterList;
use crate::processor::{AudioBlock, Processor};

const PAN_LAWS: &[&str] = &["linear", "constant_power", "-4.5dB"];

#[derive(Debug)]
pub struct Panner {
    name: String,
    parameters: ParameterList,
    left_gain: f32,
    right_gain: f32,
}

impl Panner {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let mut parameters = ParameterList::new();
        parameters.add(Parameter::float("pan", 0.5, 0.0, 1.0, "")?)?;
        parameters.add(Parameter::string(
            "pan_law",
            "-4.5dB",
            PAN_LAWS.iter().map(|s| s.to_string()).collect(),
        )?)?;
        let mut p = Self { name: name.into(), parameters, left_gain: 1.0, right_gain: 1.0 };
        p.update(None);
        Ok(p)
    }

    fn gains(pan: f32, law: &str) -> (f32, f32) {
        match law {
            "linear" => (1.0 - pan, pan),
            "-4.5dB" => (
                ((1.0 - pan) * (crate::math::PI / 2.0 * pan).cos()).sqrt(),
                (pan * (crate::math::PI / 2.0 * pan).sin()).sqrt(),
            ),
            _ => (
                (crate::math::PI / 2.0 * pan).cos(),
                (crate::math::PI / 2.0 * pan).sin(),
            ),
        }
    }
}

impl Processor for Panner {
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
        for (idx, gain) in [self.left_gain, self.right_gain].into_iter().enumerate() {
            for x in block.channels[idx].iter_mut() {
                *x *= gain;
            }
        }
        Ok(())
    }

    fn update(&mut self, _name: Option<&str>) {
        let pan = self.parameters.get("pan").unwrap().get_f32();
        let law = self.parameters.get("pan_law").unwrap().get_str().to_string();
        let (l, r) = Self::gains(pan, &law);
        self.left_gain = l;
        self.right_gain = r;
    }
}
