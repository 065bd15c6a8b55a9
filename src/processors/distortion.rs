//! Soft/hard clipping distortion. Not wired into the default channel chain,
//! same as in the reference console — available for chains that opt in.

use crate::error::Result;
use crate::math::db2linear;
use crate::parameter::Parameter;
use crate::parameter_list::ParameterList;
use crate::processor::{AudioBlock, Processor};

const MODES: &[&str] = &["soft", "hard"];

#[derive(Debug)]
pub struct Distortion {
    name: String,
    parameters: ParameterList,
}

impl Distortion {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let mut parameters = ParameterList::new();
        parameters.add(Parameter::string(
            "mode",
            "soft",
            MODES.iter().map(|s| s.to_string()).collect(),
        )?)?;
        parameters.add(Parameter::float("drive", 1.0, 1.0, 20.0, "")?)?;
        parameters.add(Parameter::float("threshold", 0.0, -24.0, 0.0, "dB")?)?;
        Ok(Self { name: name.into(), parameters })
    }

    fn soft_clip(x: f32, drive: f32) -> f32 {
        let factor = 1.0 / 3.0;
        let driven = x * drive;
        (driven - factor * driven.powi(3)).clamp(-1.0, 1.0)
    }

    fn hard_clip(x: f32, threshold_linear: f32) -> f32 {
        x.clamp(-threshold_linear, threshold_linear)
    }
}

impl Processor for Distortion {
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
        let mode = self.parameters.get("mode").unwrap().get_str().to_string();
        match mode.as_str() {
            "soft" => {
                let drive = self.parameters.get("drive").unwrap().get_f32();
                for channel in &mut block.channels {
                    for x in channel.iter_mut() {
                        *x = Self::soft_clip(*x, drive);
                    }
                }
            }
            _ => {
                let threshold_db = self.parameters.get("threshold").unwrap().get_f32();
                let threshold_linear = db2linear(threshold_db);
                for channel in &mut block.channels {
                    for x in channel.iter_mut() {
                        *x = Self::hard_clip(*x, threshold_linear);
                    }
                }
            }
        }
        Ok(())
    }

    fn update(&mut self, _name: Option<&str>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::ParameterValue;

    #[test]
    fn hard_clip_limits_to_threshold() {
        let mut d = Distortion::new("distortion").unwrap();
        d.set("mode", ParameterValue::String("hard".into())).unwrap();
        d.set("threshold", ParameterValue::Float(-6.0)).unwrap();
        let mut block = AudioBlock::mono(vec![1.0, -1.0]);
        d.process(&mut block).unwrap();
        let limit = db2linear(-6.0);
        assert!((block.channels[0][0] - limit).abs() < 1e-6);
        assert!((block.channels[0][1] + limit).abs() < 1e-6);
    }
}
