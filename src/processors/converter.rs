//! Explicit channel-count conversion, used where a chain needs to force
//! mono or stereo regardless of what arrives (spec §4.7).

use crate::error::Result;
use crate::parameter::Parameter;
use crate::parameter_list::ParameterList;
use crate::processor::{AudioBlock, Processor};

const MODES: &[&str] = &["mono_to_stereo", "stereo_to_mono"];

#[derive(Debug)]
pub struct Converter {
    name: String,
    parameters: ParameterList,
}

impl Converter {
    pub fn new(name: impl Into<String>, mode: &str) -> Result<Self> {
        let mut parameters = ParameterList::new();
        parameters.add(Parameter::string(
            "mode",
            mode,
            MODES.iter().map(|s| s.to_string()).collect(),
        )?)?;
        Ok(Self { name: name.into(), parameters })
    }
}

impl Processor for Converter {
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
        match self.parameters.get("mode").unwrap().get_str() {
            "mono_to_stereo" => {
                if block.num_channels() == 2 {
                    tracing::warn!(processor = %self.name, "mono_to_stereo on a block that is already stereo");
                } else {
                    block.to_stereo();
                }
            }
            "stereo_to_mono" => {
                if block.num_channels() == 1 {
                    tracing::warn!(processor = %self.name, "stereo_to_mono on a block that is already mono");
                } else {
                    block.to_mono();
                }
            }
            other => {
                tracing::warn!(processor = %self.name, mode = other, "unknown converter mode");
            }
        }
        Ok(())
    }

    fn update(&mut self, _name: Option<&str>) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_mono_to_stereo() {
        let mut c = Converter::new("converter", "mono_to_stereo").unwrap();
        let mut block = AudioBlock::mono(vec![1.0, 2.0]);
        c.process(&mut block).unwrap();
        assert_eq!(block.num_channels(), 2);
    }

    #[test]
    fn redundant_conversion_is_a_noop() {
        let mut c = Converter::new("converter", "stereo_to_mono").unwrap();
        let mut block = AudioBlock::mono(vec![1.0, 2.0]);
        c.process(&mut block).unwrap();
        assert_eq!(block.num_channels(), 1);
    }
}
