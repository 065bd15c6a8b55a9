//! Polarity (phase) inversion, a single boolean switch (spec §4.7).

use crate::error::Result;
use crate::parameter::Parameter;
use crate::parameter_list::ParameterList;
use crate::processor::{AudioBlock, Processor};

#[derive(Debug)]
pub struct PolarityInverter {
    name: String,
    parameters: ParameterList,
    invert: bool,
}

impl PolarityInverter {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let mut parameters = ParameterList::new();
        parameters.add(Parameter::boolean("invert", false))?;
        Ok(Self { name: name.into(), parameters, invert: false })
    }
}

impl Processor for PolarityInverter {
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
        if self.invert {
            block.scale(-1.0);
        }
        Ok(())
    }

    fn update(&mut self, _name: Option<&str>) {
        self.invert = self.parameters.get("invert").unwrap().get_bool();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::ParameterValue;

    #[test]
    fn inverts_when_enabled() {
        let mut p = PolarityInverter::new("polarity-inverter").unwrap();
        p.set("invert", ParameterValue::Bool(true)).unwrap();
        let mut block = AudioBlock::mono(vec![0.3, -0.3]);
        p.process(&mut block).unwrap();
        assert_eq!(block.channels[0], vec![-0.3, 0.3]);
    }
}
