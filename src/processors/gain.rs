//! Static gain stage, used for both the pre- and post-gain slots (spec §4.4).

use crate::error::Result;
use crate::math::db2linear;
use crate::parameter::Parameter;
use crate::parameter_list::ParameterList;
use crate::processor::{AudioBlock, Processor};

const MIN_GAIN_DB: f32 = -80.0;
const MAX_GAIN_DB: f32 = 24.0;
const DEFAULT_SIGMA: f32 = 4.0;

#[derive(Debug)]
pub struct Gain {
    name: String,
    parameters: ParameterList,
    bypass: bool,
    linear: f32,
}

impl Gain {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let mut parameters = ParameterList::new();
        parameters.add(Parameter::boolean("bypass", false))?;
        parameters.add(Parameter::float_normal(
            "gain",
            0.0,
            MIN_GAIN_DB,
            MAX_GAIN_DB,
            "dB",
            0.0,
            DEFAULT_SIGMA,
        )?)?;
        Ok(Self { name: name.into(), parameters, bypass: false, linear: 1.0 })
    }
}

impl Processor for Gain {
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
        if !self.bypass {
            block.scale(self.linear);
        }
        Ok(())
    }

    fn update(&mut self, _name: Option<&str>) {
        self.bypass = self.parameters.get("bypass").unwrap().get_bool();
        self.linear = db2linear(self.parameters.get("gain").unwrap().get_f32());
    }
}
