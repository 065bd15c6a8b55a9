//! Auxiliary and master busses: weighted channel sums plus an optional
//! master processing chain (spec §4.13).

use crate::error::{MixError, Result};
use crate::parameter::Parameter;
use crate::parameter_list::ParameterList;
use crate::processor::AudioBlock;
use crate::processor_list::ProcessorList;
use crate::processors::{Compressor, Equaliser};
use rand::RngCore;
use serde_json::{Map, Value as Json};

/// A stereo summing bus. Non-master busses default every send to 0 (an
/// aux the mix engine must explicitly route into); the master bus defaults
/// every send to 1 so every channel reaches it unless told otherwise.
#[derive(Debug)]
pub struct Bus {
    pub name: String,
    sends: ParameterList,
    n_inputs: usize,
    block_size: usize,
    master: bool,
    processors: ProcessorList,
}

impl Bus {
    pub fn new(
        name: impl Into<String>,
        sample_rate: f32,
        block_size: usize,
        n_inputs: usize,
        master: bool,
    ) -> Result<Self> {
        let default_send = if master { 1.0 } else { 0.0 };
        let mut sends = ParameterList::new();
        for i in 0..n_inputs {
            let mut send = Parameter::float(format!("ch{i}-send"), default_send, 0.0, 1.0, "")?;
            if master {
                send = send.not_randomized();
            }
            sends.add(send)?;
        }
        let mut processors = ProcessorList::new();
        if master {
            processors.push(Box::new(Equaliser::new("master-eq", sample_rate)?))?;
            processors.push(Box::new(Compressor::new("master-compressor", sample_rate)?))?;
        }
        Ok(Self { name: name.into(), sends, n_inputs, block_size, master, processors })
    }

    pub fn is_master(&self) -> bool {
        self.master
    }

    pub fn set_send(&mut self, index: usize, value: f32) -> Result<()> {
        let name = format!("ch{index}-send");
        self.sends
            .get_mut(&name)
            .ok_or_else(|| MixError::MissingProcessor(name.clone()))?
            .set(crate::parameter::ParameterValue::Float(value))
    }

    pub fn send(&self, index: usize) -> f32 {
        self.sends.get(&format!("ch{index}-send")).map(|p| p.get_f32()).unwrap_or(0.0)
    }

    /// Sum `inputs` (one stereo block per channel) weighted by this bus's
    /// sends, then run the master chain if this is the master bus.
    pub fn process(&mut self, inputs: &[AudioBlock]) -> Result<AudioBlock> {
        if inputs.len() != self.n_inputs {
            return Err(MixError::InvalidConstruction(format!(
                "bus '{}' expected {} inputs, got {}",
                self.name,
                self.n_inputs,
                inputs.len()
            )));
        }
        let mut mix = AudioBlock::silence(2, self.block_size);
        for (i, input) in inputs.iter().enumerate() {
            let gain = self.send(i);
            if gain == 0.0 {
                continue;
            }
            let mut scaled = input.clone();
            scaled.scale(gain);
            mix.add_assign(&scaled);
        }
        self.processors.process(&mut mix)?;
        Ok(mix)
    }

    pub fn reset(&mut self) {
        self.sends.reset();
        self.processors.reset();
    }

    /// Randomizes the send gains (auxiliary busses only — the master bus's
    /// sends stay fixed at 1.0, per the reference console's
    /// `if not self.master: randomize sends`) and the processor chain.
    pub fn randomize(&mut self, rng: &mut dyn RngCore) {
        if !self.master {
            self.sends.randomize(crate::parameter::RandomDistribution::Default, rng);
        }
        self.processors.randomize(rng);
    }

    pub fn serialize(&self) -> Map<String, Json> {
        let mut out = self.sends.serialize(false, false);
        out.insert("processors".into(), Json::Array(self.processors.serialize()));
        out
    }

    /// Restore send gains and the processor chain from a previously
    /// `serialize`d document (spec §4.13, §6 document round-trip).
    pub fn apply(&mut self, doc: &Map<String, Json>) -> Result<()> {
        self.sends.apply(doc)?;
        if let Some(processors) = doc.get("processors").and_then(|v| v.as_array()) {
            self.processors.apply(processors)?;
        }
        Ok(())
    }
}
