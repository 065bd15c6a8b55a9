//! A single mono input channel: pre, core, and post processing chains (spec §4.12).

use crate::error::Result;
use crate::processor::AudioBlock;
use crate::processor_list::ProcessorList;
use crate::processors::{Compressor, ConvolutionalReverb, Delay, Equaliser, Gain, ImpulseSource, Panner, PolarityInverter};
use rand::RngCore;
use serde_json::{Map, Value as Json};
use std::path::Path;

/// How `Channel::vectorize` encodes the core chain's processing order
/// when projecting onto a caller-supplied `static_order` (spec §4.12).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OrderEncoding {
    /// Emit the processor's current position as a single normalized scalar.
    Copy,
    /// Emit the processor's current position as a one-hot vector over the
    /// `static_order` slots.
    OneHot,
}

/// One channel strip: pre-gain/polarity, then the randomizable core effects
/// chain, then post-gain/pan (spec §4.12).
#[derive(Debug)]
pub struct Channel {
    pub name: String,
    pub pre_processors: ProcessorList,
    pub core_processors: ProcessorList,
    pub post_processors: ProcessorList,
}

impl Channel {
    pub fn new(
        name: impl Into<String>,
        sample_rate: f32,
        block_size: usize,
        impulse_source: ImpulseSource,
    ) -> Result<Self> {
        let mut pre_processors = ProcessorList::new();
        pre_processors.push(Box::new(Gain::new("pre-gain")?))?;
        pre_processors.push(Box::new(PolarityInverter::new("polarity-inverter")?))?;

        let mut core_processors = ProcessorList::new();
        core_processors.push(Box::new(Equaliser::new("eq", sample_rate)?))?;
        core_processors.push(Box::new(Compressor::new("compressor", sample_rate)?))?;
        core_processors.push(Box::new(ConvolutionalReverb::new(
            "reverb",
            block_size,
            sample_rate.round() as u32,
            impulse_source,
        )?))?;
        core_processors.push(Box::new(Delay::new("delay", sample_rate)?))?;

        let mut post_processors = ProcessorList::new();
        post_processors.push(Box::new(Gain::new("post-gain")?))?;
        post_processors.push(Box::new(Panner::new("panner")?))?;

        Ok(Self { name: name.into(), pre_processors, core_processors, post_processors })
    }

    /// Run a mono block through pre, core, then post; the block becomes
    /// stereo by the time `Panner` in the post chain runs.
    pub fn process(&mut self, block: &mut AudioBlock) -> Result<()> {
        self.pre_processors.process(block)?;
        self.core_processors.process(block)?;
        self.post_processors.process(block)?;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.pre_processors.reset();
        self.core_processors.reset();
        self.post_processors.reset();
    }

    /// Randomize every chain; `shuffle` additionally reorders the core
    /// chain, matching how the effects order is treated as a free
    /// parameter while pre/post order (gain before polarity, gain before
    /// pan) stays fixed (spec §4.12).
    pub fn randomize(&mut self, shuffle: bool, rng: &mut dyn RngCore) {
        self.pre_processors.randomize(rng);
        self.core_processors.randomize(rng);
        self.post_processors.randomize(rng);
        if shuffle {
            self.core_processors.shuffle(rng);
        }
    }

    pub fn serialize(&self) -> Map<String, Json> {
        let mut out = Map::new();
        out.insert("pre_processors".into(), Json::Array(self.pre_processors.serialize()));
        out.insert("core_processors".into(), Json::Array(self.core_processors.serialize()));
        out.insert("post_processors".into(), Json::Array(self.post_processors.serialize()));
        out
    }

    /// Restore this channel's three chains from a previously `serialize`d
    /// document (spec §4.12, §6 document round-trip).
    pub fn apply(&mut self, doc: &Map<String, Json>) -> Result<()> {
        if let Some(pre) = doc.get("pre_processors").and_then(|v| v.as_array()) {
            self.pre_processors.apply(pre)?;
        }
        if let Some(core) = doc.get("core_processors").and_then(|v| v.as_array()) {
            self.core_processors.apply(core)?;
        }
        if let Some(post) = doc.get("post_processors").and_then(|v| v.as_array()) {
            self.post_processors.apply(post)?;
        }
        Ok(())
    }

    /// A flat, learning-friendly numeric encoding of every parameter in
    /// this channel (spec §4.12).
    ///
    /// The pre and post chains always contribute in their fixed natural
    /// order. The core chain, whose processing order is the only thing
    /// `randomize(shuffle=true)` permutes, is handled two ways:
    ///
    /// - `static_order = None`: walk the core chain in its current
    ///   (possibly shuffled) order.
    /// - `static_order = Some(names)`: walk `names` instead, looking each
    ///   processor up by name regardless of its current position. A name
    ///   with no matching processor contributes nothing but an order
    ///   marker (if `include_order`) — there is no canonical parameter
    ///   width to zero-fill for a processor this channel does not have.
    ///
    /// When `include_order` is set, each core processor's parameter vector
    /// is followed by a marker encoding its current position, either a
    /// single normalized scalar (`Copy`) or a one-hot vector over the
    /// relevant slot count (`OneHot`).
    pub fn vectorize(
        &self,
        static_order: Option<&[String]>,
        include_order: bool,
        order_encode_type: OrderEncoding,
    ) -> Vec<f32> {
        let mut v = self.pre_processors.vectorize();
        v.extend(self.core_vectorize(static_order, include_order, order_encode_type));
        v.extend(self.post_processors.vectorize());
        v
    }

    fn core_vectorize(
        &self,
        static_order: Option<&[String]>,
        include_order: bool,
        order_encode_type: OrderEncoding,
    ) -> Vec<f32> {
        let current_order: Vec<&str> = self.core_processors.iter().map(|p| p.name()).collect();
        let mut out = Vec::new();
        match static_order {
            None => {
                for (idx, p) in self.core_processors.iter().enumerate() {
                    out.extend(p.vectorize());
                    if include_order {
                        out.extend(order_marker(Some(idx), current_order.len(), order_encode_type));
                    }
                }
            }
            Some(order) => {
                for name in order {
                    let position = current_order.iter().position(|n| *n == name.as_str());
                    if let Some(p) = self.core_processors.get(name) {
                        out.extend(p.vectorize());
                    }
                    if include_order {
                        out.extend(order_marker(position, order.len(), order_encode_type));
                    }
                }
            }
        }
        out
    }

    /// Write this channel's vectorized parameters to `path` as a JSON array
    /// (spec §4.12, grounded on the reference console's parameter dumps).
    pub fn write_params(&self, path: impl AsRef<Path>) -> Result<()> {
        let vector = self.vectorize(None, false, OrderEncoding::Copy);
        let json = serde_json::to_string_pretty(&vector)
            .map_err(|e| crate::error::MixError::Resource(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| crate::error::MixError::Resource(e.to_string()))
    }
}

fn order_marker(position: Option<usize>, slots: usize, encode: OrderEncoding) -> Vec<f32> {
    match encode {
        OrderEncoding::Copy => {
            let span = (slots.max(2) - 1) as f32;
            vec![position.map(|p| (p as f32 / span) * 2.0 - 1.0).unwrap_or(-1.0)]
        }
        OrderEncoding::OneHot => {
            let mut v = vec![0.0; slots];
            if let Some(p) = position {
                if p < slots {
                    v[p] = 1.0;
                }
            }
            v
        }
    }
}
