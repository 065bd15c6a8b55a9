//! Top-level orchestration: channels feed aux busses feed the master bus (spec §4.14).

use crate::bus::Bus;
use crate::channel::Channel;
use crate::config::ConsoleConfig;
use crate::error::{MixError, Result};
use crate::multitrack::Multitrack;
use crate::processor::AudioBlock;
use crate::processors::ImpulseSource;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{Map, Value as Json};
use std::path::Path;

/// One processed block: the stereo master output, the stereo output of
/// each aux bus (in configuration order), and how many master-bus samples
/// reached or exceeded full scale (spec §4.14).
pub struct ProcessedBlock {
    pub master: AudioBlock,
    pub aux: Vec<AudioBlock>,
    pub clipped_samples: usize,
}

pub struct Console {
    config: ConsoleConfig,
    pub channels: Vec<Channel>,
    pub aux_busses: Vec<Bus>,
    pub master: Bus,
    multitrack: Multitrack,
    rng: StdRng,
}

impl Console {
    /// Builds every channel's convolutional reverb from `config.ir_dir` when
    /// set (each channel defaults to the `sm-room` impulse and can be
    /// re-pointed via its `reverb.type` parameter), or from an in-memory
    /// unit impulse (a no-op reverb) when `ir_dir` is `None` (spec §4.11, §6).
    pub fn new(config: ConsoleConfig, multitrack: Multitrack) -> Result<Self> {
        if !config.block_size.is_power_of_two() {
            return Err(MixError::InvalidConstruction(format!(
                "block_size {} is not a power of two",
                config.block_size
            )));
        }
        if multitrack.num_channels() != config.num_channels {
            return Err(MixError::InvalidConstruction(format!(
                "multitrack has {} channels but config specifies {}",
                multitrack.num_channels(),
                config.num_channels
            )));
        }

        let mut channels = Vec::with_capacity(config.num_channels);
        for i in 0..config.num_channels {
            let source = match &config.ir_dir {
                Some(dir) => ImpulseSource::Directory(dir.clone()),
                None => ImpulseSource::Memory(vec![vec![1.0]]),
            };
            channels.push(Channel::new(format!("channel-{i}"), config.sample_rate, config.block_size, source)?);
        }

        let mut aux_busses = Vec::with_capacity(config.aux_bus_names.len());
        for name in &config.aux_bus_names {
            aux_busses.push(Bus::new(name.clone(), config.sample_rate, config.block_size, config.num_channels, false)?);
        }

        let master_inputs = config.num_channels + aux_busses.len();
        let master = Bus::new("master", config.sample_rate, config.block_size, master_inputs, true)?;

        let rng = StdRng::seed_from_u64(config.seed);

        Ok(Self { config, channels, aux_busses, master, multitrack, rng })
    }

    /// Process the next block, or `None` once the source is exhausted.
    pub fn process_block(&mut self) -> Result<Option<ProcessedBlock>> {
        let Some(mut channel_blocks) = self.multitrack.next_block() else {
            return Ok(None);
        };

        let mut channel_outputs = Vec::with_capacity(self.channels.len());
        for (channel, block) in self.channels.iter_mut().zip(channel_blocks.iter_mut()) {
            channel.process(block)?;
            channel_outputs.push(block.clone());
        }

        let mut aux_outputs = Vec::with_capacity(self.aux_busses.len());
        for bus in &mut self.aux_busses {
            aux_outputs.push(bus.process(&channel_outputs)?);
        }

        let mut master_inputs = channel_outputs;
        master_inputs.extend(aux_outputs.iter().cloned());
        let master_out = self.master.process(&master_inputs)?;

        let clipped_samples = master_out.count_clipped();
        if self.config.verbose && clipped_samples > 0 {
            tracing::warn!(clipped_samples, "master bus clipped");
        }

        Ok(Some(ProcessedBlock { master: master_out, aux: aux_outputs, clipped_samples }))
    }

    pub fn reset(&mut self) {
        for channel in &mut self.channels {
            channel.reset();
        }
        for bus in &mut self.aux_busses {
            bus.reset();
        }
        self.master.reset();
        self.multitrack.reset();
    }

    /// Randomize every channel and bus using the console's seeded RNG
    /// (spec §4.3, §4.14). Never reaches for a process-global RNG, so two
    /// consoles built with the same seed and config produce identical
    /// randomizations.
    pub fn randomize(&mut self, shuffle_core: bool) {
        for channel in &mut self.channels {
            channel.randomize(shuffle_core, &mut self.rng);
        }
        for bus in &mut self.aux_busses {
            bus.randomize(&mut self.rng);
        }
        self.master.randomize(&mut self.rng);
    }

    fn document(&self) -> Map<String, Json> {
        let mut out = Map::new();
        let channels: Vec<Json> = self
            .channels
            .iter()
            .map(|c| {
                let mut wrapper = Map::new();
                wrapper.insert(c.name.clone(), Json::Object(c.serialize()));
                Json::Object(wrapper)
            })
            .collect();
        out.insert("channels".into(), Json::Array(channels));
        let busses: Vec<Json> = self
            .aux_busses
            .iter()
            .map(|b| {
                let mut wrapper = Map::new();
                wrapper.insert(b.name.clone(), Json::Object(b.serialize()));
                Json::Object(wrapper)
            })
            .collect();
        out.insert("busses".into(), Json::Array(busses));
        out.insert("master".into(), Json::Object(self.master.serialize()));
        out
    }

    /// Restore every channel and bus from a document previously produced by
    /// `serialize` (spec §4.14, §6: "apply the serialized document ...
    /// bit-identical outputs"). Channels and busses are matched by name, not
    /// by array position, so the document need not list them in the same
    /// order as this console's own `channels`/`aux_busses` vectors.
    pub fn apply_document(&mut self, document: &Map<String, Json>) -> Result<()> {
        if let Some(channels) = document.get("channels").and_then(|v| v.as_array()) {
            for entry in channels {
                let wrapper = entry.as_object().ok_or_else(|| {
                    MixError::InvalidConstruction("channel document entry is not an object".into())
                })?;
                let (name, doc) = wrapper.iter().next().ok_or_else(|| {
                    MixError::InvalidConstruction("empty channel document entry".into())
                })?;
                let doc = doc.as_object().ok_or_else(|| {
                    MixError::InvalidConstruction(format!("channel '{name}' document entry is not an object"))
                })?;
                let channel = self
                    .channels
                    .iter_mut()
                    .find(|c| &c.name == name)
                    .ok_or_else(|| MixError::MissingProcessor(name.clone()))?;
                channel.apply(doc)?;
            }
        }
        if let Some(busses) = document.get("busses").and_then(|v| v.as_array()) {
            for entry in busses {
                let wrapper = entry.as_object().ok_or_else(|| {
                    MixError::InvalidConstruction("bus document entry is not an object".into())
                })?;
                let (name, doc) = wrapper.iter().next().ok_or_else(|| {
                    MixError::InvalidConstruction("empty bus document entry".into())
                })?;
                let doc = doc.as_object().ok_or_else(|| {
                    MixError::InvalidConstruction(format!("bus '{name}' document entry is not an object"))
                })?;
                let bus = self
                    .aux_busses
                    .iter_mut()
                    .find(|b| &b.name == name)
                    .ok_or_else(|| MixError::MissingProcessor(name.clone()))?;
                bus.apply(doc)?;
            }
        }
        if let Some(master) = document.get("master").and_then(|v| v.as_object()) {
            self.master.apply(master)?;
        }
        Ok(())
    }

    /// Return the nested parameter document; if `path` is given, also write
    /// it there as JSON (spec §4.14).
    pub fn serialize(&self, path: Option<&Path>) -> Result<Map<String, Json>> {
        let document = self.document();
        if let Some(path) = path {
            let text = serde_json::to_string_pretty(&document)
                .map_err(|e| MixError::Resource(e.to_string()))?;
            std::fs::write(path, text).map_err(|e| MixError::Resource(e.to_string()))?;
        }
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_console(num_channels: usize, block_size: usize, num_samples: usize) -> Console {
        let config = ConsoleConfig {
            sample_rate: 48_000.0,
            block_size,
            num_channels,
            aux_bus_names: vec!["reverb-aux".into()],
            seed: 42,
            verbose: false,
            ir_dir: None,
        };
        let channels = (0..num_channels).map(|_| vec![0.1_f32; num_samples]).collect();
        let multitrack = Multitrack::from_channels(channels, 48_000, block_size).unwrap();
        Console::new(config, multitrack).unwrap()
    }

    #[test]
    fn process_block_yields_stereo_master() {
        let mut console = test_console(2, 16, 32);
        let block = console.process_block().unwrap().unwrap();
        assert_eq!(block.master.num_channels(), 2);
        assert_eq!(block.aux.len(), 1);
    }

    #[test]
    fn exhausts_after_num_blocks() {
        let mut console = test_console(1, 8, 16);
        assert!(console.process_block().unwrap().is_some());
        assert!(console.process_block().unwrap().is_some());
        assert!(console.process_block().unwrap().is_none());
    }

    #[test]
    fn randomize_is_deterministic_given_same_seed() {
        let mut a = test_console(1, 8, 16);
        let mut b = test_console(1, 8, 16);
        a.randomize(true);
        b.randomize(true);
        assert_eq!(
            a.channels[0].vectorize(None, false, crate::channel::OrderEncoding::Copy),
            b.channels[0].vectorize(None, false, crate::channel::OrderEncoding::Copy)
        );
    }

    #[test]
    fn apply_document_reproduces_randomized_vectorization() {
        let mut source = test_console(1, 8, 16);
        source.randomize(true);
        let document = source.serialize(None).unwrap();

        let mut target = test_console(1, 8, 16);
        target.apply_document(&document).unwrap();

        assert_eq!(
            source.channels[0].vectorize(None, false, crate::channel::OrderEncoding::Copy),
            target.channels[0].vectorize(None, false, crate::channel::OrderEncoding::Copy)
        );
    }

    #[test]
    fn non_power_of_two_block_size_is_rejected() {
        let config = ConsoleConfig {
            sample_rate: 48_000.0,
            block_size: 100,
            num_channels: 1,
            aux_bus_names: vec![],
            seed: 0,
            verbose: false,
            ir_dir: None,
        };
        let multitrack = Multitrack::from_channels(vec![vec![0.0; 16]], 48_000, 100).unwrap();
        assert!(Console::new(config, multitrack).is_err());
    }

    #[test]
    fn serialize_to_path_writes_json() {
        let console = test_console(1, 8, 16);
        let path = std::env::temp_dir().join("mixconsole_console_serialize_test.json");
        let doc = console.serialize(Some(&path)).unwrap();
        assert!(doc["channels"].is_array());
        assert_eq!(doc["channels"][0]["channel-0"]["pre_processors"][0]["pre-gain"]["order"], 0);
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("channels"));
        std::fs::remove_file(&path).ok();
    }
}
