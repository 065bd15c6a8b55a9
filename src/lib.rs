//! Headless, block-based multitrack mixing console.
//!
//! Channels run mono signals through pre/core/post processing chains; aux
//! and master busses sum channel outputs into stereo. Every parameter is
//! typed, bounded, randomizable, serializable to JSON, and vectorizable to
//! a flat `Vec<f32>` for dataset generation.

pub mod bus;
pub mod channel;
pub mod components;
pub mod config;
pub mod console;
pub mod error;
pub mod ir;
pub mod math;
pub mod multitrack;
pub mod parameter;
pub mod parameter_list;
pub mod processor;
pub mod processor_list;
pub mod processors;
pub mod wave;

pub mod prelude {
    pub use crate::bus::Bus;
    pub use crate::channel::Channel;
    pub use crate::config::ConsoleConfig;
    pub use crate::console::{Console, ProcessedBlock};
    pub use crate::error::{MixError, Result};
    pub use crate::multitrack::Multitrack;
    pub use crate::parameter::{Parameter, ParameterValue};
    pub use crate::parameter_list::ParameterList;
    pub use crate::processor::{AudioBlock, Processor};
    pub use crate::processor_list::ProcessorList;
}
