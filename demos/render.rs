//! Render a multichannel WAV file through a randomized console and write
//! the stereo master bus back out to disk.
//!
//! Usage: `render <input.wav> <output.wav> [seed]`

use anyhow::{Context, Result};
use mixconsole::prelude::*;
use mixconsole::wave;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let input = args.next().context("usage: render <input.wav> <output.wav> [seed] [ir_dir]")?;
    let output = args.next().context("usage: render <input.wav> <output.wav> [seed] [ir_dir]")?;
    let seed: u64 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(0);
    let ir_dir = args.next().map(std::path::PathBuf::from);

    let block_size = 512;
    let multitrack = Multitrack::from_wav(&input, block_size)?;
    let num_channels = multitrack.num_channels();
    let sample_rate = multitrack.sample_rate();

    let config = ConsoleConfig {
        sample_rate: sample_rate as f32,
        block_size,
        num_channels,
        aux_bus_names: vec!["reverb-aux".to_string()],
        seed,
        verbose: true,
        ir_dir,
    };
    let mut console = Console::new(config, multitrack)?;
    console.randomize(true);

    let mut left = Vec::new();
    let mut right = Vec::new();
    while let Some(block) = console.process_block()? {
        left.extend_from_slice(&block.master.channels[0]);
        right.extend_from_slice(&block.master.channels[1]);
    }

    wave::write_wav(&output, &[left, right], sample_rate)?;
    println!("{}", serde_json::to_string_pretty(&console.serialize(None)?)?);
    Ok(())
}
