use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mixconsole::config::ConsoleConfig;
use mixconsole::prelude::*;
use mixconsole::processors::{
    AlgorithmicReverb, Compressor, ConvolutionalReverb, Delay, Equaliser, Gain, ImpulseSource,
};

const BLOCK_SIZE: usize = 512;
const SAMPLE_RATE: f32 = 48_000.0;

fn noise_block(n: usize) -> AudioBlock {
    let mut state: u32 = 0x1234_5678;
    let samples: Vec<f32> = (0..n)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state as f32 / u32::MAX as f32) * 2.0 - 1.0
        })
        .collect();
    AudioBlock::mono(samples)
}

fn gain_bench(block: &mut AudioBlock) {
    let mut gain = Gain::new("gain").unwrap();
    gain.process(block).unwrap();
}

fn eq_bench(block: &mut AudioBlock) {
    let mut eq = Equaliser::new("eq", SAMPLE_RATE).unwrap();
    eq.process(block).unwrap();
}

fn compressor_bench(block: &mut AudioBlock) {
    let mut comp = Compressor::new("compressor", SAMPLE_RATE).unwrap();
    comp.process(block).unwrap();
}

fn delay_bench(block: &mut AudioBlock) {
    let mut delay = Delay::new("delay", SAMPLE_RATE).unwrap();
    delay.process(block).unwrap();
}

fn algorithmic_reverb_bench(block: &mut AudioBlock) {
    let mut reverb = AlgorithmicReverb::new("reverb", SAMPLE_RATE).unwrap();
    reverb.process(block).unwrap();
}

fn convolution_reverb_bench(block: &mut AudioBlock) {
    let impulse = vec![vec![1.0_f32; 256]; 2];
    let mut reverb =
        ConvolutionalReverb::with_impulse("reverb", BLOCK_SIZE, SAMPLE_RATE as u32, impulse).unwrap();
    reverb.process(block).unwrap();
}

fn channel_bench(block: &mut AudioBlock) {
    let mut channel =
        Channel::new("track-0", SAMPLE_RATE, BLOCK_SIZE, ImpulseSource::Memory(vec![vec![1.0]])).unwrap();
    channel.process(block).unwrap();
}

fn console_process_block_bench() {
    let config = ConsoleConfig {
        sample_rate: SAMPLE_RATE,
        block_size: BLOCK_SIZE,
        num_channels: 4,
        aux_bus_names: vec!["reverb-aux".to_string()],
        seed: 0,
        verbose: false,
        ir_dir: None,
    };
    let channels = (0..4).map(|_| vec![0.1_f32; BLOCK_SIZE * 4]).collect();
    let multitrack = Multitrack::from_channels(channels, SAMPLE_RATE as u32, BLOCK_SIZE).unwrap();
    let mut console = Console::new(config, multitrack).unwrap();
    while console.process_block().unwrap().is_some() {}
}

fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("gain", |b| b.iter(|| gain_bench(black_box(&mut noise_block(BLOCK_SIZE)))));
    c.bench_function("equaliser", |b| b.iter(|| eq_bench(black_box(&mut noise_block(BLOCK_SIZE)))));
    c.bench_function("compressor", |b| {
        b.iter(|| compressor_bench(black_box(&mut noise_block(BLOCK_SIZE))))
    });
    c.bench_function("delay", |b| b.iter(|| delay_bench(black_box(&mut noise_block(BLOCK_SIZE)))));
    c.bench_function("algorithmic_reverb", |b| {
        b.iter(|| algorithmic_reverb_bench(black_box(&mut noise_block(BLOCK_SIZE))))
    });
    c.bench_function("convolution_reverb", |b| {
        b.iter(|| convolution_reverb_bench(black_box(&mut noise_block(BLOCK_SIZE))))
    });
    c.bench_function("channel", |b| b.iter(|| channel_bench(black_box(&mut noise_block(BLOCK_SIZE)))));
    c.bench_function("console_process_block", |b| b.iter(console_process_block_bench));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
