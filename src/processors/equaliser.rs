//! Five-band parametric equaliser: low shelf, three peaking bands, high shelf (spec §4.9).

use crate::error::Result;
use crate::math::clamp11;
use crate::parameter::Parameter;
use crate::parameter_list::ParameterList;
use crate::processor::{AudioBlock, Processor};
use crate::processors::biquad::{Biquad, BiquadCoefs};

const MIN_GAIN: f32 = -24.0;
const MAX_GAIN: f32 = 24.0;
const MIN_Q: f32 = 0.1;
const MAX_Q: f32 = 10.0;
/// Q fixed for both shelves; shelves expose only `freq`/`gain` (spec §4.9).
const SHELF_Q: f32 = 0.707;

struct BandSpec {
    name: &'static str,
    freq_min: f32,
    freq_max: f32,
    freq_default: f32,
    has_q: bool,
}

const BANDS: [BandSpec; 5] = [
    BandSpec { name: "low_shelf", freq_min: 20.0, freq_max: 1_000.0, freq_default: 80.0, has_q: false },
    BandSpec { name: "first_band", freq_min: 200.0, freq_max: 5_000.0, freq_default: 400.0, has_q: true },
    BandSpec { name: "second_band", freq_min: 500.0, freq_max: 6_000.0, freq_default: 1_000.0, has_q: true },
    BandSpec { name: "third_band", freq_min: 1_000.0, freq_max: 10_000.0, freq_default: 5_000.0, has_q: true },
    BandSpec { name: "high_shelf", freq_min: 20.0, freq_max: 20_000.0, freq_default: 10_000.0, has_q: false },
];

#[derive(Debug)]
pub struct Equaliser {
    name: String,
    parameters: ParameterList,
    sample_rate: f32,
    low_shelf: Biquad,
    first_band: Biquad,
    second_band: Biquad,
    third_band: Biquad,
    high_shelf: Biquad,
    clip: bool,
}

impl Equaliser {
    pub fn new(name: impl Into<String>, sample_rate: f32) -> Result<Self> {
        let mut parameters = ParameterList::new();
        parameters.add(Parameter::boolean("bypass", false))?;
        parameters.add(Parameter::boolean("clip", false))?;
        for band in &BANDS {
            let freq_max = band.freq_max.min(sample_rate / 2.0 - 1.0);
            parameters.add(Parameter::float(
                format!("{}_freq", band.name),
                band.freq_default.min(freq_max),
                band.freq_min,
                freq_max,
                "Hz",
            )?)?;
            parameters.add(Parameter::float(
                format!("{}_gain", band.name),
                0.0,
                MIN_GAIN,
                MAX_GAIN,
                "dB",
            )?)?;
            if band.has_q {
                parameters.add(Parameter::float(format!("{}_q", band.name), SHELF_Q, MIN_Q, MAX_Q, "")?)?;
            }
        }
        let mut eq = Self {
            name: name.into(),
            parameters,
            sample_rate,
            low_shelf: Biquad::new(BiquadCoefs::identity()),
            first_band: Biquad::new(BiquadCoefs::identity()),
            second_band: Biquad::new(BiquadCoefs::identity()),
            third_band: Biquad::new(BiquadCoefs::identity()),
            high_shelf: Biquad::new(BiquadCoefs::identity()),
            clip: false,
        };
        eq.update(None);
        Ok(eq)
    }

    fn freq_gain(&self, band: &str) -> (f32, f32) {
        let p = &self.parameters;
        (p.get(&format!("{band}_freq")).unwrap().get_f32(), p.get(&format!("{band}_gain")).unwrap().get_f32())
    }

    fn q(&self, band: &str) -> f32 {
        self.parameters.get(&format!("{band}_q")).unwrap().get_f32()
    }

    fn recompute_band(&mut self, band: &str) {
        let sr = self.sample_rate;
        match band {
            "low_shelf" => {
                let (f, g) = self.freq_gain("low_shelf");
                self.low_shelf.set_coefs(BiquadCoefs::low_shelf(sr, f, g, SHELF_Q));
            }
            "first_band" => {
                let (f, g) = self.freq_gain("first_band");
                self.first_band.set_coefs(BiquadCoefs::peaking(sr, f, g, self.q("first_band")));
            }
            "second_band" => {
                let (f, g) = self.freq_gain("second_band");
                self.second_band.set_coefs(BiquadCoefs::peaking(sr, f, g, self.q("second_band")));
            }
            "third_band" => {
                let (f, g) = self.freq_gain("third_band");
                self.third_band.set_coefs(BiquadCoefs::peaking(sr, f, g, self.q("third_band")));
            }
            "high_shelf" => {
                let (f, g) = self.freq_gain("high_shelf");
                self.high_shelf.set_coefs(BiquadCoefs::high_shelf(sr, f, g, SHELF_Q));
            }
            _ => {}
        }
    }
}

impl Processor for Equaliser {
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
        if self.parameters.get("bypass").unwrap().get_bool() {
            return Ok(());
        }
        for channel in &mut block.channels {
            for sample in channel.iter_mut() {
                let mut x = self.low_shelf.tick(*sample);
                x = self.first_band.tick(x);
                x = self.second_band.tick(x);
                x = self.third_band.tick(x);
                x = self.high_shelf.tick(x);
                *sample = if self.clip { clamp11(x) } else { x };
            }
        }
        Ok(())
    }

    /// Recomputes only the band named by `name`, matching the reference
    /// console's per-band coefficient recalculation; a bulk update (`None`,
    /// e.g. from `randomize`/`reset`) recomputes every band.
    fn update(&mut self, name: Option<&str>) {
        self.clip = self.parameters.get("clip").unwrap().get_bool();
        match name {
            Some(param) => {
                if let Some(band) = BANDS.iter().map(|b| b.name).find(|b| param.starts_with(b)) {
                    self.recompute_band(band);
                }
            }
            None => {
                for band in &BANDS {
                    self.recompute_band(band.name);
                }
            }
        }
    }

    fn reset(&mut self) {
        self.parameters.reset();
        self.low_shelf.reset();
        self.first_band.reset();
        self.second_band.reset();
        self.third_band.reset();
        self.high_shelf.reset();
        self.update(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::ParameterValue;

    #[test]
    fn flat_settings_pass_signal_through_approximately() {
        let mut eq = Equaliser::new("eq", 48_000.0).unwrap();
        let mut block = AudioBlock::mono(vec![1.0; 64]);
        eq.process(&mut block).unwrap();
        let tail = *block.channels[0].last().unwrap();
        assert!((tail - 1.0).abs() < 0.05);
    }

    #[test]
    fn shelves_have_no_q_parameter() {
        let eq = Equaliser::new("eq", 48_000.0).unwrap();
        assert!(eq.parameters.get("low_shelf_q").is_none());
        assert!(eq.parameters.get("high_shelf_q").is_none());
        assert!(eq.parameters.get("first_band_q").is_some());
    }

    #[test]
    fn updating_one_band_does_not_disturb_others_gain_setting() {
        let mut eq = Equaliser::new("eq", 48_000.0).unwrap();
        eq.set("second_band_gain", ParameterValue::Float(6.0)).unwrap();
        eq.set("first_band_freq", ParameterValue::Float(500.0)).unwrap();
        assert_eq!(eq.parameters.get("second_band_gain").unwrap().get_f32(), 6.0);
    }

    #[test]
    fn clip_limits_output_to_unit_range() {
        let mut eq = Equaliser::new("eq", 48_000.0).unwrap();
        eq.set("clip", ParameterValue::Bool(true)).unwrap();
        eq.set("low_shelf_gain", ParameterValue::Float(24.0)).unwrap();
        let mut block = AudioBlock::mono(vec![1.0; 256]);
        eq.process(&mut block).unwrap();
        assert!(block.channels[0].iter().all(|s| s.abs() <= 1.0));
    }

    #[test]
    fn bypass_is_identity() {
        let mut eq = Equaliser::new("eq", 48_000.0).unwrap();
        eq.set("bypass", ParameterValue::Bool(true)).unwrap();
        eq.set("low_shelf_gain", ParameterValue::Float(24.0)).unwrap();
        let input = vec![0.3, -0.2, 0.1];
        let mut block = AudioBlock::mono(input.clone());
        eq.process(&mut block).unwrap();
        assert_eq!(block.channels[0], input);
    }
}
