//! Typed, bounded, randomizable named parameter values (spec §4.1).

use crate::error::{MixError, Result};
use crate::math::{normalize, normalize11};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

/// The distribution used by [`Parameter::randomize`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RandomDistribution {
    /// Normal for floats with `mu`/`sigma`, otherwise uniform.
    Default,
    Uniform,
    /// Float-only.
    Normal,
}

/// A single typed parameter value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Float(f32),
    Int(i32),
    Bool(bool),
    String(String),
}

impl ParameterValue {
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            ParameterValue::Float(v) => Some(*v),
            ParameterValue::Int(v) => Some(*v as f32),
            _ => None,
        }
    }
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            ParameterValue::Int(v) => Some(*v),
            _ => None,
        }
    }
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParameterValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParameterValue::String(v) => Some(v.as_str()),
            _ => None,
        }
    }

    fn to_json(&self) -> Json {
        match self {
            ParameterValue::Float(v) => serde_json::json!(v),
            ParameterValue::Int(v) => serde_json::json!(v),
            ParameterValue::Bool(v) => serde_json::json!(v),
            ParameterValue::String(v) => serde_json::json!(v),
        }
    }
}

/// Bounds and metadata specific to each parameter kind (spec §4.1).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ParameterBounds {
    Float {
        min: f32,
        max: f32,
        mu: Option<f32>,
        sigma: Option<f32>,
    },
    Int {
        min: i32,
        max: i32,
    },
    Bool,
    String {
        options: Vec<String>,
    },
}

/// A named, typed, bounded value owned by a [`crate::processor_list::ParameterList`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    value: ParameterValue,
    default: ParameterValue,
    bounds: ParameterBounds,
    pub units: String,
    pub print_precision: usize,
    /// If false, `Processor::randomize` skips this parameter (spec §4.1, §4.3).
    pub randomize_value: bool,
}

impl Parameter {
    /// Construct a float parameter. `mu`/`sigma` enable normal-distributed
    /// randomization by default (spec §4.1, §4.4).
    pub fn float(
        name: impl Into<String>,
        default: f32,
        min: f32,
        max: f32,
        units: impl Into<String>,
    ) -> Result<Self> {
        if !(min.is_finite() && max.is_finite()) {
            return Err(MixError::InvalidConstruction(format!(
                "float parameter '{}' requires finite min/max",
                name.into()
            )));
        }
        Ok(Self {
            name: name.into(),
            value: ParameterValue::Float(default),
            default: ParameterValue::Float(default),
            bounds: ParameterBounds::Float {
                min,
                max,
                mu: None,
                sigma: None,
            },
            units: units.into(),
            print_precision: 1,
            randomize_value: true,
        })
    }

    /// Float parameter with a normal-distribution randomization prior.
    pub fn float_normal(
        name: impl Into<String>,
        default: f32,
        min: f32,
        max: f32,
        units: impl Into<String>,
        mu: f32,
        sigma: f32,
    ) -> Result<Self> {
        let mut p = Self::float(name, default, min, max, units)?;
        if let ParameterBounds::Float { mu: m, sigma: s, .. } = &mut p.bounds {
            *m = Some(mu);
            *s = Some(sigma);
        }
        Ok(p)
    }

    pub fn int(name: impl Into<String>, default: i32, min: i32, max: i32) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            value: ParameterValue::Int(default),
            default: ParameterValue::Int(default),
            bounds: ParameterBounds::Int { min, max },
            units: String::new(),
            print_precision: 0,
            randomize_value: true,
        })
    }

    pub fn boolean(name: impl Into<String>, default: bool) -> Self {
        Self {
            name: name.into(),
            value: ParameterValue::Bool(default),
            default: ParameterValue::Bool(default),
            bounds: ParameterBounds::Bool,
            units: String::new(),
            print_precision: 0,
            randomize_value: true,
        }
    }

    pub fn string(
        name: impl Into<String>,
        default: impl Into<String>,
        options: Vec<String>,
    ) -> Result<Self> {
        let name = name.into();
        if options.is_empty() {
            return Err(MixError::InvalidConstruction(format!(
                "string parameter '{name}' must have at least one option"
            )));
        }
        let default = default.into();
        if !options.contains(&default) {
            return Err(MixError::InvalidParameter {
                name,
                value: default,
                reason: "default must be one of options".into(),
            });
        }
        Ok(Self {
            name,
            value: ParameterValue::String(default.clone()),
            default: ParameterValue::String(default),
            bounds: ParameterBounds::String { options },
            units: String::new(),
            print_precision: 0,
            randomize_value: true,
        })
    }

    /// Mark this parameter as excluded from `Processor::randomize`.
    pub fn not_randomized(mut self) -> Self {
        self.randomize_value = false;
        self
    }

    pub fn value(&self) -> &ParameterValue {
        &self.value
    }
    pub fn get_f32(&self) -> f32 {
        self.value.as_f32().unwrap_or(0.0)
    }
    pub fn get_i32(&self) -> i32 {
        self.value.as_i32().unwrap_or(0)
    }
    pub fn get_bool(&self) -> bool {
        self.value.as_bool().unwrap_or(false)
    }
    pub fn get_str(&self) -> &str {
        self.value.as_str().unwrap_or("")
    }

    fn check(&self, value: &ParameterValue) -> Result<()> {
        match (&self.bounds, value) {
            (ParameterBounds::Float { min, max, .. }, ParameterValue::Float(v)) => {
                if *v < *min || *v > *max {
                    return Err(MixError::InvalidParameter {
                        name: self.name.clone(),
                        value: v.to_string(),
                        reason: format!("must be in [{min}, {max}]"),
                    });
                }
            }
            (ParameterBounds::Int { min, max }, ParameterValue::Int(v)) => {
                if *v < *min || *v > *max {
                    return Err(MixError::InvalidParameter {
                        name: self.name.clone(),
                        value: v.to_string(),
                        reason: format!("must be in [{min}, {max}]"),
                    });
                }
            }
            (ParameterBounds::Bool, ParameterValue::Bool(_)) => {}
            (ParameterBounds::String { options }, ParameterValue::String(v)) => {
                if !options.contains(v) {
                    return Err(MixError::InvalidParameter {
                        name: self.name.clone(),
                        value: v.clone(),
                        reason: format!("must be one of {options:?}"),
                    });
                }
            }
            _ => {
                return Err(MixError::InvalidParameter {
                    name: self.name.clone(),
                    value: format!("{value:?}"),
                    reason: "value kind does not match parameter kind".into(),
                });
            }
        }
        Ok(())
    }

    /// Validate and store `value`. Does not itself call the owning
    /// processor's `update`; callers go through `Processor::set` for that
    /// (see DESIGN.md for why the owner back-reference is resolved this way).
    pub fn set(&mut self, value: ParameterValue) -> Result<()> {
        self.check(&value)?;
        self.value = value;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.value = self.default.clone();
    }

    /// Randomize this parameter's value in place (spec §4.1).
    pub fn randomize(&mut self, distribution: RandomDistribution, rng: &mut impl Rng) {
        match &self.bounds {
            ParameterBounds::Float { min, max, mu, sigma } => {
                let use_normal = match distribution {
                    RandomDistribution::Normal => true,
                    RandomDistribution::Uniform => false,
                    RandomDistribution::Default => mu.is_some() && sigma.is_some(),
                };
                let v = if use_normal {
                    let mu = mu.unwrap_or(0.0);
                    let sigma = sigma.unwrap_or(1.0);
                    let normal = Normal::new(mu, sigma).unwrap();
                    normal.sample(rng).clamp(*min, *max)
                } else {
                    rng.gen_range(*min..*max)
                };
                self.value = ParameterValue::Float(v);
            }
            ParameterBounds::Int { min, max } => {
                if min != max {
                    self.value = ParameterValue::Int(rng.gen_range(*min..*max));
                }
            }
            ParameterBounds::Bool => {
                self.value = ParameterValue::Bool(rng.gen_bool(0.5));
            }
            ParameterBounds::String { options } => {
                let idx = rng.gen_range(0..options.len());
                self.value = ParameterValue::String(options[idx].clone());
            }
        }
    }

    /// Serialize this parameter's current value (spec §4.1).
    pub fn serialize(&self, normalize_value: bool, one_hot_encode: bool) -> Json {
        match (&self.bounds, &self.value) {
            (ParameterBounds::String { options }, ParameterValue::String(v)) => {
                if one_hot_encode {
                    let mut out = vec![0.0_f32; options.len()];
                    if let Some(idx) = options.iter().position(|o| o == v) {
                        out[idx] = 1.0;
                    }
                    serde_json::json!(out)
                } else {
                    serde_json::json!(v)
                }
            }
            (ParameterBounds::Float { min, max, .. }, ParameterValue::Float(v)) => {
                if normalize_value {
                    serde_json::json!(normalize(*min, *max, *v))
                } else {
                    serde_json::json!(v)
                }
            }
            (ParameterBounds::Int { min, max }, ParameterValue::Int(v)) => {
                if normalize_value {
                    serde_json::json!(normalize(*min as f32, *max as f32, *v as f32))
                } else {
                    serde_json::json!(v)
                }
            }
            _ => self.value.to_json(),
        }
    }

    /// Normalized real-valued vector contribution of this parameter (spec §4.3).
    /// Scalars normalize to `[-1,1]`, strings to a one-hot vector, bools to `0`/`1`.
    pub fn vectorize(&self) -> Vec<f32> {
        match (&self.bounds, &self.value) {
            (ParameterBounds::Float { min, max, .. }, ParameterValue::Float(v)) => {
                vec![normalize11(*min, *max, *v)]
            }
            (ParameterBounds::Int { min, max }, ParameterValue::Int(v)) => {
                vec![normalize11(*min as f32, *max as f32, *v as f32)]
            }
            (ParameterBounds::String { options }, ParameterValue::String(v)) => {
                let mut out = vec![0.0_f32; options.len()];
                if let Some(idx) = options.iter().position(|o| o == v) {
                    out[idx] = 1.0;
                }
                out
            }
            (ParameterBounds::Bool, ParameterValue::Bool(v)) => {
                vec![if *v { 1.0 } else { 0.0 }]
            }
            _ => vec![0.0],
        }
    }

    pub fn bounds(&self) -> &ParameterBounds {
        &self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn reset_restores_default() {
        let mut p = Parameter::float("gain", 0.0, -80.0, 24.0, "dB").unwrap();
        p.set(ParameterValue::Float(12.0)).unwrap();
        p.reset();
        assert_eq!(p.get_f32(), 0.0);
    }

    #[test]
    fn set_out_of_range_errors() {
        let mut p = Parameter::float("gain", 0.0, -80.0, 24.0, "dB").unwrap();
        assert!(p.set(ParameterValue::Float(100.0)).is_err());
    }

    #[test]
    fn string_requires_option_membership() {
        assert!(Parameter::string("x", "bad", vec!["a".into(), "b".into()]).is_err());
    }

    #[test]
    fn uniform_randomize_stays_in_bounds() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        let mut p = Parameter::float("threshold", 0.0, -80.0, 0.0, "dB").unwrap();
        for _ in 0..1000 {
            p.randomize(RandomDistribution::Uniform, &mut rng);
            assert!(p.get_f32() >= -80.0 && p.get_f32() <= 0.0);
        }
    }

    #[test]
    fn normal_randomize_clips_to_bounds() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let mut p = Parameter::float_normal("gain", 0.0, -10.0, 10.0, "dB", 0.0, 100.0).unwrap();
        for _ in 0..1000 {
            p.randomize(RandomDistribution::Default, &mut rng);
            assert!(p.get_f32() >= -10.0 && p.get_f32() <= 10.0);
        }
    }

    #[test]
    fn int_randomize_skipped_when_min_equals_max() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let mut p = Parameter::int("fixed", 3, 3, 3).unwrap();
        p.randomize(RandomDistribution::Uniform, &mut rng);
        assert_eq!(p.get_i32(), 3);
    }

    #[test]
    fn serialize_normalizes_numeric() {
        let p = Parameter::float("gain", 12.0, -24.0, 24.0, "dB").unwrap();
        let v = p.serialize(true, false);
        assert!((v.as_f64().unwrap() - 0.75).abs() < 1e-6);
    }

    #[test]
    fn vectorize_one_hot_string() {
        let p = Parameter::string("kind", "b", vec!["a".into(), "b".into(), "c".into()]).unwrap();
        assert_eq!(p.vectorize(), vec![0.0, 1.0, 0.0]);
    }
}
