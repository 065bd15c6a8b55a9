//! Ordered, name-keyed collection of [`Parameter`]s (spec §4.2).

use crate::error::{MixError, Result};
use crate::parameter::{Parameter, RandomDistribution};
use rand::Rng;
use serde_json::{Map, Value as Json};

/// Parameters in stable insertion order, looked up by name.
///
/// Insertion order is preserved deliberately: `serialize` and `vectorize`
/// both walk the list in this order, and downstream consumers (dataset
/// writers, one-hot decoders) rely on it being stable across runs.
#[derive(Clone, Debug, Default)]
pub struct ParameterList {
    names: Vec<String>,
    params: Vec<Parameter>,
}

impl ParameterList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `parameter`, erroring if its name is already present.
    pub fn add(&mut self, parameter: Parameter) -> Result<()> {
        if self.names.iter().any(|n| n == &parameter.name) {
            return Err(MixError::InvalidConstruction(format!(
                "duplicate parameter name '{}'",
                parameter.name
            )));
        }
        self.names.push(parameter.name.clone());
        self.params.push(parameter);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.params[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        match self.names.iter().position(|n| n == name) {
            Some(i) => Some(&mut self.params[i]),
            None => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Parameter> {
        self.params.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn reset(&mut self) {
        for p in &mut self.params {
            p.reset();
        }
    }

    /// Randomize every parameter with `randomize_value == true` (spec §4.1, §4.3).
    pub fn randomize(&mut self, distribution: RandomDistribution, rng: &mut impl Rng) {
        for p in &mut self.params {
            if p.randomize_value {
                p.randomize(distribution, rng);
            }
        }
    }

    /// Serialize all parameters into a JSON object keyed by name (spec §4.2).
    pub fn serialize(&self, normalize: bool, one_hot_encode: bool) -> Map<String, Json> {
        let mut out = Map::new();
        for p in &self.params {
            out.insert(p.name.clone(), p.serialize(normalize, one_hot_encode));
        }
        out
    }

    /// Concatenate per-parameter vectors in insertion order (spec §4.3).
    pub fn vectorize(&self) -> Vec<f32> {
        self.params.iter().flat_map(|p| p.vectorize()).collect()
    }

    /// Restore values from a previously `serialize`d document. Keys with no
    /// matching parameter (e.g. a chain's `"order"` marker) are ignored.
    pub fn apply(&mut self, doc: &Map<String, Json>) -> Result<()> {
        for (key, value) in doc {
            let Some(p) = self.get_mut(key) else { continue };
            let parsed: crate::parameter::ParameterValue = serde_json::from_value(value.clone())
                .map_err(|e| MixError::InvalidParameter {
                    name: key.clone(),
                    value: value.to_string(),
                    reason: e.to_string(),
                })?;
            p.set(parsed)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::ParameterValue;
    use rand::SeedableRng;

    #[test]
    fn duplicate_name_rejected() {
        let mut list = ParameterList::new();
        list.add(Parameter::float("gain", 0.0, -24.0, 24.0, "dB").unwrap())
            .unwrap();
        let err = list.add(Parameter::float("gain", 0.0, -24.0, 24.0, "dB").unwrap());
        assert!(err.is_err());
    }

    #[test]
    fn preserves_insertion_order() {
        let mut list = ParameterList::new();
        list.add(Parameter::boolean("b", false)).unwrap();
        list.add(Parameter::float("a", 0.0, -1.0, 1.0, "")).unwrap();
        let names: Vec<_> = list.iter().map(|p| p.name.clone()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn randomize_skips_non_randomized() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(3);
        let mut list = ParameterList::new();
        list.add(Parameter::float("fixed", 5.0, -10.0, 10.0, "").unwrap().not_randomized())
            .unwrap();
        list.randomize(RandomDistribution::Uniform, &mut rng);
        assert_eq!(list.get("fixed").unwrap().value(), &ParameterValue::Float(5.0));
    }

    #[test]
    fn vectorize_concatenates_in_order() {
        let mut list = ParameterList::new();
        list.add(Parameter::boolean("gate", true)).unwrap();
        list.add(Parameter::float("gain", 0.0, -1.0, 1.0, "")).unwrap();
        assert_eq!(list.vectorize(), vec![1.0, 0.0]);
    }
}
