//! Ordered, named collection of processors forming a serial chain (spec §4.6).

use crate::error::{MixError, Result};
use crate::processor::{AudioBlock, Processor};
use rand::seq::SliceRandom;
use rand::RngCore;
use serde_json::{Map, Value as Json};

/// A serial chain of boxed processors, run in order by `process`.
#[derive(Debug, Default)]
pub struct ProcessorList {
    items: Vec<Box<dyn Processor>>,
}

impl ProcessorList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `processor`; errors if its name is already present (spec §4.2).
    pub fn push(&mut self, processor: Box<dyn Processor>) -> Result<()> {
        self.check_unique(processor.name())?;
        self.items.push(processor);
        Ok(())
    }

    /// Insert `processor` at `index`; errors if its name is already present (spec §4.2).
    pub fn insert(&mut self, index: usize, processor: Box<dyn Processor>) -> Result<()> {
        self.check_unique(processor.name())?;
        self.items.insert(index, processor);
        Ok(())
    }

    fn check_unique(&self, name: &str) -> Result<()> {
        if self.contains(name) {
            return Err(MixError::InvalidConstruction(format!("duplicate processor name '{name}'")));
        }
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<Box<dyn Processor>> {
        let idx = self.index_of(name)?;
        Ok(self.items.remove(idx))
    }

    pub fn get(&self, name: &str) -> Option<&dyn Processor> {
        self.items.iter().find(|p| p.name() == name).map(|p| p.as_ref())
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Box<dyn Processor>> {
        self.items.iter_mut().find(|p| p.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.items.iter().any(|p| p.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Box<dyn Processor>> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<dyn Processor>> {
        self.items.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Swap the positions of two processors named `a` and `b` (spec §4.2).
    pub fn swap(&mut self, a: &str, b: &str) -> Result<()> {
        let i = self.index_of(a)?;
        let j = self.index_of(b)?;
        self.items.swap(i, j);
        Ok(())
    }

    fn index_of(&self, name: &str) -> Result<usize> {
        self.items
            .iter()
            .position(|p| p.name() == name)
            .ok_or_else(|| MixError::MissingProcessor(name.to_string()))
    }

    /// Run every processor in order, mutating `block` in place (spec §4.6).
    pub fn process(&mut self, block: &mut AudioBlock) -> Result<()> {
        for p in &mut self.items {
            p.process(block)?;
        }
        Ok(())
    }

    pub fn reset(&mut self) {
        for p in &mut self.items {
            p.reset();
        }
    }

    pub fn randomize(&mut self, rng: &mut dyn RngCore) {
        for p in &mut self.items {
            p.randomize(rng);
        }
    }

    /// Shuffle processing order in place (used for the core chain, spec §4.12).
    pub fn shuffle(&mut self, rng: &mut dyn RngCore) {
        self.items.shuffle(rng);
    }

    /// A list of `{processor_name: {param: value, ..., "order": index}}` entries
    /// in chain order (spec §4.6, §4.12, §6). An array, not a name-keyed object:
    /// the processing order *is* the chain, and `serde_json::Map` is a
    /// `BTreeMap` (no `preserve_order` feature), so a name-keyed object would
    /// silently re-sort the chain alphabetically on serialization.
    pub fn serialize(&self) -> Vec<Json> {
        self.items
            .iter()
            .enumerate()
            .map(|(idx, p)| {
                let mut entry = p.serialize();
                entry.insert("order".to_string(), serde_json::json!(idx));
                let mut wrapper = Map::new();
                wrapper.insert(p.name().to_string(), Json::Object(entry));
                Json::Object(wrapper)
            })
            .collect()
    }

    pub fn vectorize(&self) -> Vec<f32> {
        self.items.iter().flat_map(|p| p.vectorize()).collect()
    }

    /// Restore every processor's parameters from a previously `serialize`d
    /// array of `{name: {..., "order": idx}}` entries, then rebuild the
    /// chain order from each entry's `"order"` field (spec §4.12, §6
    /// document round-trip).
    pub fn apply(&mut self, entries: &[Json]) -> Result<()> {
        let mut order: Vec<(usize, String)> = Vec::with_capacity(entries.len());
        for entry in entries {
            let wrapper = entry
                .as_object()
                .ok_or_else(|| MixError::InvalidConstruction("processor document entry is not an object".into()))?;
            let (name, params) = wrapper
                .iter()
                .next()
                .ok_or_else(|| MixError::InvalidConstruction("empty processor document entry".into()))?;
            let params = params.as_object().ok_or_else(|| {
                MixError::InvalidConstruction(format!("processor '{name}' document entry is not an object"))
            })?;
            let idx = params.get("order").and_then(|v| v.as_u64()).unwrap_or(0) as usize;
            order.push((idx, name.clone()));
            let processor = self
                .get_mut(name)
                .ok_or_else(|| MixError::MissingProcessor(name.clone()))?;
            processor.apply(params)?;
        }
        order.sort_by_key(|(idx, _)| *idx);
        let mut reordered = Vec::with_capacity(self.items.len());
        for (_, name) in order {
            let pos = self
                .items
                .iter()
                .position(|p| p.name() == name)
                .ok_or_else(|| MixError::MissingProcessor(name.clone()))?;
            reordered.push(self.items.remove(pos));
        }
        self.items = reordered;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::gain::Gain;

    #[test]
    fn remove_missing_processor_errors() {
        let mut list = ProcessorList::new();
        assert!(list.remove("nope").is_err());
    }

    #[test]
    fn swap_exchanges_positions() {
        let mut list = ProcessorList::new();
        list.push(Box::new(Gain::new("a").unwrap())).unwrap();
        list.push(Box::new(Gain::new("b").unwrap())).unwrap();
        list.swap("a", "b").unwrap();
        let names: Vec<_> = list.iter().map(|p| p.name().to_string()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn swap_missing_name_errors() {
        let mut list = ProcessorList::new();
        list.push(Box::new(Gain::new("a").unwrap())).unwrap();
        assert!(list.swap("a", "nope").is_err());
    }

    #[test]
    fn serialize_includes_order() {
        let mut list = ProcessorList::new();
        list.push(Box::new(Gain::new("a").unwrap())).unwrap();
        list.push(Box::new(Gain::new("b").unwrap())).unwrap();
        let s = list.serialize();
        assert_eq!(s[0]["a"]["order"], 0);
        assert_eq!(s[1]["b"]["order"], 1);
    }

    #[test]
    fn apply_restores_values_and_reordered_chain() {
        let mut list = ProcessorList::new();
        list.push(Box::new(Gain::new("a").unwrap())).unwrap();
        list.push(Box::new(Gain::new("b").unwrap())).unwrap();
        list.get_mut("a").unwrap().set("gain", crate::parameter::ParameterValue::Float(3.0)).unwrap();
        list.swap("a", "b").unwrap();
        let document = list.serialize();

        let mut fresh = ProcessorList::new();
        fresh.push(Box::new(Gain::new("a").unwrap())).unwrap();
        fresh.push(Box::new(Gain::new("b").unwrap())).unwrap();
        fresh.apply(&document).unwrap();

        let names: Vec<_> = fresh.iter().map(|p| p.name().to_string()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(fresh.get("a").unwrap().serialize()["gain"], 3.0);
    }

    #[test]
    fn push_duplicate_name_errors() {
        let mut list = ProcessorList::new();
        list.push(Box::new(Gain::new("a").unwrap())).unwrap();
        assert!(list.push(Box::new(Gain::new("a").unwrap())).is_err());
    }
}
