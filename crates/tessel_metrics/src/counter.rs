//! Named running totals

use std::collections::BTreeMap;

/// Totals keyed by static names; iteration is in name order so log output
/// is stable.
#[derive(Debug, Default)]
pub struct Counter {
    totals: BTreeMap<&'static str, usize>,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, name: &'static str, value: usize) {
        *self.totals.entry(name).or_default() += value;
    }

    pub fn set(&mut self, name: &'static str, value: usize) {
        self.totals.insert(name, value);
    }

    pub fn get(&self, name: &str) -> usize {
        self.totals.get(name).copied().unwrap_or(0)
    }

    pub fn reset_all(&mut self) {
        self.totals.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, usize)> + '_ {
        self.totals.iter().map(|(&name, &total)| (name, total))
    }
}
