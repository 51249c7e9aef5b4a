//! Seed ledger — named generator seeds captured while recording.
//!
//! Lookups are first-match-and-remove, not keyed: several generators
//! registered under one name get their seeds back in registration order.

use crate::random::SeededRandom;

/// One registered generator: its name and the seed it started from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandomSourceRecord {
    pub name: String,
    pub seed: u32,
}

/// Ordered list of random-source records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedLedger {
    records: Vec<RandomSourceRecord>,
}

impl SeedLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<RandomSourceRecord>) -> Self {
        Self { records }
    }

    /// Append the generator's current seed under `name`.
    pub fn capture(&mut self, rng: &dyn SeededRandom, name: &str) {
        self.records.push(RandomSourceRecord {
            name: name.to_string(),
            seed: rng.seed(),
        });
    }

    /// Remove and return the first pending seed recorded under `name`.
    pub fn take(&mut self, name: &str) -> Option<u32> {
        let idx = self.records.iter().position(|r| r.name == name)?;
        Some(self.records.remove(idx).seed)
    }

    /// Apply the first pending seed for `name` to `rng`.
    /// Returns false (and leaves `rng` alone) if none is pending.
    pub fn restore(&mut self, rng: &mut dyn SeededRandom, name: &str) -> bool {
        match self.take(name) {
            Some(seed) => {
                rng.set_seed(seed);
                true
            }
            None => false,
        }
    }

    pub fn records(&self) -> &[RandomSourceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
