//! Running aggregate state for one grouping key.

use std::collections::HashMap;

use super::types::FieldValue;

/// Sum kept in f64 with an integral flag so integer sums render without a
/// decimal point.
#[derive(Debug, Clone, Copy)]
pub struct SumState {
    pub value: f64,
    pub integral: bool,
}

/// Average kept as numerator/denominator. The quotient is computed at
/// emission time only; a running average is never stored, so repeated
/// incremental updates cannot drift.
#[derive(Debug, Clone, Copy, Default)]
pub struct AvgState {
    pub sum: f64,
    pub count: u64,
}

/// Mutable accumulator for one grouping key.
///
/// Created on the first record of a group and updated in place every trigger.
/// Never reset except on process restart.
#[derive(Debug, Clone, Default)]
pub struct GroupAccumulator {
    /// Count of records in this group
    pub count: u64,
    sums: HashMap<&'static str, SumState>,
    avgs: HashMap<&'static str, AvgState>,
}

impl GroupAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_count(&mut self) {
        self.count += 1;
    }

    /// Fold one value into the sum for an output alias.
    pub fn add_sum(&mut self, alias: &'static str, value: f64, integral: bool) {
        let entry = self.sums.entry(alias).or_insert(SumState {
            value: 0.0,
            integral,
        });
        entry.value += value;
        entry.integral &= integral;
    }

    /// Fold one value into the average numerator/denominator for an alias.
    pub fn add_avg(&mut self, alias: &'static str, value: f64) {
        let entry = self.avgs.entry(alias).or_default();
        entry.sum += value;
        entry.count += 1;
    }

    /// Current sum for an alias, typed by whether every input was integral.
    pub fn sum(&self, alias: &str) -> Option<FieldValue> {
        self.sums.get(alias).map(|s| {
            if s.integral {
                FieldValue::Integer(s.value as i64)
            } else {
                FieldValue::Float(s.value)
            }
        })
    }

    /// Current average for an alias; `None` until at least one value arrived.
    pub fn avg(&self, alias: &str) -> Option<FieldValue> {
        self.avgs.get(alias).and_then(|a| {
            if a.count == 0 {
                None
            } else {
                Some(FieldValue::Float(a.sum / a.count as f64))
            }
        })
    }
}
