//! Incremental aggregation over record batches.
//!
//! The engine folds each batch into per-query [`QueryState`] and materializes
//! result rows at emission time. Passthrough (non-aggregating) queries bypass
//! state entirely and are evaluated against the incoming batch alone.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use super::accumulator::GroupAccumulator;
use super::query::{AggregateFunction, OutputMode, QueryDefinition};
use super::types::{compare_field_values, Batch, FieldValue, GroupKey, Record, ResultRow};

/// Mapping from grouping-key tuple to accumulator for one query.
///
/// Ungrouped queries key their single accumulator under the empty tuple.
#[derive(Debug, Default)]
pub struct QueryState {
    groups: HashMap<GroupKey, GroupAccumulator>,
}

impl QueryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Stateless evaluator driving accumulator updates and result materialization.
pub struct AggregationEngine;

impl AggregationEngine {
    /// Fold a batch into a query's running state.
    ///
    /// Returns the grouping keys touched by this batch, in first-touched
    /// order; Update-mode emission re-materializes exactly those keys.
    /// Passthrough queries hold no state and return no keys.
    pub fn apply(query: &QueryDefinition, state: &mut QueryState, batch: &Batch) -> Vec<GroupKey> {
        if query.is_passthrough() {
            return Vec::new();
        }

        let mut changed: Vec<GroupKey> = Vec::new();
        let mut seen: HashSet<GroupKey> = HashSet::new();

        for record in &batch.records {
            if !query.accepts(record) {
                continue;
            }

            let key = Self::group_key(query, record);
            let accumulator = state.groups.entry(key.clone()).or_default();
            accumulator.increment_count();

            for agg in &query.aggregates {
                match agg.function {
                    AggregateFunction::Count => {}
                    AggregateFunction::Sum => {
                        if let Some(field) = agg.field {
                            if let Some(value) = record.get(field) {
                                if let Some(v) = value.as_f64() {
                                    let integral = matches!(value, FieldValue::Integer(_));
                                    accumulator.add_sum(agg.alias, v, integral);
                                }
                            }
                        }
                    }
                    AggregateFunction::Avg => {
                        if let Some(field) = agg.field {
                            if let Some(v) = record.get(field).and_then(FieldValue::as_f64) {
                                accumulator.add_avg(agg.alias, v);
                            }
                        }
                    }
                }
            }

            if seen.insert(key.clone()) {
                changed.push(key);
            }
        }

        changed
    }

    /// Materialize the full current state of a query (Complete mode).
    pub fn materialize(query: &QueryDefinition, state: &QueryState) -> Vec<ResultRow> {
        let keyed: Vec<(&GroupKey, ResultRow)> = state
            .groups
            .iter()
            .filter_map(|(key, acc)| Self::result_row(query, key, acc).map(|row| (key, row)))
            .collect();

        Self::ordered_rows(query, keyed)
    }

    /// Materialize only the given grouping keys (Update mode).
    pub fn materialize_changed(
        query: &QueryDefinition,
        state: &QueryState,
        changed: &[GroupKey],
    ) -> Vec<ResultRow> {
        let keyed: Vec<(&GroupKey, ResultRow)> = changed
            .iter()
            .filter_map(|key| {
                let acc = state.groups.get(key)?;
                Self::result_row(query, key, acc).map(|row| (key, row))
            })
            .collect();

        Self::ordered_rows(query, keyed)
    }

    /// Evaluate a passthrough query directly against a batch (Append mode).
    ///
    /// Only records from the current batch are considered; nothing is
    /// retained, so past rows are never re-emitted.
    pub fn passthrough(query: &QueryDefinition, batch: &Batch) -> Vec<ResultRow> {
        let columns = match &query.projection {
            Some(fields) => fields,
            None => return Vec::new(),
        };

        batch
            .records
            .iter()
            .filter(|record| query.accepts(record))
            .map(|record| {
                let mut row = ResultRow::new();
                for field in columns {
                    row.push(field.name(), record.value_or_null(*field));
                }
                row
            })
            .collect()
    }

    fn group_key(query: &QueryDefinition, record: &Record) -> GroupKey {
        query
            .group_by
            .iter()
            .map(|field| record.value_or_null(*field))
            .collect()
    }

    /// Build the output row for one grouping key, or `None` when an average
    /// column has no contributing values yet.
    fn result_row(
        query: &QueryDefinition,
        key: &GroupKey,
        accumulator: &GroupAccumulator,
    ) -> Option<ResultRow> {
        if accumulator.count == 0 {
            return None;
        }

        let mut row = ResultRow::new();
        for (field, value) in query.group_by.iter().zip(key) {
            row.push(field.name(), value.clone());
        }

        for agg in &query.aggregates {
            let value = match agg.function {
                AggregateFunction::Count => FieldValue::Integer(accumulator.count as i64),
                AggregateFunction::Sum => accumulator
                    .sum(agg.alias)
                    .unwrap_or(FieldValue::Integer(0)),
                AggregateFunction::Avg => accumulator.avg(agg.alias)?,
            };
            row.push(agg.alias, value);
        }

        Some(row)
    }

    /// Sort materialized rows: by the designated aggregate when the query is
    /// ranked, otherwise by ascending grouping key. Rank ties also fall back
    /// to the ascending key so repeated runs emit identical orderings.
    fn ordered_rows(
        query: &QueryDefinition,
        mut keyed: Vec<(&GroupKey, ResultRow)>,
    ) -> Vec<ResultRow> {
        match &query.sort {
            Some(sort) => {
                keyed.sort_by(|(ka, a), (kb, b)| {
                    let va = a.get(sort.by_alias).unwrap_or(&FieldValue::Null);
                    let vb = b.get(sort.by_alias).unwrap_or(&FieldValue::Null);
                    let primary = if sort.descending {
                        compare_field_values(vb, va)
                    } else {
                        compare_field_values(va, vb)
                    };
                    primary.then_with(|| Self::compare_keys(ka, kb))
                });
            }
            None => {
                keyed.sort_by(|(ka, _), (kb, _)| Self::compare_keys(ka, kb));
            }
        }

        keyed.into_iter().map(|(_, row)| row).collect()
    }

    fn compare_keys(a: &GroupKey, b: &GroupKey) -> Ordering {
        for (x, y) in a.iter().zip(b.iter()) {
            let ord = compare_field_values(x, y);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        a.len().cmp(&b.len())
    }
}

/// Emission-time dispatch on output mode.
pub fn emit_rows(
    query: &QueryDefinition,
    state: &QueryState,
    batch: &Batch,
    changed: &[GroupKey],
) -> Vec<ResultRow> {
    match query.output_mode {
        OutputMode::Append => AggregationEngine::passthrough(query, batch),
        OutputMode::Update => AggregationEngine::materialize_changed(query, state, changed),
        OutputMode::Complete => AggregationEngine::materialize(query, state),
    }
}
