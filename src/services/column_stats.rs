use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::models::{ColumnProfile, ColumnType, RawValue};
use crate::services::inference::infer_type_refs;

/// Share of non-missing cells that must parse as numbers for the numeric
/// measures to be computed. Looser than type inference on purpose.
pub const NUMERIC_BRANCH_MAJORITY: f64 = 0.5;

/// Occurrence counts that remember first-seen order.
///
/// Mode ties go to the value encountered first, which keeps profiles
/// reproducible across runs.
#[derive(Debug)]
pub(crate) struct FrequencyTable<K> {
    index: HashMap<K, usize>,
    entries: Vec<(K, usize)>,
}

impl<K: Eq + Hash + Clone> FrequencyTable<K> {
    pub(crate) fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    pub(crate) fn add(&mut self, key: K) {
        match self.index.get(&key) {
            Some(&slot) => self.entries[slot].1 += 1,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, 1));
            }
        }
    }

    /// Most frequent key; the earliest one wins a tie.
    pub(crate) fn mode(&self) -> Option<&K> {
        let mut best: Option<&(K, usize)> = None;
        for entry in &self.entries {
            if best.map_or(true, |b| entry.1 > b.1) {
                best = Some(entry);
            }
        }
        best.map(|(key, _)| key)
    }

    pub(crate) fn into_entries(self) -> Vec<(K, usize)> {
        self.entries
    }
}

/// Profiles one column. `hint` only overrides the reported `data_type`;
/// which measures get filled is decided from the values themselves.
pub fn compute_stats(values: &[RawValue], hint: Option<ColumnType>) -> ColumnProfile {
    compute_stats_refs(&values.iter().collect::<Vec<_>>(), hint)
}

pub(crate) fn compute_stats_refs(values: &[&RawValue], hint: Option<ColumnType>) -> ColumnProfile {
    let present: Vec<&RawValue> = values.iter().copied().filter(|v| !v.is_missing()).collect();
    let unique_count = present
        .iter()
        .map(|v| v.as_string())
        .collect::<HashSet<_>>()
        .len();

    let data_type = hint.unwrap_or_else(|| infer_type_refs(values));
    let mut profile = ColumnProfile::base(
        data_type,
        values.len(),
        values.len() - present.len(),
        unique_count,
    );

    if present.is_empty() {
        return profile;
    }

    let parsed: Vec<f64> = present.iter().filter_map(|v| v.as_number()).collect();
    if parsed.len() as f64 > present.len() as f64 * NUMERIC_BRANCH_MAJORITY {
        fill_numeric(&mut profile, parsed);
    } else {
        fill_text(&mut profile, &present);
    }
    profile
}

fn fill_numeric(profile: &mut ColumnProfile, parsed: Vec<f64>) {
    let mut frequencies = FrequencyTable::new();
    for n in &parsed {
        // -0.0 and 0.0 are the same cell value
        frequencies.add((n + 0.0).to_bits());
    }

    let mut sorted = parsed;
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    if n == 0 {
        return;
    }
    let count = n as f64;
    let mean = sorted.iter().sum::<f64>() / count;
    let variance = sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / count;
    let median = if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    };
    let min = sorted[0];
    let max = sorted[n - 1];

    profile.mean = Some(mean);
    profile.median = Some(median);
    profile.mode = frequencies.mode().map(|bits| RawValue::Number(f64::from_bits(*bits)));
    profile.min = Some(min);
    profile.max = Some(max);
    profile.range = Some(max - min);
    profile.variance = Some(variance);
    profile.standard_deviation = Some(variance.sqrt());
}

fn fill_text(profile: &mut ColumnProfile, present: &[&RawValue]) {
    let mut frequencies = FrequencyTable::new();
    let mut total_length = 0usize;
    for value in present {
        let s = value.as_string();
        total_length += s.chars().count();
        frequencies.add(s);
    }

    profile.mode = frequencies.mode().cloned().map(RawValue::Text);
    profile.average_length = Some(total_length as f64 / present.len() as f64);
}
