use std::collections::{BTreeMap, HashMap};

use rayon::prelude::*;
use serde::Serialize;

use crate::key::{build_abbrev_key, CanonicalKey, DEFAULT_PREFIX_LEN};
use crate::matcher::{CandidateSet, FuzzyMatcher, MatchResult};
use crate::table::ReferenceRecord;

/// Running sum + count. Merging two accumulators gives the count-weighted
/// mean, so partial results combine in any grouping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PriceAccumulator {
    pub sum: f64,
    pub count: usize,
}

impl PriceAccumulator {
    pub fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    pub fn merge(&mut self, other: &PriceAccumulator) {
        self.sum += other.sum;
        self.count += other.count;
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Matched target key -> mean price of every reference record that
/// resolved to it. Keys with no contributors are absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedIndex {
    entries: BTreeMap<CanonicalKey, PriceAccumulator>,
}

impl AggregatedIndex {
    pub fn add(&mut self, key: CanonicalKey, value: f64) {
        self.entries.entry(key).or_default().add(value);
    }

    /// Mean price for `key`.
    pub fn get(&self, key: &CanonicalKey) -> Option<f64> {
        self.entries.get(key).map(PriceAccumulator::mean)
    }

    pub fn accumulator(&self, key: &CanonicalKey) -> Option<&PriceAccumulator> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &CanonicalKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(key, mean, contributor count)` in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&CanonicalKey, f64, usize)> {
        self.entries.iter().map(|(k, acc)| (k, acc.mean(), acc.count))
    }

    pub fn merge(&mut self, other: AggregatedIndex) {
        for (key, acc) in other.entries {
            self.entries.entry(key).or_default().merge(&acc);
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AggregateOptions {
    pub prefix_len: usize,
    pub parallel: bool,
    pub chunk_size: usize,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            prefix_len: DEFAULT_PREFIX_LEN,
            parallel: false,
            chunk_size: 256,
        }
    }
}

/// Match outcome for one distinct abbreviated reference key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMatch {
    #[serde(flatten)]
    pub result: MatchResult,
    /// Reference records sharing the key.
    pub rows: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub index: AggregatedIndex,
    /// One entry per distinct reference key, in first-appearance order.
    pub matches: Vec<GroupMatch>,
    /// Reference records whose key could not be built.
    pub skipped: usize,
}

struct ReferenceGroup {
    key: CanonicalKey,
    prices: Vec<f64>,
}

/// Build the aggregated price index.
///
/// Reference records are grouped by abbreviated key; each distinct key is
/// matched once against `targets`, and all prices in the group are
/// accumulated under the matched target key.
///
/// In parallel mode each chunk sums its own prices and the partial sums are
/// added in chunk order. Keys, counts and match reports equal the sequential
/// result; means with fractional prices may differ from it in the last bits,
/// but are identical across runs for a given `chunk_size`.
pub fn aggregate(
    records: &[ReferenceRecord],
    matcher: &FuzzyMatcher,
    targets: &CandidateSet,
    options: &AggregateOptions,
) -> Aggregation {
    let (groups, skipped) = group_by_key(records, options.prefix_len);
    tracing::info!(
        reference_rows = records.len(),
        reference_keys = groups.len(),
        target_keys = targets.len(),
        parallel = options.parallel,
        "matching reference keys"
    );

    let partials: Vec<(AggregatedIndex, Vec<GroupMatch>)> = if options.parallel {
        groups
            .par_chunks(options.chunk_size.max(1))
            .map(|chunk| match_groups(chunk, matcher, targets))
            .collect()
    } else {
        vec![match_groups(&groups, matcher, targets)]
    };

    let mut aggregation = Aggregation {
        skipped,
        ..Default::default()
    };
    for (index, matches) in partials {
        aggregation.index.merge(index);
        aggregation.matches.extend(matches);
    }
    aggregation
}

fn group_by_key(records: &[ReferenceRecord], prefix_len: usize) -> (Vec<ReferenceGroup>, usize) {
    let mut groups: Vec<ReferenceGroup> = Vec::new();
    let mut positions: HashMap<CanonicalKey, usize> = HashMap::new();
    let mut skipped = 0;

    for record in records {
        if !record.price.is_finite() {
            tracing::debug!(row = record.row, "reference price is not finite");
            skipped += 1;
            continue;
        }
        let key = match build_abbrev_key(&record.fields(), prefix_len) {
            Ok(k) => k,
            Err(e) => {
                tracing::debug!(row = record.row, error = %e, "reference row skipped");
                skipped += 1;
                continue;
            }
        };
        let pos = *positions.entry(key.clone()).or_insert_with(|| {
            groups.push(ReferenceGroup {
                key,
                prices: Vec::new(),
            });
            groups.len() - 1
        });
        groups[pos].prices.push(record.price);
    }

    (groups, skipped)
}

fn match_groups(
    groups: &[ReferenceGroup],
    matcher: &FuzzyMatcher,
    targets: &CandidateSet,
) -> (AggregatedIndex, Vec<GroupMatch>) {
    let mut index = AggregatedIndex::default();
    let mut matches = Vec::with_capacity(groups.len());

    for group in groups {
        let result = matcher.match_key(&group.key, targets);
        if let Some(ref target) = result.target_key {
            for &price in &group.prices {
                index.add(target.clone(), price);
            }
        }
        matches.push(GroupMatch {
            result,
            rows: group.prices.len(),
        });
    }

    (index, matches)
}
