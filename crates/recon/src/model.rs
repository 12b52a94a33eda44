use serde::Serialize;

use crate::aggregate::AggregatedIndex;
use crate::key::CanonicalKey;
use crate::merge::EnrichedRecord;
use crate::similarity::SimilarityMetric;

// ---------------------------------------------------------------------------
// Report entries
// ---------------------------------------------------------------------------

/// Match decision for one distinct reference key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchEntry {
    pub reference_key: CanonicalKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_key: Option<CanonicalKey>,
    pub score: f64,
    /// Reference rows sharing `reference_key`.
    pub rows: usize,
    /// Display name of the matched manufacturer, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub make_name: Option<&'static str>,
}

/// One row of the aggregated price index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceEntry {
    pub target_key: CanonicalKey,
    pub price: f64,
    pub contributors: usize,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JoinSummary {
    /// Target rows that entered the join (after pre-filters).
    pub target_rows: usize,
    pub target_keys: usize,
    pub reference_rows: usize,
    pub reference_keys: usize,
    pub matched_reference_keys: usize,
    pub unmatched_reference_keys: usize,
    pub indexed_target_keys: usize,
    pub enriched_rows: usize,
    /// Target rows that entered the join but found no price.
    pub dropped_target_rows: usize,
    /// Target rows removed before the join (missing field or age window).
    pub filtered_target_rows: usize,
    pub skipped_reference_rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct JoinMeta {
    pub config_name: String,
    pub engine_version: String,
    pub run_at: String,
    pub cutoff: f64,
    pub metric: SimilarityMetric,
    pub prefix_len: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct JoinResult {
    pub meta: JoinMeta,
    pub summary: JoinSummary,
    pub matches: Vec<MatchEntry>,
    pub prices: Vec<PriceEntry>,
    #[serde(skip)]
    pub index: AggregatedIndex,
    /// Enriched rows, in target order. Written as CSV, not JSON.
    #[serde(skip)]
    pub records: Vec<EnrichedRecord>,
}
