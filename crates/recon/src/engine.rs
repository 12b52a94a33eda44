use crate::aggregate::{aggregate, AggregateOptions, Aggregation};
use crate::config::JoinConfig;
use crate::error::JoinError;
use crate::makes::display_name;
use crate::matcher::CandidateSet;
use crate::merge::merge;
use crate::model::{JoinMeta, JoinResult, JoinSummary, MatchEntry, PriceEntry};
use crate::table::{ReferenceTable, TargetTable};

/// Run the join per config over pre-loaded tables.
pub fn run(
    config: &JoinConfig,
    targets: &TargetTable,
    references: &ReferenceTable,
) -> Result<JoinResult, JoinError> {
    config.validate()?;

    let candidates: CandidateSet = targets
        .records
        .iter()
        .map(|r| r.canonical_key.clone())
        .collect();

    let m = &config.matching;
    let options = AggregateOptions {
        prefix_len: m.prefix_len,
        parallel: m.parallel,
        chunk_size: m.chunk_size,
    };
    let Aggregation {
        index,
        matches,
        skipped,
    } = aggregate(&references.records, &m.matcher(), &candidates, &options);

    let records = merge(targets, &index);

    let matched = matches.iter().filter(|g| g.result.is_match()).count();
    let summary = JoinSummary {
        target_rows: targets.len(),
        target_keys: candidates.len(),
        reference_rows: references.len(),
        reference_keys: matches.len(),
        matched_reference_keys: matched,
        unmatched_reference_keys: matches.len() - matched,
        indexed_target_keys: index.len(),
        enriched_rows: records.len(),
        dropped_target_rows: targets.len() - records.len(),
        filtered_target_rows: targets.skipped + targets.out_of_window,
        skipped_reference_rows: references.skipped + skipped,
    };
    tracing::info!(
        enriched = summary.enriched_rows,
        dropped = summary.dropped_target_rows,
        indexed = summary.indexed_target_keys,
        "join complete"
    );

    let matches = matches
        .into_iter()
        .map(|g| MatchEntry {
            make_name: g
                .result
                .target_key
                .as_ref()
                .and_then(|k| k.make())
                .and_then(display_name),
            reference_key: g.result.reference_key,
            target_key: g.result.target_key,
            score: g.result.score,
            rows: g.rows,
        })
        .collect();

    let prices = index
        .iter()
        .map(|(key, price, contributors)| PriceEntry {
            target_key: key.clone(),
            price,
            contributors,
        })
        .collect();

    Ok(JoinResult {
        meta: JoinMeta {
            config_name: config.name.clone(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            cutoff: m.cutoff,
            metric: m.metric,
            prefix_len: m.prefix_len,
        },
        summary,
        matches,
        prices,
        index,
        records,
    })
}
