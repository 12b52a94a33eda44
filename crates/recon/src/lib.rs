//! `carjoin-recon`: approximate key-matching join engine.
//!
//! Pure engine crate: receives pre-loaded tables, returns the price index
//! and the enriched rows. No CLI or network dependencies.

pub mod aggregate;
pub mod config;
pub mod engine;
pub mod error;
pub mod key;
pub mod makes;
pub mod matcher;
pub mod merge;
pub mod model;
pub mod similarity;
pub mod table;

pub use aggregate::{aggregate, AggregateOptions, AggregatedIndex, Aggregation};
pub use config::JoinConfig;
pub use engine::run;
pub use error::JoinError;
pub use key::{build_abbrev_key, build_full_key, CanonicalKey, VehicleFields};
pub use matcher::{find_best_match, CandidateSet, FuzzyMatcher, MatchResult};
pub use merge::{merge, write_enriched_csv, CsvOptions, EnrichedRecord};
pub use model::{JoinResult, JoinSummary};
pub use similarity::SimilarityMetric;
pub use table::{ReferenceRecord, ReferenceTable, TargetRecord, TargetTable};
