use serde::Deserialize;

use crate::error::JoinError;
use crate::key::DEFAULT_PREFIX_LEN;
use crate::matcher::{FuzzyMatcher, DEFAULT_CUTOFF};
use crate::similarity::SimilarityMetric;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct JoinConfig {
    pub name: String,
    pub target: TargetConfig,
    pub reference: ReferenceConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

// ---------------------------------------------------------------------------
// Target
// ---------------------------------------------------------------------------

/// The dataset being enriched.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    pub file: String,
    #[serde(default)]
    pub columns: TargetColumns,
    #[serde(default)]
    pub filter: AgeFilter,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetColumns {
    #[serde(default = "default_target_year")]
    pub year: String,
    #[serde(default = "default_target_make")]
    pub make: String,
    #[serde(default = "default_target_model")]
    pub model: String,
}

impl Default for TargetColumns {
    fn default() -> Self {
        Self {
            year: default_target_year(),
            make: default_target_make(),
            model: default_target_model(),
        }
    }
}

fn default_target_year() -> String {
    "vehicle_year".into()
}

fn default_target_make() -> String {
    "vehicle_make".into()
}

fn default_target_model() -> String {
    "vehicle_model".into()
}

/// Keeps rows whose age (`reference_year - year`) lies in `[min_age, max_age]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AgeFilter {
    #[serde(default = "default_reference_year")]
    pub reference_year: i32,
    #[serde(default)]
    pub min_age: i32,
    #[serde(default = "default_max_age")]
    pub max_age: i32,
}

impl Default for AgeFilter {
    fn default() -> Self {
        Self {
            reference_year: default_reference_year(),
            min_age: 0,
            max_age: default_max_age(),
        }
    }
}

impl AgeFilter {
    /// Years whose age does not fit in an `i32` are outside every window.
    pub fn accepts(&self, year: i32) -> bool {
        self.reference_year
            .checked_sub(year)
            .is_some_and(|age| (self.min_age..=self.max_age).contains(&age))
    }
}

fn default_reference_year() -> i32 {
    2022
}

fn default_max_age() -> i32 {
    30
}

// ---------------------------------------------------------------------------
// Reference
// ---------------------------------------------------------------------------

/// The dataset supplying prices. `source` is a path or an http(s) URL.
#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceConfig {
    pub source: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub columns: ReferenceColumns,
}

impl ReferenceConfig {
    pub fn is_remote(&self) -> bool {
        self.source.starts_with("https://") || self.source.starts_with("http://")
    }
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceColumns {
    #[serde(default = "default_ref_year")]
    pub year: String,
    #[serde(default = "default_ref_make_model")]
    pub make_model: String,
    #[serde(default = "default_ref_price")]
    pub price: String,
}

impl Default for ReferenceColumns {
    fn default() -> Self {
        Self {
            year: default_ref_year(),
            make_model: default_ref_make_model(),
            price: default_ref_price(),
        }
    }
}

fn default_ref_year() -> String {
    "year".into()
}

fn default_ref_make_model() -> String {
    "make_model".into()
}

fn default_ref_price() -> String {
    "price".into()
}

// ---------------------------------------------------------------------------
// Matching + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingConfig {
    #[serde(default = "default_cutoff")]
    pub cutoff: f64,
    #[serde(default)]
    pub metric: SimilarityMetric,
    #[serde(default = "default_prefix_len")]
    pub prefix_len: usize,
    /// Match reference keys on the rayon thread pool.
    #[serde(default)]
    pub parallel: bool,
    /// Reference keys per parallel work unit.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            cutoff: default_cutoff(),
            metric: SimilarityMetric::default(),
            prefix_len: default_prefix_len(),
            parallel: false,
            chunk_size: default_chunk_size(),
        }
    }
}

impl MatchingConfig {
    pub fn matcher(&self) -> FuzzyMatcher {
        FuzzyMatcher::new(self.cutoff, self.metric)
    }
}

fn default_cutoff() -> f64 {
    DEFAULT_CUTOFF
}

fn default_prefix_len() -> usize {
    DEFAULT_PREFIX_LEN
}

fn default_chunk_size() -> usize {
    256
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub file: Option<String>,
    /// Also write the derived `make_model` key column.
    #[serde(default)]
    pub include_key: bool,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl JoinConfig {
    pub fn from_toml(input: &str) -> Result<Self, JoinError> {
        let config: JoinConfig =
            toml::from_str(input).map_err(|e| JoinError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), JoinError> {
        let m = &self.matching;
        if !(0.0..=1.0).contains(&m.cutoff) {
            return Err(JoinError::ConfigValidation(format!(
                "matching.cutoff must be within [0, 1], got {}",
                m.cutoff
            )));
        }
        if m.prefix_len == 0 {
            return Err(JoinError::ConfigValidation("matching.prefix_len must be at least 1".into()));
        }
        if m.chunk_size == 0 {
            return Err(JoinError::ConfigValidation("matching.chunk_size must be at least 1".into()));
        }

        let f = &self.target.filter;
        if f.min_age > f.max_age {
            return Err(JoinError::ConfigValidation(format!(
                "target.filter: min_age ({}) exceeds max_age ({})",
                f.min_age, f.max_age
            )));
        }

        if self.reference.timeout_secs == 0 {
            return Err(JoinError::ConfigValidation(
                "reference.timeout_secs must be at least 1".into(),
            ));
        }
        if self.target.file.trim().is_empty() {
            return Err(JoinError::ConfigValidation("target.file is empty".into()));
        }
        if self.reference.source.trim().is_empty() {
            return Err(JoinError::ConfigValidation("reference.source is empty".into()));
        }

        let tc = &self.target.columns;
        let rc = &self.reference.columns;
        for (name, value) in [
            ("target.columns.year", &tc.year),
            ("target.columns.make", &tc.make),
            ("target.columns.model", &tc.model),
            ("reference.columns.year", &rc.year),
            ("reference.columns.make_model", &rc.make_model),
            ("reference.columns.price", &rc.price),
        ] {
            if value.trim().is_empty() {
                return Err(JoinError::ConfigValidation(format!("{name} is empty")));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
