use std::collections::HashSet;

use serde::Serialize;

use crate::key::CanonicalKey;
use crate::similarity::SimilarityMetric;

pub const DEFAULT_CUTOFF: f64 = 0.6;

/// Distinct target keys in first-appearance order.
///
/// Iteration order decides ties, so it must not depend on hashing.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    keys: Vec<CanonicalKey>,
}

impl CandidateSet {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CanonicalKey> {
        self.keys.iter()
    }
}

impl FromIterator<CanonicalKey> for CandidateSet {
    fn from_iter<I: IntoIterator<Item = CanonicalKey>>(iter: I) -> Self {
        let mut seen = HashSet::new();
        let keys = iter
            .into_iter()
            .filter(|k| seen.insert(k.clone()))
            .collect();
        Self { keys }
    }
}

/// Outcome of matching one reference key against the target key universe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub reference_key: CanonicalKey,
    /// Best target key at or above the cutoff; `None` when nothing qualified.
    pub target_key: Option<CanonicalKey>,
    /// Score of `target_key`, or the best score seen when unmatched.
    pub score: f64,
}

impl MatchResult {
    pub fn is_match(&self) -> bool {
        self.target_key.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzyMatcher {
    pub cutoff: f64,
    pub metric: SimilarityMetric,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self {
            cutoff: DEFAULT_CUTOFF,
            metric: SimilarityMetric::default(),
        }
    }
}

impl FuzzyMatcher {
    pub fn new(cutoff: f64, metric: SimilarityMetric) -> Self {
        Self { cutoff, metric }
    }

    /// Highest-scoring candidate with score `>= cutoff`.
    ///
    /// Ties go to the candidate seen first. An empty query or an empty
    /// candidate set never matches.
    pub fn find_best_match(
        &self,
        query: &CanonicalKey,
        candidates: &CandidateSet,
    ) -> Option<(CanonicalKey, f64)> {
        let (best, score) = self.search(query, candidates);
        best.map(|k| (k.clone(), score))
    }

    /// Like [`find_best_match`](Self::find_best_match) but keeps the
    /// near-miss score for reporting.
    pub fn match_key(&self, query: &CanonicalKey, candidates: &CandidateSet) -> MatchResult {
        let (best, score) = self.search(query, candidates);
        match best {
            Some(k) => tracing::debug!(query = %query, target = %k, score, "matched"),
            None => tracing::debug!(query = %query, best_score = score, "no match"),
        }
        MatchResult {
            reference_key: query.clone(),
            target_key: best.cloned(),
            score,
        }
    }

    fn search<'c>(
        &self,
        query: &CanonicalKey,
        candidates: &'c CandidateSet,
    ) -> (Option<&'c CanonicalKey>, f64) {
        if query.is_empty() {
            return (None, 0.0);
        }

        let q = query.as_str();
        let mut best: Option<&CanonicalKey> = None;
        let mut best_score = 0.0_f64;
        let mut near_miss = 0.0_f64;

        for candidate in candidates.iter() {
            let c = candidate.as_str();
            let bound = self.metric.upper_bound(q, c);
            // At best a tie with the leader; ties keep the first.
            if best.is_some() && bound <= best_score {
                continue;
            }
            if bound < self.cutoff && bound <= near_miss {
                continue;
            }
            let score = self.metric.ratio(q, c);
            if score >= self.cutoff && (best.is_none() || score > best_score) {
                best = Some(candidate);
                best_score = score;
            } else if best.is_none() {
                near_miss = near_miss.max(score);
            }
        }

        match best {
            Some(_) => (best, best_score),
            None => (None, near_miss),
        }
    }
}

/// Best match for `query` among `candidates` using the default metric.
pub fn find_best_match(
    query: &CanonicalKey,
    candidates: &CandidateSet,
    cutoff: f64,
) -> Option<(CanonicalKey, f64)> {
    FuzzyMatcher::new(cutoff, SimilarityMetric::default()).find_best_match(query, candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(keys: &[&str]) -> CandidateSet {
        keys.iter().map(|k| CanonicalKey::from(*k)).collect()
    }

    #[test]
    fn candidate_set_dedups_in_first_seen_order() {
        let s = set(&["2020 FORD F150", "2019 HONDA CIVIC", "2020 FORD F150"]);
        let keys: Vec<&str> = s.iter().map(|k| k.as_str()).collect();
        assert_eq!(keys, ["2020 FORD F150", "2019 HONDA CIVIC"]);
    }

    #[test]
    fn abbreviated_key_finds_full_key() {
        let s = set(&["2019 HONDA CIVIC", "2022 TOYOTA CAMRY", "2022 TOYOTA COROLLA"]);
        let (key, score) = find_best_match(&"2022 TOY CAM".into(), &s, 0.6).unwrap();
        assert_eq!(key.as_str(), "2022 TOYOTA CAMRY");
        assert!(score >= 0.6);
    }

    #[test]
    fn below_cutoff_is_no_match() {
        let s = set(&["2022 TOYOTA CAMRY"]);
        assert!(find_best_match(&"1999 YUG SED".into(), &s, 0.6).is_none());
    }

    #[test]
    fn empty_inputs_never_match() {
        assert!(find_best_match(&"2022 TOY CAM".into(), &CandidateSet::default(), 0.0).is_none());
        let s = set(&["2022 TOYOTA CAMRY"]);
        assert!(find_best_match(&CanonicalKey::from(""), &s, 0.0).is_none());
    }

    #[test]
    fn ties_go_to_first_candidate() {
        // Same length and same matching blocks against the query.
        let s = set(&["2020 ABX", "2020 ABY"]);
        let (key, _) = find_best_match(&"2020 AB".into(), &s, 0.5).unwrap();
        assert_eq!(key.as_str(), "2020 ABX");

        let s = set(&["2020 ABY", "2020 ABX"]);
        let (key, _) = find_best_match(&"2020 AB".into(), &s, 0.5).unwrap();
        assert_eq!(key.as_str(), "2020 ABY");
    }

    #[test]
    fn exact_match_wins() {
        let s = set(&["2021 RAM 1500", "2021 RAM X"]);
        let (key, score) = find_best_match(&"2021 RAM X".into(), &s, 0.6).unwrap();
        assert_eq!(key.as_str(), "2021 RAM X");
        assert_eq!(score, 1.0);
    }

    #[test]
    fn unmatched_result_reports_best_score() {
        let m = FuzzyMatcher::new(0.99, SimilarityMetric::Sequence);
        let s = set(&["2022 TOYOTA CAMRY"]);
        let r = m.match_key(&"2022 TOY CAM".into(), &s);
        assert!(!r.is_match());
        assert!(r.score > 0.8 && r.score < 0.99);
    }

    #[test]
    fn other_metrics_respect_cutoff() {
        let s = set(&["2022 TOYOTA CAMRY", "1999 SAAB 900"]);
        for metric in [SimilarityMetric::Levenshtein, SimilarityMetric::JaroWinkler] {
            let m = FuzzyMatcher::new(0.6, metric);
            let (key, score) = m.find_best_match(&"2022 TOY CAM".into(), &s).unwrap();
            assert_eq!(key.as_str(), "2022 TOYOTA CAMRY", "{metric}");
            assert!(score >= 0.6);
        }
    }
}
