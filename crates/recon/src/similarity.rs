//! String similarity ratios in `[0, 1]`.
//!
//! The default metric is the longest-matching-blocks ratio
//! (Ratcliff/Obershelp): find the longest common run of characters, recurse
//! on the pieces left and right of it, and score `2·M / (|a| + |b|)` where `M`
//! is the total length of all runs found. Identical strings score 1.0.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    /// Longest-matching-blocks ratio.
    #[default]
    Sequence,
    /// `1 - levenshtein / max_len`.
    Levenshtein,
    /// Jaro-Winkler.
    JaroWinkler,
}

impl SimilarityMetric {
    pub fn ratio(self, a: &str, b: &str) -> f64 {
        match self {
            Self::Sequence => sequence_ratio(a, b),
            Self::Levenshtein => strsim::normalized_levenshtein(a, b),
            Self::JaroWinkler => strsim::jaro_winkler(a, b),
        }
    }

    /// A value `>= ratio(a, b)` that is cheaper to compute.
    ///
    /// Only the sequence metric has a useful bound; the others return 1.0.
    pub fn upper_bound(self, a: &str, b: &str) -> f64 {
        match self {
            Self::Sequence => {
                let rq = real_quick_ratio(a, b);
                if rq == 0.0 {
                    return rq;
                }
                quick_ratio(a, b).min(rq)
            }
            Self::Levenshtein | Self::JaroWinkler => 1.0,
        }
    }
}

impl std::fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sequence => write!(f, "sequence"),
            Self::Levenshtein => write!(f, "levenshtein"),
            Self::JaroWinkler => write!(f, "jaro_winkler"),
        }
    }
}

impl FromStr for SimilarityMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sequence" => Ok(Self::Sequence),
            "levenshtein" => Ok(Self::Levenshtein),
            "jaro_winkler" | "jaro-winkler" => Ok(Self::JaroWinkler),
            other => Err(format!(
                "unknown metric '{other}' (expected sequence, levenshtein or jaro_winkler)"
            )),
        }
    }
}

fn ratio_of(matches: usize, total: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        2.0 * matches as f64 / total as f64
    }
}

/// Longest-matching-blocks ratio over characters.
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio_of(matching_chars(&a, &b), a.len() + b.len())
}

/// Upper bound from the character multisets alone.
pub fn quick_ratio(a: &str, b: &str) -> f64 {
    let mut avail: HashMap<char, usize> = HashMap::new();
    for c in b.chars() {
        *avail.entry(c).or_insert(0) += 1;
    }
    let mut matches = 0;
    let mut len_a = 0;
    for c in a.chars() {
        len_a += 1;
        if let Some(n) = avail.get_mut(&c) {
            if *n > 0 {
                *n -= 1;
                matches += 1;
            }
        }
    }
    ratio_of(matches, len_a + b.chars().count())
}

/// Upper bound from the lengths alone.
pub fn real_quick_ratio(a: &str, b: &str) -> f64 {
    let la = a.chars().count();
    let lb = b.chars().count();
    ratio_of(la.min(lb), la + lb)
}

/// Total size of the matching blocks between `a` and `b`.
fn matching_chars(a: &[char], b: &[char]) -> usize {
    let mut total = 0;
    let mut queue = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let (i, j, k) = longest_match(a, b, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }
        total += k;
        if alo < i && blo < j {
            queue.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            queue.push((i + k, ahi, j + k, bhi));
        }
    }

    total
}

/// Longest common run in `a[alo..ahi]` and `b[blo..bhi]`.
///
/// Returns `(i, j, k)` with `a[i..i+k] == b[j..j+k]`. Among runs of equal
/// length, the one starting earliest in `a` wins, then earliest in `b`.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let width = bhi - blo;
    let mut best = (alo, blo, 0);
    // prev[x] = length of the run ending at a[i-1], b[blo + x - 1]
    let mut prev = vec![0usize; width + 1];
    let mut cur = vec![0usize; width + 1];

    for i in alo..ahi {
        for j in blo..bhi {
            let x = j - blo + 1;
            if a[i] == b[j] {
                let k = prev[x - 1] + 1;
                cur[x] = k;
                if k > best.2 {
                    best = (i + 1 - k, j + 1 - k, k);
                }
            } else {
                cur[x] = 0;
            }
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    best
}
