//! Row search for the data grid.
//!
//! Two matching modes are available:
//!
//! - [`SearchMode::Fuzzy`]: approximate matching. Each candidate value gets
//!   an error score in `[0, 1]` (0 is a perfect match); rows whose best
//!   score is within the threshold are kept, best match first.
//! - [`SearchMode::Substring`]: case-insensitive containment, input order.
//!
//! Values are gathered through the configured key paths, fanning out over
//! sequences. With no key paths every scalar in the row is searched.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use trellis_core::logging::targets;

use super::record::{FieldPath, Record, leaf_values, value_text};

/// Default error threshold for fuzzy matches.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.4;

/// Maximum score contribution of where an exact match starts.
const LOCATION_PENALTY: f64 = 0.1;

/// How search text is matched against row values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Approximate matching ranked by score.
    #[default]
    Fuzzy,
    /// Case-insensitive substring matching.
    Substring,
}

/// A row that passed the search, with its best score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    /// Source row index.
    pub row: usize,
    /// Error score, 0 being a perfect match.
    pub score: f64,
}

/// Scores `needle` against `haystack`.
///
/// Both inputs are expected to be lowercased already. Returns 0 for an exact
/// match at the start, a small location-dependent score for exact matches
/// further in, and otherwise one minus the best normalized edit similarity
/// between the needle and any same-length (or one longer) window of the
/// haystack.
pub fn fuzzy_score(needle: &str, haystack: &str) -> f64 {
    if needle.is_empty() {
        return 0.0;
    }
    if haystack.is_empty() {
        return 1.0;
    }

    if let Some(byte_pos) = haystack.find(needle) {
        let pos = haystack[..byte_pos].chars().count();
        let len = haystack.chars().count().max(1);
        return LOCATION_PENALTY * pos as f64 / len as f64;
    }

    let hay: Vec<char> = haystack.chars().collect();
    let width = needle.chars().count();

    let mut best = 0.0_f64;
    if hay.len() <= width + 1 {
        best = strsim::normalized_damerau_levenshtein(needle, haystack);
    } else {
        for window in [width, width + 1] {
            for start in 0..=hay.len() - window {
                let candidate: String = hay[start..start + window].iter().collect();
                let similarity = strsim::normalized_damerau_levenshtein(needle, &candidate);
                if similarity > best {
                    best = similarity;
                }
            }
        }
    }

    (1.0 - best).clamp(LOCATION_PENALTY, 1.0)
}

/// Gathers the searchable values of a row.
fn candidates<'a, R: Record>(row: &'a R, keys: &[FieldPath]) -> Vec<&'a Value> {
    let mut out = Vec::new();
    if keys.is_empty() {
        for value in row.top_level_values() {
            leaf_values(value, &mut out);
        }
    } else {
        for key in keys {
            row.collect(key, &mut out);
        }
    }
    out
}

/// Best fuzzy score of a row, or `None` if it has no searchable text.
fn row_score<R: Record>(row: &R, needle: &str, keys: &[FieldPath]) -> Option<f64> {
    candidates(row, keys)
        .into_iter()
        .filter_map(value_text)
        .map(|text| fuzzy_score(needle, &text.to_lowercase()))
        .min_by(f64::total_cmp)
}

fn row_contains<R: Record>(row: &R, needle: &str, keys: &[FieldPath]) -> bool {
    candidates(row, keys)
        .into_iter()
        .filter_map(value_text)
        .any(|text| text.to_lowercase().contains(needle))
}

/// Filters `rows` by `text`.
///
/// An empty (or whitespace-only) search keeps every row in input order.
/// Fuzzy hits are ordered by ascending score; equal scores keep input order.
pub fn search_rows<R: Record>(
    rows: &[R],
    text: &str,
    keys: &[FieldPath],
    mode: SearchMode,
    threshold: f64,
) -> Vec<SearchHit> {
    let needle = text.trim().to_lowercase();
    if needle.is_empty() {
        return (0..rows.len())
            .map(|row| SearchHit { row, score: 0.0 })
            .collect();
    }

    match mode {
        SearchMode::Substring => rows
            .iter()
            .enumerate()
            .filter(|(_, r)| row_contains(*r, &needle, keys))
            .map(|(row, _)| SearchHit { row, score: 0.0 })
            .collect(),
        SearchMode::Fuzzy => {
            let mut hits: Vec<SearchHit> = rows
                .iter()
                .enumerate()
                .filter_map(|(row, r)| {
                    row_score(r, &needle, keys)
                        .filter(|score| *score <= threshold)
                        .map(|score| SearchHit { row, score })
                })
                .collect();
            hits.sort_by(|a, b| a.score.total_cmp(&b.score));
            tracing::trace!(
                target: targets::SEARCH,
                needle = %needle,
                hits = hits.len(),
                "fuzzy search"
            );
            hits
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows() -> Vec<Value> {
        vec![
            json!({ "name": "alice", "bmc": { "name": "bmc-7" } }),
            json!({ "name": "bob", "bmc": { "name": "bmc-alpha" } }),
            json!({ "name": "malice", "interfaces": [{ "mac": "aa:bb" }] }),
            json!({ "name": "carol" }),
        ]
    }

    fn hit_rows(hits: &[SearchHit]) -> Vec<usize> {
        hits.iter().map(|h| h.row).collect()
    }

    #[test]
    fn test_score_exact_and_location() {
        assert_eq!(fuzzy_score("node", "node-1"), 0.0);
        let later = fuzzy_score("node", "big-node");
        assert!(later > 0.0 && later <= LOCATION_PENALTY);
        assert_eq!(fuzzy_score("x", ""), 1.0);
    }

    #[test]
    fn test_score_typo_beats_threshold() {
        let typo = fuzzy_score("alcie", "alice");
        assert!(typo <= DEFAULT_MATCH_THRESHOLD, "score was {typo}");
        assert!(typo >= LOCATION_PENALTY);
        assert!(fuzzy_score("zzz", "alice") > DEFAULT_MATCH_THRESHOLD);
    }

    #[test]
    fn test_empty_search_keeps_order() {
        let rows = rows();
        let hits = search_rows(&rows, "  ", &[], SearchMode::Fuzzy, DEFAULT_MATCH_THRESHOLD);
        assert_eq!(hit_rows(&hits), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_fuzzy_ranks_best_first() {
        let rows = rows();
        let keys = vec![FieldPath::parse("name")];
        let hits = search_rows(&rows, "malice", &keys, SearchMode::Fuzzy, DEFAULT_MATCH_THRESHOLD);
        assert_eq!(hits[0].row, 2);
        assert!(hit_rows(&hits).contains(&0));
        assert!(!hit_rows(&hits).contains(&3));
    }

    #[test]
    fn test_fuzzy_no_match_is_empty() {
        let rows = rows();
        let keys = vec![FieldPath::parse("name")];
        let hits = search_rows(&rows, "qqqqqq", &keys, SearchMode::Fuzzy, DEFAULT_MATCH_THRESHOLD);
        assert!(hits.is_empty());
    }

    #[test]
    fn test_keys_restrict_search() {
        let rows = rows();
        let keys = vec![FieldPath::parse("bmc.name")];
        let hits = search_rows(&rows, "alpha", &keys, SearchMode::Substring, 0.0);
        assert_eq!(hit_rows(&hits), vec![1]);
    }

    #[test]
    fn test_substring_without_keys_searches_everything() {
        let rows = rows();
        let hits = search_rows(&rows, "AA:BB", &[], SearchMode::Substring, 0.0);
        assert_eq!(hit_rows(&hits), vec![2]);
    }

    #[test]
    fn test_fanned_out_keys() {
        let rows = rows();
        let keys = vec![FieldPath::parse("interfaces.mac")];
        let hits = search_rows(&rows, "aa:bb", &keys, SearchMode::Fuzzy, DEFAULT_MATCH_THRESHOLD);
        assert_eq!(hit_rows(&hits), vec![2]);
    }
}
