//! Episode-matching engine: pairs VO and ES candidates by episode key.
//!
//! The matcher is deliberately conservative. An episode number with more
//! than one candidate on either side is reported as ambiguous and excluded
//! from automatic pairing — a wrong silent merge destroys the original file
//! irreversibly, so ambiguity is surfaced to the caller, never resolved by
//! picking "the first" or "the best-scoring" candidate.

use dubforge_parser::{normalize_series, parse, EpisodeKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One scanned file, with its parsed episode identity when available.
///
/// Immutable once scanned. `parsed == None` means the filename yielded no
/// confident season/episode pair; such candidates never enter matching but
/// are reported back as unmatched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Full path of the file.
    pub path: PathBuf,
    /// Basename, kept for display.
    pub name: String,
    /// Parsed episode identity, if the filename carried one.
    pub parsed: Option<EpisodeKey>,
}

impl Candidate {
    /// Build a candidate from a path, parsing its basename.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let parsed = parse(&name).key;
        Self { path, name, parsed }
    }
}

/// A VO/ES pairing for one episode.
///
/// Invariant: exactly one VO and one ES candidate existed for `key` when the
/// pair was emitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedPair {
    /// The episode identity both candidates share.
    pub key: EpisodeKey,
    /// The original-language file.
    pub vo_file: Candidate,
    /// The dubbed file.
    pub es_file: Candidate,
}

/// Everything `match_candidates` found.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// Unambiguous VO/ES pairs, ordered by episode number.
    pub pairs: Vec<MatchedPair>,
    /// VO candidates with no ES counterpart, plus unparsable VO files.
    pub unmatched_vo: Vec<Candidate>,
    /// ES candidates with no VO counterpart, plus unparsable ES files.
    pub unmatched_es: Vec<Candidate>,
    /// Episode keys excluded from pairing because either side had more than
    /// one candidate.
    pub ambiguous: Vec<EpisodeKey>,
}

/// Pair VO and ES candidates for one series/season query.
///
/// Both candidate lists are filtered to entries whose parsed series
/// fuzzy-matches `series_filter` (case-insensitive normalized equality or
/// substring) and whose season equals `season_filter`. A `None` season
/// filter short-circuits season filtering; a `None` series filter accepts
/// every series. Candidates rejected by the filters are out of the query's
/// scope and dropped from the result; unparsable candidates are reported
/// unmatched.
///
/// Empty candidate lists yield empty results, not an error.
pub fn match_candidates(
    vo_candidates: Vec<Candidate>,
    es_candidates: Vec<Candidate>,
    series_filter: Option<&str>,
    season_filter: Option<u32>,
) -> MatchOutcome {
    let mut outcome = MatchOutcome::default();

    // Episode number -> (vo, es) groups, ordered for deterministic output.
    let mut groups: BTreeMap<u32, (Vec<Candidate>, Vec<Candidate>)> = BTreeMap::new();

    let normalized_filter = series_filter.map(|s| normalize_series(s).to_lowercase());

    let mut route = |candidate: Candidate, is_vo: bool| {
        let Some(key) = candidate.parsed.clone() else {
            // No episode identity: cannot be matched, but the caller should
            // still see it.
            if is_vo {
                outcome.unmatched_vo.push(candidate);
            } else {
                outcome.unmatched_es.push(candidate);
            }
            return;
        };

        if let Some(filter) = &normalized_filter {
            if !series_matches(filter, &key.series) {
                return;
            }
        }
        if let Some(season) = season_filter {
            if key.season != season {
                return;
            }
        }

        let entry = groups.entry(key.episode).or_default();
        if is_vo {
            entry.0.push(candidate);
        } else {
            entry.1.push(candidate);
        }
    };

    for candidate in vo_candidates {
        route(candidate, true);
    }
    for candidate in es_candidates {
        route(candidate, false);
    }

    for (_, (vo_group, es_group)) in groups {
        match (vo_group.len(), es_group.len()) {
            (1, 1) => {
                let vo_file = vo_group.into_iter().next().expect("len checked");
                let es_file = es_group.into_iter().next().expect("len checked");
                let key = vo_file.parsed.clone().expect("routed with key");
                outcome.pairs.push(MatchedPair {
                    key,
                    vo_file,
                    es_file,
                });
            }
            (0, _) => outcome.unmatched_es.extend(es_group),
            (_, 0) => outcome.unmatched_vo.extend(vo_group),
            _ => {
                // More than one candidate on at least one side.
                let key = vo_group
                    .first()
                    .or(es_group.first())
                    .and_then(|c| c.parsed.clone())
                    .expect("routed with key");
                outcome.ambiguous.push(key);
            }
        }
    }

    outcome
}

/// Fuzzy series comparison: normalized case-insensitive equality or
/// substring containment.
fn series_matches(normalized_filter: &str, candidate_series: &str) -> bool {
    let candidate = candidate_series.to_lowercase();
    candidate == *normalized_filter || candidate.contains(normalized_filter)
}
