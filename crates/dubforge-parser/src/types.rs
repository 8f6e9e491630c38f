//! Output types for the filename parser.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Normalized identity of one episode of one series.
///
/// Two files carrying equal keys are the same content unit. Equality (and
/// hashing) on the series token is case-insensitive; separator variants are
/// collapsed at construction time, so `"Show.Name"`, `"show_name"` and
/// `"Show Name"` all produce equal keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeKey {
    /// Series token, separator-normalized to single spaces.
    pub series: String,
    /// Season number.
    pub season: u32,
    /// Episode number.
    pub episode: u32,
}

impl EpisodeKey {
    /// Build a key, normalizing the series token (dots, underscores, dashes
    /// and runs of whitespace collapse to single spaces; edges trimmed).
    pub fn new(series: &str, season: u32, episode: u32) -> Self {
        Self {
            series: normalize_series(series),
            season,
            episode,
        }
    }
}

impl PartialEq for EpisodeKey {
    fn eq(&self, other: &Self) -> bool {
        self.season == other.season
            && self.episode == other.episode
            && self.series.eq_ignore_ascii_case(&other.series)
    }
}

impl Eq for EpisodeKey {}

impl Hash for EpisodeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.series.to_lowercase().hash(state);
        self.season.hash(state);
        self.episode.hash(state);
    }
}

impl std::fmt::Display for EpisodeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} S{:02}E{:02}", self.series, self.season, self.episode)
    }
}

/// Collapse separators in a series token to single spaces.
///
/// Used both when constructing keys and when normalizing a user-supplied
/// series filter so the two compare on equal footing.
pub fn normalize_series(series: &str) -> String {
    let mut out = String::with_capacity(series.len());
    let mut pending_space = false;
    for ch in series.chars() {
        if ch == '.' || ch == '_' || ch == '-' || ch.is_whitespace() {
            if !out.is_empty() {
                pending_space = true;
            }
        } else {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(ch);
        }
    }
    out
}

/// Structured result of parsing one filename.
///
/// `key` is `None` when no season/episode marker was found; such files are
/// still usable for 1:1 movie pairing. `tags` preserves the descriptive
/// tokens after the marker (resolution, source, release group) for output
/// naming, with language tokens stripped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedName {
    /// Episode identity, when a season/episode marker was recognized.
    pub key: Option<EpisodeKey>,
    /// Descriptive tokens following the marker, in input order.
    pub tags: Vec<String>,
    /// Lowercased file extension without the dot; empty when absent.
    pub extension: String,
}
