//! Core parsing logic for media filenames.
//!
//! The parser operates in three phases:
//! 1. Split the basename into stem and extension.
//! 2. Locate the season/episode marker (`S01E02`, `1x02`, `Season 1 Episode 2`).
//! 3. Normalize the leading text into the series token and collect the
//!    trailing descriptive tags.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use crate::types::{normalize_series, EpisodeKey, ParsedName};

/// `S01E02` and spaced/dotted variants.
static SEASON_EPISODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bS(\d{1,2})[._\s-]?E(\d{1,3})\b").expect("static regex")
});

/// `1x02` style markers.
static CROSS_STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,2})x(\d{2,3})\b").expect("static regex"));

/// `Season 1 Episode 2` style markers.
static VERBOSE_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bseason[._\s-]*(\d{1,2})[._\s-]*(?:episode|ep|e)[._\s-]*(\d{1,3})\b")
        .expect("static regex")
});

/// Token separator set used when collecting trailing tags.
static TAG_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^0-9A-Za-z+]+").expect("static regex"));

/// Language tokens excluded from descriptive tags.
const LANGUAGE_TOKENS: &[&str] = &["en", "eng", "english", "es", "esp", "spa", "spanish"];

/// Whether a token is a recognized language tag (`en`, `eng`, `spa`, ...).
///
/// Exposed so output naming can strip stale language tags the same way the
/// parser does.
pub fn is_language_tag(token: &str) -> bool {
    LANGUAGE_TOKENS
        .iter()
        .any(|lang| token.eq_ignore_ascii_case(lang))
}

/// Parse a filename into a [`ParsedName`].
///
/// Only the final path component is considered. Parsing is deterministic:
/// the same input always yields the same output.
///
/// # Examples
///
/// ```
/// use dubforge_parser::parse;
///
/// let parsed = parse("Show.Name.S01E02.1080p.WEB.mkv");
/// let key = parsed.key.unwrap();
/// assert_eq!(key.series, "Show Name");
/// assert_eq!((key.season, key.episode), (1, 2));
/// assert_eq!(parsed.tags, vec!["1080p", "WEB"]);
/// assert_eq!(parsed.extension, "mkv");
/// ```
pub fn parse(filename: &str) -> ParsedName {
    let base = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);

    let (stem, extension) = split_extension(base);

    // Dots, underscores and dashes act as word boundaries in release names
    // but not in the regex sense; map them to spaces before matching. The
    // replacement is 1:1, so match offsets remain valid for slicing.
    let cleaned: String = stem
        .chars()
        .map(|c| if matches!(c, '.' | '_' | '-') { ' ' } else { c })
        .collect();

    let marker = SEASON_EPISODE
        .captures(&cleaned)
        .or_else(|| CROSS_STYLE.captures(&cleaned))
        .or_else(|| VERBOSE_STYLE.captures(&cleaned));

    let Some(caps) = marker else {
        return ParsedName {
            key: None,
            tags: Vec::new(),
            extension,
        };
    };

    // Both capture groups are all-digit and length-bounded, so the parse
    // cannot overflow u32.
    let season: u32 = caps[1].parse().unwrap_or(0);
    let episode: u32 = caps[2].parse().unwrap_or(0);

    let whole = caps.get(0).expect("match exists");
    let series = &cleaned[..whole.start()];
    let tail = &cleaned[whole.end()..];

    let tags = TAG_SPLIT
        .split(tail)
        .filter(|t| !t.is_empty() && !is_language_tag(t))
        .map(str::to_string)
        .collect();

    ParsedName {
        key: Some(EpisodeKey {
            series: normalize_series(series),
            season,
            episode,
        }),
        tags,
        extension,
    }
}

/// Split a basename into stem and lowercased extension.
///
/// An extension is accepted only when it is 1-4 ASCII alphanumeric
/// characters, so `"Show Name - 1x02 [ES]"` keeps its bracket suffix in the
/// stem rather than losing it to a bogus extension.
fn split_extension(base: &str) -> (&str, String) {
    if let Some(idx) = base.rfind('.') {
        let ext = &base[idx + 1..];
        if !ext.is_empty() && ext.len() <= 4 && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return (&base[..idx], ext.to_lowercase());
        }
    }
    (base, String::new())
}

/// Normalize a filename into scene style: separators become single dots,
/// other special characters are dropped, and the extension is lowercased.
///
/// # Examples
///
/// ```
/// use dubforge_parser::normalize_filename;
///
/// assert_eq!(
///     normalize_filename("Show Name - 1x02 [1080p].MKV"),
///     "Show.Name.1x02.1080p.mkv"
/// );
/// ```
pub fn normalize_filename(filename: &str) -> String {
    let base = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);
    let (stem, extension) = split_extension(base);

    let mut out = String::with_capacity(stem.len());
    let mut pending_dot = false;
    for ch in stem.chars() {
        if ch == ' ' || ch == '_' || ch == '-' || ch == '.' {
            if !out.is_empty() {
                pending_dot = true;
            }
        } else if ch.is_alphanumeric() {
            if pending_dot {
                out.push('.');
                pending_dot = false;
            }
            out.push(ch);
        }
        // Everything else (brackets, quotes, etc.) is dropped.
    }

    if extension.is_empty() {
        out
    } else {
        format!("{out}.{extension}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_standard_marker() {
        let parsed = parse("Show.Name.S01E02.1080p.WEB.x264.mkv");
        let key = parsed.key.unwrap();
        assert_eq!(key.series, "Show Name");
        assert_eq!(key.season, 1);
        assert_eq!(key.episode, 2);
        assert_eq!(parsed.tags, vec!["1080p", "WEB", "x264"]);
        assert_eq!(parsed.extension, "mkv");
    }

    #[test]
    fn parses_cross_style_marker() {
        let parsed = parse("Show.Name.1x02.1080p.mkv");
        let key = parsed.key.unwrap();
        assert_eq!(key.series, "Show Name");
        assert_eq!((key.season, key.episode), (1, 2));
        assert_eq!(parsed.tags, vec!["1080p"]);
    }

    #[test]
    fn parses_verbose_marker() {
        let parsed = parse("Show Name Season 1 Episode 2.mp4");
        let key = parsed.key.unwrap();
        assert_eq!(key.series, "Show Name");
        assert_eq!((key.season, key.episode), (1, 2));
        assert!(parsed.tags.is_empty());
        assert_eq!(parsed.extension, "mp4");
    }

    #[test]
    fn separator_and_case_invariance() {
        let variants = [
            "Show.Name.S01E02.mkv",
            "Show_Name_s01e02.mkv",
            "show name 1x02.mkv",
            "SHOW.NAME.Season 1 Episode 2.mkv",
        ];
        let keys: Vec<_> = variants
            .iter()
            .map(|v| parse(v).key.expect("key expected"))
            .collect();
        for key in &keys[1..] {
            assert_eq!(&keys[0], key, "expected all variants to agree");
        }
    }

    #[test]
    fn language_tokens_stripped_from_tags() {
        let parsed = parse("Show Name - 1x02 [ES].mp4");
        let key = parsed.key.unwrap();
        assert_eq!(key.series, "Show Name");
        assert_eq!((key.season, key.episode), (1, 2));
        assert!(parsed.tags.is_empty(), "got {:?}", parsed.tags);

        let parsed = parse("Show.Name.S02E05.1080p.spa.mkv");
        assert_eq!(parsed.tags, vec!["1080p"]);
    }

    #[test]
    fn no_marker_yields_no_key() {
        let parsed = parse("Some.Movie.2021.1080p.mkv");
        assert!(parsed.key.is_none());
        assert_eq!(parsed.extension, "mkv");
    }

    #[test]
    fn resolution_not_mistaken_for_marker() {
        // 1920x1080 must not parse as season 19 episode 20.
        let parsed = parse("Some.Movie.1920x1080.mkv");
        assert!(parsed.key.is_none());
    }

    #[test]
    fn path_components_ignored() {
        let parsed = parse("/mnt/media/tv/Show.Name.S03E07.720p.mkv");
        let key = parsed.key.unwrap();
        assert_eq!(key.series, "Show Name");
        assert_eq!((key.season, key.episode), (3, 7));
    }

    #[test]
    fn deterministic() {
        let a = parse("Show.Name.S01E02.1080p.mkv");
        let b = parse("Show.Name.S01E02.1080p.mkv");
        assert_eq!(a, b);
    }

    #[test]
    fn spaced_marker_variant() {
        let parsed = parse("Show Name S01 E02 720p.mkv");
        let key = parsed.key.unwrap();
        assert_eq!((key.season, key.episode), (1, 2));
        assert_eq!(parsed.tags, vec!["720p"]);
    }

    #[test]
    fn normalize_basic() {
        assert_eq!(
            normalize_filename("Show Name - 1x02 [1080p].MKV"),
            "Show.Name.1x02.1080p.mkv"
        );
        assert_eq!(
            normalize_filename("Some_Movie (2021).mp4"),
            "Some.Movie.2021.mp4"
        );
    }

    #[test]
    fn normalize_collapses_runs_and_trims() {
        assert_eq!(normalize_filename("..A  --  B..mkv"), "A.B.mkv");
        assert_eq!(normalize_filename("plain"), "plain");
    }

    #[test]
    fn empty_extension_handling() {
        let parsed = parse("Show.Name.S01E02");
        assert!(parsed.key.is_some());
        assert_eq!(parsed.extension, "");
    }
}
