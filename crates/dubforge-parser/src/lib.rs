//! Dubforge-Parser: episode-key extraction from media filenames.
//!
//! A small, dependency-light parser that recovers `{series, season, episode}`
//! identity plus leftover descriptive tags from release-style filenames. Pure
//! functions only; no I/O.
//!
//! # Examples
//!
//! ```
//! use dubforge_parser::parse;
//!
//! let parsed = parse("Show.Name.1x02.1080p.mkv");
//! let key = parsed.key.unwrap();
//! assert_eq!(key.series, "Show Name");
//! assert_eq!((key.season, key.episode), (1, 2));
//! ```

mod parser;
mod types;

pub use parser::{is_language_tag, normalize_filename, parse};
pub use types::{normalize_series, EpisodeKey, ParsedName};
