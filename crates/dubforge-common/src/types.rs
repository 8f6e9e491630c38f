//! Core enums shared across the dubforge crates.

use serde::{Deserialize, Serialize};

/// What kind of content a submission processes.
///
/// TV pairs are discovered by the matching engine; movie pairs are selected
/// manually (1:1) and need no episode key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMode {
    /// Manually selected 1:1 pairing.
    Movie,
    /// Episode-key based pairing for series content.
    Tv,
}

impl std::fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingMode::Movie => write!(f, "movie"),
            ProcessingMode::Tv => write!(f, "tv"),
        }
    }
}

/// Which side of a VO/ES pair a file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackSide {
    /// Original-language version: video source and primary audio.
    Vo,
    /// Dubbed version: donor of the additional audio track.
    Es,
}

impl std::fmt::Display for TrackSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackSide::Vo => write!(f, "VO"),
            TrackSide::Es => write!(f, "ES"),
        }
    }
}
