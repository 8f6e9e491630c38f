//! Directory scanning: candidate discovery and VO/ES classification.
//!
//! The scanner walks the configured search paths (restricted to the media
//! root), keeps video files, and sorts each into the VO or ES candidate
//! list. Classification looks at filename language markers first and falls
//! back to the parent directory's name; files with no marker at all are
//! assumed to be VO, since original-language releases usually carry no
//! language tag.

use dubforge_common::paths::{is_video_file, is_within_root};
use dubforge_common::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use walkdir::WalkDir;

use crate::matcher::Candidate;

/// Filename markers identifying an original-language file.
static VO_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\.en\.",
        r"(?i)\.eng\.",
        r"(?i)\.english\.",
        r"\bVOSE\b",
        r"\bVO\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static regex"))
    .collect()
});

/// Filename markers identifying a dubbed file.
static ES_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)\.es\.",
        r"(?i)\.esp\.",
        r"(?i)\.spa\.",
        r"(?i)\.spanish\.",
        r"(?i)ESPAÑOL",
        r"\bESP\b",
        r"\bES\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static regex"))
    .collect()
});

/// Directory-name tokens identifying an original-language folder.
const VO_DIR_TOKENS: &[&str] = &["english", "vo", "original"];

/// Directory-name tokens identifying a dubbed folder.
const ES_DIR_TOKENS: &[&str] = &["spanish", "es", "español", "castellano"];

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirEntryInfo {
    /// Basename of the entry.
    pub name: String,
    /// Full path of the entry.
    pub path: PathBuf,
    /// Whether the entry is a file or a directory.
    pub kind: EntryKind,
}

/// The scanner's output: VO and ES candidate lists for the matcher.
#[derive(Debug, Clone, Default)]
pub struct CandidateLists {
    pub vo: Vec<Candidate>,
    pub es: Vec<Candidate>,
}

/// List one directory, name-ordered, restricted to the media root.
///
/// # Errors
///
/// Fails with a validation error when `path` escapes `media_root`, and with
/// an I/O error when the directory cannot be read.
pub fn scan_directory(media_root: &Path, path: &Path) -> Result<Vec<DirEntryInfo>> {
    if !is_within_root(media_root, path) {
        return Err(Error::Validation(format!(
            "path {:?} is outside the media root",
            path
        )));
    }

    let mut entries = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let kind = if file_type.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        entries.push(DirEntryInfo {
            name: entry.file_name().to_string_lossy().to_string(),
            path: entry.path(),
            kind,
        });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Walk the search paths and build VO/ES candidate lists.
///
/// Search paths outside the media root are skipped with a warning rather
/// than failing the whole scan, matching the submission interface's
/// containment contract.
pub fn collect_candidates(media_root: &Path, search_paths: &[PathBuf]) -> CandidateLists {
    let mut lists = CandidateLists::default();

    for search_path in search_paths {
        if !is_within_root(media_root, search_path) {
            tracing::warn!(
                "search path {:?} is outside the media root and will be ignored",
                search_path
            );
            continue;
        }

        for entry in WalkDir::new(search_path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() || !is_video_file(entry.path()) {
                continue;
            }

            let candidate = Candidate::from_path(entry.path());
            match classify(entry.path()) {
                TrackClass::Vo => lists.vo.push(candidate),
                TrackClass::Es => lists.es.push(candidate),
            }
        }
    }

    tracing::info!(
        vo = lists.vo.len(),
        es = lists.es.len(),
        "candidate scan complete"
    );

    lists
}

enum TrackClass {
    Vo,
    Es,
}

/// Decide which side of a pair a file belongs to.
fn classify(path: &Path) -> TrackClass {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    if VO_PATTERNS.iter().any(|p| p.is_match(&name)) {
        return TrackClass::Vo;
    }
    if ES_PATTERNS.iter().any(|p| p.is_match(&name)) {
        return TrackClass::Es;
    }

    // No filename marker: look at the directory names above the file.
    if let Some(parent) = path.parent() {
        for component in parent.components() {
            let comp = component.as_os_str().to_string_lossy().to_lowercase();
            if VO_DIR_TOKENS.contains(&comp.as_str()) {
                return TrackClass::Vo;
            }
            if ES_DIR_TOKENS.contains(&comp.as_str()) {
                return TrackClass::Es;
            }
        }
    }

    // Untagged releases are assumed to be the original version.
    TrackClass::Vo
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn classify_by_filename_marker() {
        assert!(matches!(
            classify(Path::new("/m/Show.S01E01.eng.mkv")),
            TrackClass::Vo
        ));
        assert!(matches!(
            classify(Path::new("/m/Show.S01E01.es.mkv")),
            TrackClass::Es
        ));
        assert!(matches!(
            classify(Path::new("/m/Show.S01E01.spa.mkv")),
            TrackClass::Es
        ));
        assert!(matches!(
            classify(Path::new("/m/Show S01E01 ESP.mkv")),
            TrackClass::Es
        ));
        assert!(matches!(
            classify(Path::new("/m/Show Name - 1x02 [ES].mp4")),
            TrackClass::Es
        ));
    }

    #[test]
    fn classify_acronyms_case_sensitively() {
        // "love" must not match the VO acronym, "espresso" must not match ESP.
        assert!(matches!(
            classify(Path::new("/m/love.story.S01E01.mkv")),
            TrackClass::Vo
        ));
        assert!(matches!(
            classify(Path::new("/m/espresso.S01E01.mkv")),
            TrackClass::Vo
        ));
    }

    #[test]
    fn classify_by_directory_fallback() {
        assert!(matches!(
            classify(Path::new("/m/Spanish/Show.S01E01.mkv")),
            TrackClass::Es
        ));
        assert!(matches!(
            classify(Path::new("/m/original/Show.S01E01.mkv")),
            TrackClass::Vo
        ));
        // "series" contains "es" but is not an exact component token.
        assert!(matches!(
            classify(Path::new("/m/series/Show.S01E01.mkv")),
            TrackClass::Vo
        ));
    }

    #[test]
    fn untagged_defaults_to_vo() {
        assert!(matches!(
            classify(Path::new("/m/Show.S01E01.1080p.mkv")),
            TrackClass::Vo
        ));
    }

    #[test]
    fn collect_candidates_walks_and_classifies() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        touch(&root.join("tv/Show.S01E01.1080p.mkv"));
        touch(&root.join("tv/Show.S01E01.es.mkv"));
        touch(&root.join("tv/Show.S01E02.1080p.mkv"));
        touch(&root.join("tv/notes.txt"));

        let lists = collect_candidates(root, &[root.join("tv")]);
        assert_eq!(lists.vo.len(), 2);
        assert_eq!(lists.es.len(), 1);
        assert!(lists.vo.iter().all(|c| c.parsed.is_some()));
    }

    #[test]
    fn collect_candidates_skips_paths_outside_root() {
        let media = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        touch(&outside.path().join("Show.S01E01.mkv"));

        let lists = collect_candidates(media.path(), &[outside.path().to_path_buf()]);
        assert!(lists.vo.is_empty());
        assert!(lists.es.is_empty());
    }

    #[test]
    fn scan_directory_lists_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("b.mkv"));
        touch(&root.join("a.mkv"));
        fs::create_dir(root.join("c_dir")).unwrap();

        let entries = scan_directory(root, root).unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.mkv", "b.mkv", "c_dir"]);
        assert_eq!(entries[2].kind, EntryKind::Directory);
    }

    #[test]
    fn scan_directory_rejects_escape() {
        let dir = tempfile::tempdir().unwrap();
        let result = scan_directory(dir.path(), Path::new("/etc"));
        assert!(matches!(result, Err(Error::Validation(_))));
    }
}
