//! Path utilities: video-file detection and media-root containment.
//!
//! The containment check backs the restricted-filesystem guarantee: every
//! path the application scans or processes must live under the configured
//! media root.

use std::path::{Component, Path, PathBuf};

/// List of supported video file extensions.
const VIDEO_EXTENSIONS: &[&str] = &["mkv", "mp4", "avi", "m4v", "ts", "webm", "mov"];

/// Check if a path has a video file extension.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use dubforge_common::paths::is_video_file;
///
/// assert!(is_video_file(Path::new("movie.mkv")));
/// assert!(is_video_file(Path::new("/path/to/video.mp4")));
/// assert!(!is_video_file(Path::new("subtitle.srt")));
/// ```
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Get the list of video file extensions.
#[must_use]
pub fn video_extensions() -> &'static [&'static str] {
    VIDEO_EXTENSIONS
}

/// Lexically normalize a path: resolve `.` and `..` components without
/// touching the filesystem.
///
/// Symlinks are not followed; the check is purely textual, matching the
/// behavior expected of the scan collaborator.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

/// Check whether `path` is the media root itself or a descendant of it.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use dubforge_common::paths::is_within_root;
///
/// let root = Path::new("/mnt/media");
/// assert!(is_within_root(root, Path::new("/mnt/media/tv/show.mkv")));
/// assert!(is_within_root(root, Path::new("/mnt/media")));
/// assert!(!is_within_root(root, Path::new("/mnt/media/../etc/passwd")));
/// assert!(!is_within_root(root, Path::new("/mnt/mediafiles/show.mkv")));
/// ```
pub fn is_within_root(root: &Path, path: &Path) -> bool {
    let root = normalize(root);
    let path = normalize(path);
    path.starts_with(&root)
}
