//! Container formats and their stream-copy capabilities.

use std::path::Path;

/// Supported container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    /// Matroska container
    Mkv,
    /// MPEG-4 Part 14 container
    Mp4,
    /// AVI container
    Avi,
    /// MPEG-4 video variant
    M4v,
    /// MPEG transport stream
    Ts,
    /// WebM container
    Webm,
    /// QuickTime container
    Mov,
}

impl Container {
    /// Get the file extension for this container.
    pub fn extension(&self) -> &'static str {
        match self {
            Container::Mkv => "mkv",
            Container::Mp4 => "mp4",
            Container::Avi => "avi",
            Container::M4v => "m4v",
            Container::Ts => "ts",
            Container::Webm => "webm",
            Container::Mov => "mov",
        }
    }

    /// Whether an additional audio track can be stream-copied into this
    /// container without remuxing first.
    ///
    /// Matroska is the only working container for the merge; everything else
    /// is remuxed to MKV beforehand.
    pub fn supports_multi_audio_copy(&self) -> bool {
        matches!(self, Container::Mkv)
    }

    /// Detect the container from a file path's extension.
    pub fn from_path(path: &Path) -> Option<Container> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }
}

impl std::str::FromStr for Container {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mkv" | "matroska" => Ok(Container::Mkv),
            "mp4" => Ok(Container::Mp4),
            "avi" => Ok(Container::Avi),
            "m4v" => Ok(Container::M4v),
            "ts" | "mpegts" => Ok(Container::Ts),
            "webm" => Ok(Container::Webm),
            "mov" | "quicktime" => Ok(Container::Mov),
            _ => Err(format!("Unknown container format: {}", s)),
        }
    }
}

impl std::fmt::Display for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_extension() {
        assert_eq!(Container::Mkv.extension(), "mkv");
        assert_eq!(Container::Mp4.extension(), "mp4");
        assert_eq!(Container::Avi.extension(), "avi");
    }

    #[test]
    fn test_container_from_str() {
        assert_eq!("mkv".parse::<Container>().ok(), Some(Container::Mkv));
        assert_eq!("MKV".parse::<Container>().ok(), Some(Container::Mkv));
        assert_eq!("mp4".parse::<Container>().ok(), Some(Container::Mp4));
        assert_eq!("unknown".parse::<Container>().ok(), None);
    }

    #[test]
    fn test_container_from_path() {
        assert_eq!(
            Container::from_path(Path::new("/media/a.mkv")),
            Some(Container::Mkv)
        );
        assert_eq!(
            Container::from_path(Path::new("b.MP4")),
            Some(Container::Mp4)
        );
        assert_eq!(Container::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_multi_audio_copy_support() {
        assert!(Container::Mkv.supports_multi_audio_copy());
        assert!(!Container::Mp4.supports_multi_audio_copy());
        assert!(!Container::Avi.supports_multi_audio_copy());
    }
}
