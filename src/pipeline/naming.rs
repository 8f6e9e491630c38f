//! Output filename derivation.
//!
//! TV output follows the canonical pattern
//! `Series.Name.S{season:02}E{episode:02}.{tags}.{lang1}.{lang2}.{ext}`;
//! movie output derives from the VO filename with stale language tags
//! stripped and the two language tags appended. The merged container is
//! always Matroska, so the extension is fixed.
//!
//! This format is observable behavior relied on by downstream tooling; the
//! tests below pin it bit-exact.

use dubforge_av::Container;
use dubforge_common::ProcessingMode;
use dubforge_parser::{is_language_tag, parse};
use std::path::{Path, PathBuf};

/// Derive the output path for a pair from its VO file.
///
/// The file lands in `destination` when given, otherwise next to the VO
/// file. TV naming needs a parsed episode key; a TV pair whose VO filename
/// yields no key falls back to movie-style naming rather than failing.
pub fn derive_output_path(
    vo: &Path,
    mode: ProcessingMode,
    destination: Option<&Path>,
    original_lang: &str,
    dubbed_lang: &str,
) -> PathBuf {
    let dir = destination
        .map(Path::to_path_buf)
        .or_else(|| vo.parent().map(Path::to_path_buf))
        .unwrap_or_default();

    let vo_name = vo
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    dir.join(derive_output_name(
        &vo_name,
        mode,
        original_lang,
        dubbed_lang,
    ))
}

/// Derive just the output filename from the VO basename.
pub fn derive_output_name(
    vo_name: &str,
    mode: ProcessingMode,
    original_lang: &str,
    dubbed_lang: &str,
) -> String {
    let ext = Container::Mkv.extension();
    let parsed = parse(vo_name);

    if mode == ProcessingMode::Tv {
        if let Some(key) = &parsed.key {
            let mut parts: Vec<String> = Vec::new();
            if !key.series.is_empty() {
                parts.push(key.series.replace(' ', "."));
            }
            parts.push(format!("S{:02}E{:02}", key.season, key.episode));
            parts.extend(parsed.tags.iter().cloned());
            parts.push(original_lang.to_string());
            parts.push(dubbed_lang.to_string());
            return format!("{}.{}", parts.join("."), ext);
        }
        // No episode key: fall through to movie-style naming.
    }

    // Movie naming: scene-normalize the VO stem, drop stale language tags,
    // append the two language tags.
    let stem = Path::new(vo_name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| vo_name.to_string());

    let mut parts: Vec<String> = stem
        .split(|c: char| !c.is_alphanumeric() && c != '+')
        .filter(|t| !t.is_empty() && !is_language_tag(t))
        .map(str::to_string)
        .collect();
    parts.push(original_lang.to_string());
    parts.push(dubbed_lang.to_string());

    format!("{}.{}", parts.join("."), ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tv_name_is_bit_exact() {
        assert_eq!(
            derive_output_name("Show.Name.1x02.1080p.mkv", ProcessingMode::Tv, "eng", "spa"),
            "Show.Name.S01E02.1080p.eng.spa.mkv"
        );
    }

    #[test]
    fn tv_name_pads_season_and_episode() {
        assert_eq!(
            derive_output_name("Show.S1E7.720p.WEB.mkv", ProcessingMode::Tv, "eng", "spa"),
            "Show.S01E07.720p.WEB.eng.spa.mkv"
        );
    }

    #[test]
    fn tv_name_strips_stale_language_tags() {
        assert_eq!(
            derive_output_name("Show.S01E02.1080p.eng.mkv", ProcessingMode::Tv, "eng", "spa"),
            "Show.S01E02.1080p.eng.spa.mkv"
        );
    }

    #[test]
    fn tv_name_without_tags() {
        assert_eq!(
            derive_output_name("Show Name S02E05.mp4", ProcessingMode::Tv, "eng", "spa"),
            "Show.Name.S02E05.eng.spa.mkv"
        );
    }

    #[test]
    fn movie_name_appends_language_tags() {
        assert_eq!(
            derive_output_name(
                "Some Movie (2021) [1080p].mp4",
                ProcessingMode::Movie,
                "eng",
                "spa"
            ),
            "Some.Movie.2021.1080p.eng.spa.mkv"
        );
    }

    #[test]
    fn movie_name_strips_stale_language_tags() {
        assert_eq!(
            derive_output_name("Some.Movie.2021.en.mkv", ProcessingMode::Movie, "eng", "spa"),
            "Some.Movie.2021.eng.spa.mkv"
        );
    }

    #[test]
    fn tv_without_key_falls_back_to_movie_naming() {
        assert_eq!(
            derive_output_name("Unparsed Special.mkv", ProcessingMode::Tv, "eng", "spa"),
            "Unparsed.Special.eng.spa.mkv"
        );
    }

    #[test]
    fn output_path_prefers_destination() {
        let path = derive_output_path(
            Path::new("/media/tv/Show.S01E02.mkv"),
            ProcessingMode::Tv,
            Some(Path::new("/media/out")),
            "eng",
            "spa",
        );
        assert_eq!(path, Path::new("/media/out/Show.S01E02.eng.spa.mkv"));
    }

    #[test]
    fn output_path_defaults_to_vo_directory() {
        let path = derive_output_path(
            Path::new("/media/tv/Show.S01E02.mkv"),
            ProcessingMode::Tv,
            None,
            "eng",
            "spa",
        );
        assert_eq!(path, Path::new("/media/tv/Show.S01E02.eng.spa.mkv"));
    }

    #[test]
    fn configured_languages_flow_through() {
        assert_eq!(
            derive_output_name("Show.S01E02.mkv", ProcessingMode::Tv, "jpn", "spa"),
            "Show.S01E02.jpn.spa.mkv"
        );
    }
}
