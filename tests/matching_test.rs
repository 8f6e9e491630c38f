//! End-to-end matching tests: scan a real directory tree, classify the
//! files, and pair candidates through the matching engine.

use dubforge::matcher::{self, Candidate};
use dubforge::pipeline::derive_output_name;
use dubforge::scanner;
use dubforge_common::ProcessingMode;
use std::fs;
use std::path::Path;

fn touch(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"x").unwrap();
}

// ---------------------------------------------------------------------------
// The worked example: scan -> classify -> match -> output name
// ---------------------------------------------------------------------------

#[test]
fn worked_example_scan_match_and_name() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    touch(&root.join("tv/Show.Name.1x02.1080p.mkv"));
    touch(&root.join("tv/Show Name - 1x02 [ES].mp4"));

    let lists = scanner::collect_candidates(root, &[root.join("tv")]);
    assert_eq!(lists.vo.len(), 1, "untagged release classified as VO");
    assert_eq!(lists.es.len(), 1, "[ES] marker classified as ES");

    let outcome = matcher::match_candidates(lists.vo, lists.es, Some("Show Name"), Some(1));
    assert_eq!(outcome.pairs.len(), 1);

    let pair = &outcome.pairs[0];
    assert_eq!(pair.key.series, "Show Name");
    assert_eq!((pair.key.season, pair.key.episode), (1, 2));

    // The output naming contract is observable behavior and must be
    // bit-exact for downstream tooling.
    let vo_name = pair.vo_file.name.clone();
    assert_eq!(
        derive_output_name(&vo_name, ProcessingMode::Tv, "eng", "spa"),
        "Show.Name.S01E02.1080p.eng.spa.mkv"
    );
}

// ---------------------------------------------------------------------------
// Parser invariance across separator styles, via the matcher
// ---------------------------------------------------------------------------

#[test]
fn separator_variants_pair_up() {
    // Dotted VO, spaced ES with different casing: same episode key.
    let vo = vec![Candidate::from_path("/m/My.Show.S03E04.2160p.mkv")];
    let es = vec![Candidate::from_path("/m/my show 3x04 es.mkv")];

    let outcome = matcher::match_candidates(vo, es, Some("my.show"), Some(3));
    assert_eq!(outcome.pairs.len(), 1);
    assert_eq!(outcome.pairs[0].key.episode, 4);
}

// ---------------------------------------------------------------------------
// Ambiguity handling over a scanned tree
// ---------------------------------------------------------------------------

#[test]
fn duplicate_vo_releases_surface_as_ambiguous() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    // Two different VO releases of episode 2, one ES.
    touch(&root.join("tv/Show.S01E02.720p.mkv"));
    touch(&root.join("tv/Show.S01E02.1080p.mkv"));
    touch(&root.join("tv/Show.S01E02.es.mkv"));
    // Episode 3 is clean.
    touch(&root.join("tv/Show.S01E03.1080p.mkv"));
    touch(&root.join("tv/Show.S01E03.es.mkv"));

    let lists = scanner::collect_candidates(root, &[root.join("tv")]);
    let outcome = matcher::match_candidates(lists.vo, lists.es, Some("Show"), Some(1));

    assert_eq!(outcome.pairs.len(), 1);
    assert_eq!(outcome.pairs[0].key.episode, 3);
    assert_eq!(outcome.ambiguous.len(), 1);
    assert_eq!(outcome.ambiguous[0].episode, 2);
}

// ---------------------------------------------------------------------------
// Scanner containment
// ---------------------------------------------------------------------------

#[test]
fn scan_is_contained_to_media_root() {
    let media = tempfile::tempdir().unwrap();
    let outside = tempfile::tempdir().unwrap();
    touch(&media.path().join("tv/Show.S01E01.mkv"));
    touch(&outside.path().join("Show.S01E01.es.mkv"));

    let lists = scanner::collect_candidates(
        media.path(),
        &[media.path().join("tv"), outside.path().to_path_buf()],
    );

    assert_eq!(lists.vo.len(), 1);
    assert!(lists.es.is_empty(), "outside-root path must be ignored");
}
