use std::fs;
use std::path::PathBuf;

use gpx_scrub::error::ScrubError;
use gpx_scrub::files::scrub_file;
use gpx_scrub::gpx_types::GpxDocument;
use gpx_scrub::options::ScrubOptions;
use gpx_scrub::parser::parse_gpx;
use gpx_scrub::scrub_gpx;
use gpx_scrub::scrubber::ScrubReport;

fn load_fixture(path: &str) -> String {
    fs::read_to_string(fixture_path(path)).unwrap()
}

fn fixture_path(path: &str) -> PathBuf {
    PathBuf::from(format!("tests/fixtures/{path}"))
}

fn scrub(gpx: &str, max_dist: f64) -> (GpxDocument, ScrubReport) {
    let (xml, report) = scrub_gpx(gpx, &ScrubOptions::new(max_dist)).unwrap();
    (parse_gpx(&xml).unwrap(), report)
}

fn track_coords(doc: &GpxDocument, track: usize, segment: usize) -> Vec<(f64, f64)> {
    doc.tracks[track].segments[segment]
        .points
        .iter()
        .map(|p| (p.lat, p.lon))
        .collect()
}

/// Fresh scratch directory under the system temp dir.
fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("gpx-scrub-{}-{name}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

// ---- basic/ ----

#[test]
fn test_01_clean_track_unchanged() {
    let gpx = load_fixture("basic/01_clean_track.gpx");
    let (doc, report) = scrub(&gpx, 50.0);

    assert_eq!(doc, parse_gpx(&gpx).unwrap());
    assert_eq!(report.points_read, 5);
    assert_eq!(report.points_dropped, 0);
    assert_eq!(doc.tracks[0].name.as_deref(), Some("Morning Run"));
    assert_eq!(doc.tracks[0].segments[0].points[4].ele, Some(12.0));
}

// ---- noise/ ----

#[test]
fn test_02_single_spike_dropped() {
    let (doc, report) = scrub(&load_fixture("noise/02_single_spike.gpx"), 50.0);

    assert_eq!(
        track_coords(&doc, 0, 0),
        vec![
            (35.68, 139.7),
            (35.6801, 139.7001),
            (35.6802, 139.7002),
            (35.6803, 139.7003),
            (35.6804, 139.7004),
        ]
    );
    let times: Vec<&str> = doc.tracks[0].segments[0]
        .points
        .iter()
        .filter_map(|p| p.time.as_deref())
        .collect();
    assert!(!times.contains(&"2025-03-01T18:00:06Z"));
    assert_eq!(report.points_dropped, 1);
}

#[test]
fn test_03_multi_segment() {
    let gpx = load_fixture("noise/03_multi_segment.gpx");
    let original = parse_gpx(&gpx).unwrap();
    let (doc, report) = scrub(&gpx, 50.0);

    assert_eq!(
        report,
        ScrubReport {
            tracks: 2,
            segments: 4,
            points_read: 12,
            points_kept: 9,
            points_dropped: 3,
        }
    );

    let day1 = &doc.tracks[0];
    assert_eq!(day1.segments.len(), 3);
    assert_eq!(day1.segments[0].points.len(), 3);
    assert!(day1.segments[1].points.is_empty());
    assert_eq!(
        track_coords(&doc, 0, 2),
        vec![(34.9, 135.5), (34.9001, 135.5001), (34.9002, 135.5002)]
    );
    assert_eq!(day1.segments[2].points[1].extras[0].name, "extensions");
    assert_eq!(day1.extras, original.tracks[0].extras);

    // Only track points are touched.
    assert_eq!(doc.attributes, original.attributes);
    assert_eq!(doc.metadata, original.metadata);
    assert_eq!(doc.waypoints, original.waypoints);
    assert_eq!(doc.routes, original.routes);
    assert_eq!(doc.tracks[1], original.tracks[1]);
}

#[test]
fn test_thresholds_on_fixtures() {
    let gpx = load_fixture("noise/03_multi_segment.gpx");

    // Zero keeps only the first point of every non-empty segment.
    let (_, report) = scrub(&gpx, 0.0);
    assert_eq!(report.points_kept, 3);

    // Large enough to accept every jump.
    let (doc, report) = scrub(&gpx, 1e9);
    assert_eq!(report.points_dropped, 0);
    assert_eq!(doc, parse_gpx(&gpx).unwrap());
}

#[test]
fn test_scrubbing_twice_changes_nothing() {
    for fixture in [
        "basic/01_clean_track.gpx",
        "noise/02_single_spike.gpx",
        "noise/03_multi_segment.gpx",
    ] {
        let opts = ScrubOptions::new(50.0);
        let (once, _) = scrub_gpx(&load_fixture(fixture), &opts).unwrap();
        let (twice, report) = scrub_gpx(&once, &opts).unwrap();
        assert_eq!(twice, once, "{fixture}");
        assert_eq!(report.points_dropped, 0, "{fixture}");
    }
}

// ---- edge/ ----

#[test]
fn test_04_only_empty_segments() {
    let (doc, report) = scrub(&load_fixture("edge/04_only_empty_segments.gpx"), 10.0);
    assert_eq!(doc.tracks[0].segments.len(), 2);
    assert!(doc.tracks[0].segments.iter().all(|s| s.points.is_empty()));
    assert_eq!(report.segments, 2);
    assert_eq!(report.points_read, 0);
}

#[test]
fn test_05_invalid_coordinate() {
    let result = scrub_gpx(
        &load_fixture("edge/05_invalid_coordinate.gpx"),
        &ScrubOptions::new(10.0),
    );
    match result {
        Err(ScrubError::InvalidInput {
            track,
            segment,
            point,
            latitude,
            ..
        }) => {
            assert_eq!((track, segment, point), (0, 0, 1));
            assert_eq!(latitude, 135.68);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_06_malformed_xml() {
    let result = scrub_gpx(&load_fixture("edge/06_malformed.gpx"), &ScrubOptions::new(10.0));
    assert!(matches!(result, Err(ScrubError::XmlParse(_))));
}

#[test]
fn test_07_truncated_file() {
    let result = scrub_gpx(&load_fixture("edge/07_truncated.gpx"), &ScrubOptions::new(10.0));
    match result {
        Err(ScrubError::UnexpectedEof(element)) => assert_eq!(element, "trkpt"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_bad_threshold_rejected_before_parsing() {
    let result = scrub_gpx("not xml at all", &ScrubOptions::new(-1.0));
    assert!(matches!(result, Err(ScrubError::InvalidThreshold(_))));
}

// ---- files ----

#[test]
fn test_scrub_file_writes_output() {
    let dir = scratch_dir("writes-output");
    let output = dir.join("clean.gpx");

    let report = scrub_file(
        &fixture_path("noise/02_single_spike.gpx"),
        &output,
        &ScrubOptions::new(50.0),
    )
    .unwrap();

    assert_eq!(report.points_kept, 5);
    let written = parse_gpx(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(written.track_point_count(), 5);
    // No temporary file left behind.
    assert_eq!(fs::read_dir(&dir).unwrap().count(), 1);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_scrub_file_overwrites_existing_output() {
    let dir = scratch_dir("overwrites");
    let output = dir.join("out.gpx");
    fs::write(&output, "stale").unwrap();

    scrub_file(
        &fixture_path("basic/01_clean_track.gpx"),
        &output,
        &ScrubOptions::new(50.0),
    )
    .unwrap();

    assert!(fs::read_to_string(&output).unwrap().contains("Morning Run"));
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_scrub_file_failures_leave_output_alone() {
    let dir = scratch_dir("failures");
    let output = dir.join("out.gpx");
    fs::write(&output, "previous run").unwrap();

    let bad_threshold = scrub_file(
        &fixture_path("basic/01_clean_track.gpx"),
        &output,
        &ScrubOptions::new(-5.0),
    );
    assert!(matches!(bad_threshold, Err(ScrubError::InvalidThreshold(_))));

    let malformed = scrub_file(
        &fixture_path("edge/06_malformed.gpx"),
        &output,
        &ScrubOptions::new(50.0),
    );
    assert!(matches!(malformed, Err(ScrubError::XmlParse(_))));

    let truncated = scrub_file(
        &fixture_path("edge/07_truncated.gpx"),
        &output,
        &ScrubOptions::new(50.0),
    );
    assert!(matches!(truncated, Err(ScrubError::UnexpectedEof(_))));

    assert_eq!(fs::read_to_string(&output).unwrap(), "previous run");
    assert_eq!(fs::read_dir(&dir).unwrap().count(), 1);
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_scrub_file_missing_input() {
    let dir = scratch_dir("missing-input");
    let input = dir.join("nope.gpx");
    let output = dir.join("out.gpx");

    match scrub_file(&input, &output, &ScrubOptions::new(50.0)) {
        Err(ScrubError::Io { path, source }) => {
            assert_eq!(path, input);
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(!output.exists());
    fs::remove_dir_all(&dir).ok();
}
