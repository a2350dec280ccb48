//! Batch behaviour through the public API.
//!
//! Uses a small in-test codec so these run without libheif fixtures: a
//! "HEIC" here is `TESTHEIC` followed by width and height bytes.
//!
//! Run with: cargo test --test batch

use heic_convert::convert::{
    BatchEvent, ConversionResult, ConvertOptions, FailureKind, run_batch_with_codec,
};
use heic_convert::imaging::{CodecError, EncodeParams, ImageCodec};
use heic_convert::summary::RunSummary;
use image::{DynamicImage, Rgb, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use tempfile::TempDir;

struct TestCodec;

impl ImageCodec for TestCodec {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, CodecError> {
        match bytes {
            [b'T', b'E', b'S', b'T', b'H', b'E', b'I', b'C', w, h] => Ok(
                DynamicImage::ImageRgb8(RgbImage::from_pixel(*w as u32, *h as u32, Rgb([9, 9, 9]))),
            ),
            _ => Err(CodecError::Decode("unsupported container".into())),
        }
    }

    fn encode_jpeg(&self, image: &RgbImage, params: &EncodeParams) -> Result<Vec<u8>, CodecError> {
        let mut out = b"JPEG".to_vec();
        out.push(params.quality.value());
        out.extend_from_slice(image.as_raw());
        Ok(out)
    }
}

fn write_heic(dir: &Path, name: &str, w: u8, h: u8) {
    let mut bytes = b"TESTHEIC".to_vec();
    bytes.extend_from_slice(&[w, h]);
    fs::write(dir.join(name), bytes).unwrap();
}

fn run(dir: &Path) -> heic_convert::convert::BatchReport {
    run_batch_with_codec(&TestCodec, dir, &ConvertOptions::default(), None).unwrap()
}

fn snapshot(dir: &Path) -> Vec<(String, Vec<u8>)> {
    let mut files: Vec<(String, Vec<u8>)> = fs::read_dir(dir)
        .unwrap()
        .map(|e| {
            let e = e.unwrap();
            (
                e.file_name().to_string_lossy().into_owned(),
                fs::read(e.path()).unwrap(),
            )
        })
        .collect();
    files.sort();
    files
}

fn names(results: &[ConversionResult]) -> Vec<String> {
    results
        .iter()
        .map(|r| r.input().file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn example_directory() {
    let tmp = TempDir::new().unwrap();
    write_heic(tmp.path(), "a.heic", 2, 2);
    write_heic(tmp.path(), "b.HEIF", 3, 1);
    fs::write(tmp.path().join("c.jpg"), b"existing photo").unwrap();
    fs::write(tmp.path().join("notes.txt"), b"notes").unwrap();
    fs::write(tmp.path().join("a.jpg"), b"made earlier").unwrap();

    let report = run(tmp.path());

    assert_eq!(
        report.summary,
        RunSummary {
            total: 2,
            converted: 1,
            skipped: 1,
            failed: 0,
        }
    );
    assert!(matches!(report.results[0], ConversionResult::Skipped { .. }));
    assert!(matches!(report.results[1], ConversionResult::Converted { .. }));
    assert_eq!(fs::read(tmp.path().join("a.jpg")).unwrap(), b"made earlier");
    assert_eq!(fs::read(tmp.path().join("b.jpg")).unwrap().len(), 5 + 3 * 3);
}

#[test]
fn second_run_converts_nothing() {
    let tmp = TempDir::new().unwrap();
    write_heic(tmp.path(), "a.heic", 2, 2);
    write_heic(tmp.path(), "b.heic", 4, 4);

    let first = run(tmp.path());
    assert_eq!(first.summary.converted, 2);
    let after_first = snapshot(tmp.path());

    let second = run(tmp.path());
    assert_eq!(second.summary.converted, 0);
    assert_eq!(second.summary.skipped, 2);
    assert_eq!(snapshot(tmp.path()), after_first);
}

#[test]
fn every_candidate_gets_exactly_one_result() {
    let tmp = TempDir::new().unwrap();
    write_heic(tmp.path(), "a.heic", 1, 1);
    fs::write(tmp.path().join("b.heic"), b"broken").unwrap();
    write_heic(tmp.path(), "c.HEIC", 1, 1);
    fs::write(tmp.path().join("c.jpg"), b"x").unwrap();

    let report = run(tmp.path());

    assert_eq!(report.results.len(), 3);
    assert_eq!(report.summary.total, 3);
    assert!(report.summary.is_complete());
    assert_eq!(names(&report.results), vec!["a.heic", "b.heic", "c.HEIC"]);
}

#[test]
fn existing_outputs_are_never_modified() {
    let tmp = TempDir::new().unwrap();
    for name in ["a", "b", "c"] {
        write_heic(tmp.path(), &format!("{name}.heic"), 2, 2);
        fs::write(tmp.path().join(format!("{name}.jpg")), format!("{name} original")).unwrap();
    }
    let before = snapshot(tmp.path());

    let report = run(tmp.path());

    assert_eq!(report.summary.skipped, 3);
    assert_eq!(snapshot(tmp.path()), before);
}

#[test]
fn one_corrupt_file_does_not_affect_the_rest() {
    let tmp = TempDir::new().unwrap();
    for name in ["a", "b", "d", "e"] {
        write_heic(tmp.path(), &format!("{name}.heic"), 2, 2);
    }
    fs::write(tmp.path().join("c.heic"), b"TESTHEIC").unwrap();

    let report = run(tmp.path());

    assert_eq!(report.summary.converted, 4);
    assert_eq!(report.summary.failed, 1);
    match &report.results[2] {
        ConversionResult::Failed { input, kind, .. } => {
            assert!(input.ends_with("c.heic"));
            assert_eq!(*kind, FailureKind::Decode);
        }
        other => panic!("expected c.heic to fail, got {other:?}"),
    }
    assert!(!tmp.path().join("c.jpg").exists());
    for name in ["a", "b", "d", "e"] {
        assert!(tmp.path().join(format!("{name}.jpg")).exists());
    }
}

#[test]
fn only_heic_and_heif_are_candidates() {
    let tmp = TempDir::new().unwrap();
    for name in ["x.jpg", "x.png", "x.heic.txt", "heic", "x.hei", "x.avif"] {
        fs::write(tmp.path().join(name), b"TESTHEIC\x01\x01").unwrap();
    }
    fs::create_dir(tmp.path().join("album.heic")).unwrap();
    write_heic(tmp.path(), "ok.Heif", 1, 1);

    let report = run(tmp.path());

    assert_eq!(names(&report.results), vec!["ok.Heif"]);
}

#[test]
fn subdirectories_are_not_scanned() {
    let tmp = TempDir::new().unwrap();
    let sub = tmp.path().join("2024");
    fs::create_dir(&sub).unwrap();
    write_heic(&sub, "nested.heic", 1, 1);

    let report = run(tmp.path());

    assert_eq!(report.summary.total, 0);
    assert!(!sub.join("nested.jpg").exists());
}

#[test]
fn events_mirror_the_report() {
    let tmp = TempDir::new().unwrap();
    write_heic(tmp.path(), "a.heic", 1, 1);
    fs::write(tmp.path().join("b.heic"), b"nope").unwrap();
    let (tx, rx) = mpsc::channel();

    let report =
        run_batch_with_codec(&TestCodec, tmp.path(), &ConvertOptions::default(), Some(tx))
            .unwrap();
    let events: Vec<BatchEvent> = rx.iter().collect();

    let from_events: Vec<ConversionResult> = events
        .iter()
        .filter_map(|e| match e {
            BatchEvent::FileFinished { result, .. } => Some(result.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(from_events, report.results);
    assert_eq!(events.last(), Some(&BatchEvent::Finished(report.summary)));
}

#[test]
fn result_paths_are_absolute() {
    let tmp = TempDir::new().unwrap();
    write_heic(tmp.path(), "a.heic", 1, 1);

    let report = run(tmp.path());

    let input: &Path = report.results[0].input();
    assert!(input.is_absolute());
    assert_eq!(input, PathBuf::from(tmp.path()).join("a.heic"));
}
