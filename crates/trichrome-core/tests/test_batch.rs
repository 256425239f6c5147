#[allow(dead_code)]
mod common;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use image::{DynamicImage, ImageFormat};
use trichrome_core::io::{DecodedFrame, ImageCodec, ImageCrateCodec};
use trichrome_core::pipeline::config::TrichromeConfig;
use trichrome_core::pipeline::{
    process, process_image, run_batch, BatchProgress, NoOpReporter, ProgressReporter,
};
use trichrome_core::plane::{Channel, Composite, Shift};
use trichrome_core::{Result, TrichromeError};

const WIDTH: usize = 150;
const BAND_HEIGHT: usize = 130;

fn config_for(output_dir: &Path, max_workers: usize) -> TrichromeConfig {
    let mut config = TrichromeConfig::default();
    config.batch.output_dir = output_dir.to_path_buf();
    config.batch.max_workers = max_workers;
    config
}

/// Codec serving synthetic plates from memory and counting concurrent units.
///
/// A unit is active from `decode` entry until `encode` returns.
#[derive(Default)]
struct CountingCodec {
    active: AtomicUsize,
    max_active: AtomicUsize,
    written: Mutex<Vec<PathBuf>>,
}

impl ImageCodec for CountingCodec {
    fn decode(&self, _path: &Path) -> Result<DecodedFrame> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(20));

        let plate = common::triptych(WIDTH, BAND_HEIGHT, Shift::new(2, -3), Shift::new(-4, 1));
        Ok(DecodedFrame {
            image: DynamicImage::ImageLuma16(plate),
            format: ImageFormat::Png,
        })
    }

    fn encode(&self, _composite: &Composite, _format: ImageFormat, path: &Path) -> Result<()> {
        self.written.lock().unwrap().push(path.to_path_buf());
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Reporter recording every progress snapshot.
#[derive(Default)]
struct RecordingReporter {
    finished: Mutex<Vec<BatchProgress>>,
    started: AtomicUsize,
}

impl ProgressReporter for RecordingReporter {
    fn file_started(&self, _path: &Path) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    fn file_finished(&self, _path: &Path, _ok: bool, progress: BatchProgress) {
        self.finished.lock().unwrap().push(progress);
    }
}

#[test]
fn test_single_image_recovers_band_shifts() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("plate.png");
    let green = Shift::new(6, -5);
    let blue = Shift::new(-9, 4);
    common::write_triptych_png(&input, 240, 260, green, blue);

    let out_dir = dir.path().join("out");
    std::fs::create_dir_all(&out_dir).unwrap();
    let report =
        process_image(&input, &out_dir, &TrichromeConfig::default(), &ImageCrateCodec).unwrap();

    assert_eq!(report.shifts.red, Shift::ZERO);
    assert_eq!(report.shifts.green, green);
    assert_eq!(report.shifts.blue, blue);
    assert_eq!(report.output, out_dir.join("plate.png"));

    // Bands are 192x208; overlap loses max |dx| and max |dy| on each side.
    assert_eq!((report.width, report.height), (192 - 6 - 9, 208 - 5 - 4));

    let written = image::open(&report.output).unwrap();
    assert_eq!(written.width(), report.width);
    assert_eq!(written.color(), image::ColorType::Rgba16);
}

#[test]
fn test_green_reference() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("plate.png");
    common::write_triptych_png(&input, 240, 260, Shift::new(4, 2), Shift::new(-3, 5));

    let mut config = TrichromeConfig::default();
    config.alignment.reference = Channel::Green;
    let out_dir = dir.path().join("out");
    std::fs::create_dir_all(&out_dir).unwrap();
    let report = process_image(&input, &out_dir, &config, &ImageCrateCodec).unwrap();

    // Relative to green, red sits at minus green's shift.
    assert_eq!(report.shifts.green, Shift::ZERO);
    assert_eq!(report.shifts.red, Shift::new(-4, -2));
    assert_eq!(report.shifts.blue, Shift::new(-7, 3));
}

#[test]
fn test_partial_failure_processes_remaining_files() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.png");
    let b = dir.path().join("b.png");
    let missing = dir.path().join("missing.png");
    common::write_triptych_png(&a, WIDTH, BAND_HEIGHT, Shift::new(1, 2), Shift::new(-2, 3));
    common::write_triptych_png(&b, WIDTH, BAND_HEIGHT, Shift::new(-3, 0), Shift::new(2, -1));

    let out_dir = dir.path().join("result");
    let paths = vec![a, missing.clone(), b];
    let reporter = RecordingReporter::default();
    let report = run_batch(&paths, &config_for(&out_dir, 2), &ImageCrateCodec, &reporter).unwrap();

    assert_eq!(report.total, 3);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed(), 1);
    assert!(out_dir.join("a.png").is_file());
    assert!(out_dir.join("b.png").is_file());
    assert!(!out_dir.join("missing.png").exists());

    let (path, outcome) = &report.outcomes[1];
    assert_eq!(path, &missing);
    assert!(matches!(outcome, Err(TrichromeError::NotFound(_))));

    let finished = reporter.finished.lock().unwrap();
    assert_eq!(finished.len(), 3);
    assert_eq!(finished.iter().map(|p| p.succeeded).max(), Some(2));
    assert_eq!(finished.iter().map(|p| p.completed).max(), Some(3));

    let err = report.into_result().unwrap_err();
    assert!(matches!(err, TrichromeError::Batch { failed: 1, total: 3 }), "got {err}");
}

#[test]
fn test_process_returns_aggregate_error() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.png");
    common::write_triptych_png(&a, WIDTH, BAND_HEIGHT, Shift::ZERO, Shift::new(1, 1));
    let out_dir = dir.path().join("out");

    process(&[a.clone()], &out_dir, 1).unwrap();
    assert!(out_dir.join("a.png").is_file());

    let err = process(&[a, dir.path().join("nope.png")], &out_dir, 4).unwrap_err();
    assert_eq!(err.to_string(), "1 of 2 files failed; see log for per-file diagnostics");
}

#[test]
fn test_single_worker_never_overlaps() {
    let dir = tempfile::tempdir().unwrap();
    let paths: Vec<PathBuf> = (0..5).map(|i| PathBuf::from(format!("plate{i}.png"))).collect();
    let codec = CountingCodec::default();

    let report = run_batch(&paths, &config_for(dir.path(), 1), &codec, &NoOpReporter).unwrap();

    assert_eq!(report.succeeded, 5);
    assert_eq!(codec.max_active.load(Ordering::SeqCst), 1);
    assert_eq!(codec.written.lock().unwrap().len(), 5);
}

#[test]
fn test_worker_limit_is_respected() {
    let dir = tempfile::tempdir().unwrap();
    let paths: Vec<PathBuf> = (0..8).map(|i| PathBuf::from(format!("plate{i}.png"))).collect();
    let codec = CountingCodec::default();
    let reporter = RecordingReporter::default();

    let report = run_batch(&paths, &config_for(dir.path(), 3), &codec, &reporter).unwrap();

    assert_eq!(report.succeeded, 8);
    assert!(codec.max_active.load(Ordering::SeqCst) <= 3);
    assert_eq!(reporter.started.load(Ordering::SeqCst), 8);
}

#[test]
fn test_outputs_mirror_input_names() {
    let dir = tempfile::tempdir().unwrap();
    let paths = vec![PathBuf::from("x/first.png"), PathBuf::from("y/second.tif")];
    let codec = CountingCodec::default();

    run_batch(&paths, &config_for(dir.path(), 2), &codec, &NoOpReporter).unwrap();

    let mut written = codec.written.lock().unwrap().clone();
    written.sort();
    let out = std::path::absolute(dir.path()).unwrap();
    assert_eq!(written, vec![out.join("first.png"), out.join("second.tif")]);
}

#[test]
fn test_duplicate_output_name_fails_later_file() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("x").join("plate.png");
    let second = dir.path().join("y").join("plate.png");
    for path in [&first, &second] {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    }
    common::write_triptych_png(&first, WIDTH, BAND_HEIGHT, Shift::new(1, 1), Shift::ZERO);
    common::write_triptych_png(&second, WIDTH, BAND_HEIGHT, Shift::ZERO, Shift::new(2, 2));

    let out_dir = dir.path().join("out");
    let paths = vec![first.clone(), second.clone()];
    let report = run_batch(&paths, &config_for(&out_dir, 2), &ImageCrateCodec, &NoOpReporter).unwrap();

    assert_eq!(report.succeeded, 1);
    let written = report.outcomes[0].1.as_ref().unwrap();
    assert_eq!(written.input, first);
    match &report.outcomes[1].1 {
        Err(TrichromeError::DuplicateOutput { input, first: owner }) => {
            assert_eq!(input, &second);
            assert_eq!(owner, &first);
        }
        other => panic!("expected DuplicateOutput, got {other:?}"),
    }
    assert_eq!(std::fs::read_dir(&out_dir).unwrap().count(), 1);
    assert!(matches!(
        report.into_result(),
        Err(TrichromeError::Batch { failed: 1, total: 2 })
    ));
}

#[test]
fn test_farbfeld_plate_written_in_same_format() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("plate.ff");
    let plate = common::triptych(WIDTH, BAND_HEIGHT, Shift::new(2, -1), Shift::new(-3, 2));
    DynamicImage::ImageLuma16(plate)
        .to_rgba16()
        .save_with_format(&input, ImageFormat::Farbfeld)
        .unwrap();

    let out_dir = dir.path().join("out");
    let report = run_batch(&[input], &config_for(&out_dir, 1), &ImageCrateCodec, &NoOpReporter).unwrap();

    assert_eq!(report.succeeded, 1, "outcomes: {:?}", report.outcomes);
    let written = image::ImageReader::open(out_dir.join("plate.ff"))
        .unwrap()
        .with_guessed_format()
        .unwrap();
    assert_eq!(written.format(), Some(ImageFormat::Farbfeld));
    assert_eq!(written.decode().unwrap().color(), image::ColorType::Rgba16);
}

/// Codec whose decoder panics for one file.
struct PanickyCodec;

impl ImageCodec for PanickyCodec {
    fn decode(&self, path: &Path) -> Result<DecodedFrame> {
        if path.ends_with("boom.png") {
            panic!("decoder exploded");
        }
        CountingCodec::default().decode(path)
    }

    fn encode(&self, _composite: &Composite, _format: ImageFormat, _path: &Path) -> Result<()> {
        Ok(())
    }
}

#[test]
fn test_panic_is_isolated_to_its_file() {
    let dir = tempfile::tempdir().unwrap();
    let paths = vec![
        PathBuf::from("ok1.png"),
        PathBuf::from("boom.png"),
        PathBuf::from("ok2.png"),
    ];

    let report = run_batch(&paths, &config_for(dir.path(), 1), &PanickyCodec, &NoOpReporter).unwrap();

    assert_eq!(report.succeeded, 2);
    match &report.outcomes[1].1 {
        Err(TrichromeError::WorkerPanic(msg)) => assert!(msg.contains("decoder exploded")),
        other => panic!("expected WorkerPanic, got {other:?}"),
    }
}

#[test]
fn test_decode_error_is_per_file() {
    let dir = tempfile::tempdir().unwrap();
    let bad = dir.path().join("bad.png");
    std::fs::write(&bad, b"\x89PNG\r\n\x1a\nthis is not a png").unwrap();

    let report = run_batch(
        &[bad],
        &config_for(&dir.path().join("out"), 1),
        &ImageCrateCodec,
        &NoOpReporter,
    )
    .unwrap();
    assert_eq!(report.succeeded, 0);
    assert!(matches!(report.outcomes[0].1, Err(TrichromeError::Decode(_))));
}

#[test]
fn test_zero_workers_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let err = run_batch(&[], &config_for(dir.path(), 0), &ImageCrateCodec, &NoOpReporter).unwrap_err();
    assert!(matches!(err, TrichromeError::InvalidConfig(_)), "got {err}");
}

#[test]
fn test_empty_batch_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let report = run_batch(&[], &config_for(dir.path(), 4), &ImageCrateCodec, &NoOpReporter).unwrap();
    assert_eq!(report.total, 0);
    assert!(report.into_result().is_ok());
}

#[test]
fn test_output_dir_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b").join("c");
    run_batch(&[], &config_for(&nested, 1), &ImageCrateCodec, &NoOpReporter).unwrap();
    assert!(nested.is_dir());
}

#[test]
fn test_output_dir_failure_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, b"x").unwrap();

    let err = run_batch(
        &[PathBuf::from("a.png")],
        &config_for(&blocker.join("sub"), 1),
        &ImageCrateCodec,
        &NoOpReporter,
    )
    .unwrap_err();
    assert!(matches!(err, TrichromeError::Directory { .. }), "got {err}");
}
