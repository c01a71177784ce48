//! Scenari completi: batch reali su file temporanei, dal backend fino a `BatchState`.

use crate::test_support::{sample_jpeg, sample_pdf};
use crate::{
    BatchOptimizer, BatchStats, CompressError, CompressionOutcome, Compressor, Config, OutputStrategy,
    PdfCompressionMode, SettingsHandle,
};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};

/// `dir/<name>_compressed.<ext>`
fn compressed_sibling(path: &Path) -> PathBuf {
    let stem = path.file_stem().unwrap().to_string_lossy();
    let ext = path.extension().unwrap().to_string_lossy();
    path.with_file_name(format!("{}_compressed.{}", stem, ext))
}

fn optimizer(config: Config) -> BatchOptimizer {
    BatchOptimizer::new(SettingsHandle::new(config))
}

#[tokio::test]
async fn five_jpegs_next_to_originals() {
    let temp_dir = TempDir::new().unwrap();
    let paths: Vec<PathBuf> = (1..=5)
        .map(|i| {
            let path = temp_dir.path().join(format!("IMG_000{}.jpg", i));
            sample_jpeg(&path, 320, 240, 100);
            path
        })
        .collect();

    let optimizer = optimizer(Config { quality: 0.8, ..Default::default() });
    let mut completed_seen = Vec::new();
    let outcomes = optimizer
        .compress_files(paths.clone(), OutputStrategy::SameAsOriginal, |state| {
            completed_seen.push(state.completed_count);
        })
        .await;

    assert_eq!(outcomes.len(), 5);
    for outcome in &outcomes {
        match outcome {
            CompressionOutcome::Success { original_path, destination_path, .. } => {
                assert_eq!(destination_path, &compressed_sibling(original_path));
                assert!(destination_path.exists());
            }
            other => panic!("unexpected failure: {:?}", other),
        }
    }
    for path in &paths {
        assert!(path.exists());
    }

    let state = optimizer.state();
    assert_eq!(state.completed_count, 5);
    assert_eq!(state.progress, 1.0);
    assert_eq!(state.status_message, "Batch Complete");
    assert!(state.current_file.is_none());
    assert!(!state.is_processing);
    assert!(completed_seen.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn corrupt_pdf_among_valid_ones() {
    let temp_dir = TempDir::new().unwrap();
    let mut paths = Vec::new();
    for i in 0..3 {
        let path = temp_dir.path().join(format!("minutes_{}.pdf", i));
        sample_pdf(&path, 180, true);
        paths.push(path);
    }
    let corrupt = temp_dir.path().join("damaged.pdf");
    std::fs::write(&corrupt, b"%PDF-1.4\nthis is not really a pdf").unwrap();
    paths.insert(1, corrupt.clone());

    let outcomes = optimizer(Config::default())
        .compress_files(paths, OutputStrategy::SameAsOriginal, |_| {})
        .await;

    assert_eq!(outcomes.len(), 4);
    let failures: Vec<_> = outcomes.iter().filter(|o| !o.is_success()).collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(
        failures[0],
        &CompressionOutcome::Failure {
            original_path: corrupt.clone(),
            original_size: std::fs::metadata(&corrupt).unwrap().len(),
            reason: CompressError::InvalidInput("damaged.pdf".to_string()),
        }
    );
    assert!(!compressed_sibling(&corrupt).exists());

    let stats = BatchStats::from_outcomes(&outcomes);
    assert_eq!(stats.errors, 1);
    assert_eq!(stats.files_processed, 4);
}

#[tokio::test]
async fn specific_directory_keeps_file_names() {
    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("compressed");
    let photo = temp_dir.path().join("beach.JPEG");
    let report = temp_dir.path().join("report.pdf");
    sample_jpeg(&photo, 200, 200, 100);
    sample_pdf(&report, 120, true);

    let outcomes = optimizer(Config::default())
        .compress_files(vec![photo, report], OutputStrategy::Specific(out.clone()), |_| {})
        .await;

    assert!(outcomes.iter().all(CompressionOutcome::is_success));
    assert!(out.join("beach.JPEG").exists());
    assert!(out.join("report.pdf").exists());
}

#[tokio::test]
async fn outputs_never_grow() {
    let temp_dir = TempDir::new().unwrap();
    let tiff = temp_dir.path().join("plate.tif");
    image::RgbImage::from_fn(64, 64, |x, y| image::Rgb([x as u8, y as u8, 7]))
        .save(&tiff)
        .unwrap();
    let jpeg = temp_dir.path().join("photo.jpg");
    sample_jpeg(&jpeg, 128, 96, 100);
    let pdf = temp_dir.path().join("scan.pdf");
    sample_pdf(&pdf, 240, false);

    for mode in [PdfCompressionMode::Standard, PdfCompressionMode::Aggressive] {
        let out = temp_dir.path().join(mode.to_string());
        let config = Config { quality: 1.0, pdf_mode: mode, ..Default::default() };
        let outcomes = optimizer(config)
            .compress_files(
                vec![tiff.clone(), jpeg.clone(), pdf.clone()],
                OutputStrategy::Specific(out),
                |_| {},
            )
            .await;

        assert_eq!(outcomes.len(), 3);
        for outcome in outcomes {
            match outcome {
                CompressionOutcome::Success { destination_path, original_size, new_size, .. } => {
                    assert!(new_size <= original_size);
                    assert_eq!(std::fs::metadata(&destination_path).unwrap().len(), new_size);
                }
                other => panic!("unexpected failure: {:?}", other),
            }
        }
    }
}

#[tokio::test]
async fn unsupported_file_does_not_stop_batch() {
    let temp_dir = TempDir::new().unwrap();
    let gif = temp_dir.path().join("anim.GIF");
    std::fs::write(&gif, b"GIF89a").unwrap();
    let jpeg = temp_dir.path().join("ok.jpg");
    sample_jpeg(&jpeg, 64, 64, 100);

    let outcomes = optimizer(Config::default())
        .compress_files(vec![gif, jpeg], OutputStrategy::SameAsOriginal, |_| {})
        .await;

    let reasons: Vec<_> = outcomes
        .iter()
        .filter_map(|o| match o {
            CompressionOutcome::Failure { reason, .. } => Some(reason.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(reasons, vec![CompressError::UnsupportedFormat("gif".to_string())]);
    assert_eq!(outcomes.iter().filter(|o| o.is_success()).count(), 1);
}

#[tokio::test]
async fn single_file_backend() {
    let temp_dir = TempDir::new().unwrap();
    let pdf = temp_dir.path().join("letter.pdf");
    sample_pdf(&pdf, 60, true);
    let compressor = Compressor::default();
    let config = Config { pdf_mode: PdfCompressionMode::Aggressive, ..Default::default() };

    let dest = assert_ok!(compressor.compress(&pdf, temp_dir.path(), &config).await);
    assert_eq!(dest, temp_dir.path().join("letter_compressed.pdf"));
    assert_ok!(lopdf::Document::load(&dest));

    assert_err!(
        compressor
            .compress(&temp_dir.path().join("missing.png"), temp_dir.path(), &config)
            .await
    );
}
