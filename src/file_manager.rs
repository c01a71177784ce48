//! # File Management Module
//!
//! Questo modulo gestisce la classificazione dei file e la discovery degli input.
//!
//! ## Responsabilità:
//! - Dispatch per estensione (case-insensitive) verso immagine, PDF o non supportato
//! - Discovery ricorsiva di file supportati per gli input della CLI
//! - Deduplicazione degli input mantenendo l'ordine
//! - Utilità per dimensioni file e percentuali di riduzione
//!
//! ## Formati supportati:
//! - **Immagini**: JPG, JPEG, PNG, HEIC, TIF, TIFF
//! - **Documenti**: PDF
//!
//! ## Esempio:
//! ```rust
//! use nanopress::file_manager::{FileKind, ImageKind};
//! use std::path::Path;
//!
//! assert_eq!(FileKind::from_path(Path::new("scan.PDF")), FileKind::Pdf);
//! assert_eq!(FileKind::from_path(Path::new("a.jpeg")), FileKind::Image(ImageKind::Jpeg));
//! ```

use crate::error::CompressError;
use anyhow::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::fs;
use tracing::{debug, error, warn};
use walkdir::WalkDir;

/// Image formats the backend re-encodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Heic,
    Tiff,
}

/// Dispatch table entry for a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileKind {
    Image(ImageKind),
    Pdf,
    /// Lowercased extension, empty when the file has none
    Unsupported(String),
}

impl FileKind {
    /// Classify by normalized extension
    pub fn from_path(path: &Path) -> Self {
        let ext = normalized_extension(path);
        match ext.as_str() {
            "jpg" | "jpeg" => Self::Image(ImageKind::Jpeg),
            "png" => Self::Image(ImageKind::Png),
            "heic" => Self::Image(ImageKind::Heic),
            "tif" | "tiff" => Self::Image(ImageKind::Tiff),
            "pdf" => Self::Pdf,
            _ => Self::Unsupported(ext),
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported(_))
    }
}

/// Lowercased extension of `path`, or an empty string
pub fn normalized_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Manages file operations and discovery
pub struct FileManager;

impl FileManager {
    /// Size of a file in bytes, 0 if it cannot be read
    pub async fn file_size(path: &Path) -> u64 {
        match fs::metadata(path).await {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                debug!("Could not stat {}: {}", path.display(), e);
                0
            }
        }
    }

    /// Check if a file format is supported
    pub fn is_supported_format(path: &Path) -> bool {
        FileKind::from_path(path).is_supported()
    }

    /// Expand files and directories into a deduplicated list of supported files.
    ///
    /// Explicit file arguments are kept even when unsupported so the batch
    /// reports them as `UnsupportedFormat`; directory contents are filtered.
    pub fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut seen = HashSet::new();
        let mut files = Vec::new();

        for input in inputs {
            if input.is_dir() {
                for file in Self::find_media_files(input)? {
                    if seen.insert(file.clone()) {
                        files.push(file);
                    }
                }
            } else if input.exists() {
                if seen.insert(input.clone()) {
                    files.push(input.clone());
                } else {
                    warn!("File already added: {}", input.display());
                }
            } else {
                return Err(anyhow::anyhow!("Input does not exist: {}", input.display()));
            }
        }

        Ok(files)
    }

    /// Find all supported files in a directory, sorted for stable batches
    pub fn find_media_files(media_dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(media_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            if Self::is_supported_format(path) {
                files.push(path.to_path_buf());
            }
        }

        Ok(files)
    }

    /// Create a uniquely named temporary file inside `dir`, creating `dir` if needed.
    ///
    /// Living next to the destination keeps the final rename on one filesystem.
    /// The file is removed when the handle drops unless it is persisted.
    pub fn temp_file_in(dir: &Path, prefix: &str, suffix: &str) -> Result<NamedTempFile, CompressError> {
        std::fs::create_dir_all(dir).map_err(|e| {
            error!("Failed to create output directory {}: {}", dir.display(), e);
            CompressError::SaveFailed
        })?;

        tempfile::Builder::new()
            .prefix(prefix)
            .suffix(suffix)
            .tempfile_in(dir)
            .map_err(|e| {
                error!("Failed to create temporary file in {}: {}", dir.display(), e);
                CompressError::SaveFailed
            })
    }

    /// Atomically move a temporary file onto `destination`, replacing any existing file
    pub fn persist(temp: NamedTempFile, destination: &Path) -> Result<(), CompressError> {
        temp.persist(destination).map(|_| ()).map_err(|e| {
            error!("Failed to move output to {}: {}", destination.display(), e.error);
            CompressError::SaveFailed
        })
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    /// Calculate percentage reduction
    pub fn calculate_reduction(original_size: u64, new_size: u64) -> f64 {
        if original_size == 0 {
            0.0
        } else {
            ((original_size as f64 - new_size as f64) / original_size as f64) * 100.0
        }
    }
}
