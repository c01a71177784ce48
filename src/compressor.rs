//! # Compression Backend
//!
//! Punto d'ingresso per la compressione di un singolo file.
//!
//! ## Responsabilità:
//! - Dispatch per estensione verso `ImageProcessor` o `PdfProcessor`
//! - Calcolo della destinazione (regola `_compressed` / nome originale)
//! - Applicazione del `SizeGuard` dopo ogni compressione
//! - Esecuzione del lavoro bloccante su `spawn_blocking`
//!
//! ## Contratto:
//! `compress(input, output_dir, config) -> Result<PathBuf, CompressError>`:
//! in caso di successo il file di destinazione esiste ed è ≤ dell'originale.

use crate::config::Config;
use crate::error::CompressError;
use crate::file_manager::FileKind;
use crate::image_processor::ImageProcessor;
use crate::optimizer::path_resolver::PathResolver;
use crate::pdf_processor::{LopdfFilter, PdfFilter, PdfProcessor};
use crate::size_guard::SizeGuard;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error};

/// Stateless compression backend; cheap to clone and share across tasks
#[derive(Clone)]
pub struct Compressor {
    pdf_filter: Arc<dyn PdfFilter>,
}

impl Default for Compressor {
    fn default() -> Self {
        Self::new(Arc::new(LopdfFilter))
    }
}

impl Compressor {
    pub fn new(pdf_filter: Arc<dyn PdfFilter>) -> Self {
        Self { pdf_filter }
    }

    /// Compress `input` into `output_dir` under the derived destination name
    pub async fn compress(&self, input: &Path, output_dir: &Path, config: &Config) -> Result<PathBuf, CompressError> {
        let (source, dir) = (input.to_path_buf(), output_dir.to_path_buf());
        let destination = tokio::task::spawn_blocking(move || PathResolver::destination_for(&source, &dir))
            .await
            .map_err(|e| {
                error!("Destination lookup failed to complete: {}", e);
                CompressError::ConversionFailed
            })?;
        self.compress_to(input, &destination, config).await?;
        Ok(destination)
    }

    /// Compress `input` into an already resolved `destination`.
    ///
    /// Returns the final size of the destination.
    pub async fn compress_to(&self, input: &Path, destination: &Path, config: &Config) -> Result<u64, CompressError> {
        let kind = FileKind::from_path(input);
        if let FileKind::Unsupported(ext) = kind {
            return Err(CompressError::UnsupportedFormat(ext));
        }

        let input = input.to_path_buf();
        let destination = destination.to_path_buf();
        let config = config.clone();
        let pdf_filter = self.pdf_filter.clone();

        tokio::task::spawn_blocking(move || {
            Self::compress_blocking(&input, &destination, &config, kind, pdf_filter)
        })
        .await
        .map_err(|e| {
            error!("Compression task failed to complete: {}", e);
            CompressError::ConversionFailed
        })?
    }

    fn compress_blocking(
        input: &Path,
        destination: &Path,
        config: &Config,
        kind: FileKind,
        pdf_filter: Arc<dyn PdfFilter>,
    ) -> Result<u64, CompressError> {
        match kind {
            FileKind::Image(image_kind) => {
                ImageProcessor::new(config).compress(input, destination, image_kind)?;
            }
            FileKind::Pdf => {
                PdfProcessor::new(pdf_filter, config.pdf_passes).compress(input, destination, config.pdf_mode)?;
            }
            FileKind::Unsupported(ext) => return Err(CompressError::UnsupportedFormat(ext)),
        }

        let size = SizeGuard::enforce(input, destination)?;
        debug!("Compressed {} -> {} ({} bytes)", input.display(), destination.display(), size);
        Ok(size)
    }
}
