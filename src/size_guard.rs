//! # Size Guard Module
//!
//! Post-condizione applicata dopo ogni compressione: l'output non deve mai
//! superare l'input. Se la compressione non ha ridotto il file, l'output viene
//! sostituito da una copia byte-per-byte dell'originale e l'operazione resta
//! un successo con `new_size == original_size`.

use crate::error::CompressError;
use std::fs;
use std::path::Path;
use tracing::{debug, error};

/// Enforces "never larger than the original" on a freshly written destination
pub struct SizeGuard;

impl SizeGuard {
    /// Returns the final size of `destination`.
    ///
    /// Blocking; call from a blocking context.
    pub fn enforce(original: &Path, destination: &Path) -> Result<u64, CompressError> {
        let original_size = fs::metadata(original)
            .map(|m| m.len())
            .map_err(|e| {
                error!("Cannot stat original {}: {}", original.display(), e);
                CompressError::invalid_input(original)
            })?;
        let compressed_size = fs::metadata(destination).map(|m| m.len()).unwrap_or(u64::MAX);

        if compressed_size < original_size {
            return Ok(compressed_size);
        }

        debug!(
            "Compressed output not smaller ({} >= {} bytes), copying original: {}",
            compressed_size,
            original_size,
            original.display()
        );

        if let Err(e) = fs::remove_file(destination) {
            if e.kind() != std::io::ErrorKind::NotFound {
                error!("Failed to discard {}: {}", destination.display(), e);
                return Err(CompressError::SaveFailed);
            }
        }

        fs::copy(original, destination).map_err(|e| {
            error!(
                "Failed to copy original {} to {}: {}",
                original.display(),
                destination.display(),
                e
            );
            CompressError::SaveFailed
        })
    }
}
