//! # Task Optimizer Module
//!
//! Worker per la compressione di singoli file.
//! Separato dall'orchestratore principale per maggiore modularità.
//!
//! Il worker non tocca mai lo stato del batch: riceve un `CompressionJob`
//! e restituisce per valore esattamente un `CompressionOutcome`.

use crate::{
    compressor::Compressor,
    file_manager::FileManager,
    job::{CompressionJob, CompressionOutcome},
};
use tracing::{debug, warn};

/// Worker per elaborazione singoli file
#[derive(Clone, Default)]
pub struct TaskOptimizer {
    compressor: Compressor,
}

impl TaskOptimizer {
    pub fn new(compressor: Compressor) -> Self {
        Self { compressor }
    }

    /// Processa un singolo job
    pub async fn process(&self, job: CompressionJob) -> CompressionOutcome {
        let original_size = FileManager::file_size(&job.input).await;
        debug!("Starting {} ({} bytes) -> {}", job.input.display(), original_size, job.destination.display());

        match self.compressor.compress_to(&job.input, &job.destination, &job.config).await {
            Ok(new_size) => CompressionOutcome::Success {
                original_path: job.input,
                destination_path: job.destination,
                original_size,
                new_size,
            },
            Err(reason) => {
                warn!("Failed to compress {}: {}", job.input.display(), reason);
                CompressionOutcome::Failure {
                    original_path: job.input,
                    original_size,
                    reason,
                }
            }
        }
    }
}
