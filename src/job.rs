//! # Job & Outcome Module
//!
//! Modello dati di un singolo lavoro di compressione e del suo risultato.
//!
//! ## Responsabilità:
//! - `CompressionJob`: input, snapshot della configurazione e destinazione
//!   risolta. Immutabile una volta avviato.
//! - `CompressionOutcome`: unione `Success` / `Failure`, esattamente uno per job
//! - Helper per riduzione percentuale, byte risparmiati e testo d'errore

use crate::config::Config;
use crate::error::CompressError;
use crate::file_manager::FileManager;
use crate::optimizer::path_resolver::PathResolver;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// One unit of work for the batch orchestrator
#[derive(Debug, Clone)]
pub struct CompressionJob {
    pub input: PathBuf,
    /// Configuration as it was when the job was created
    pub config: Config,
    pub destination: PathBuf,
}

impl CompressionJob {
    /// Job writing into `output_dir` under the derived destination name.
    ///
    /// Resolving the name touches the filesystem; keep it off async tasks.
    pub fn new(input: impl Into<PathBuf>, output_dir: impl AsRef<Path>, config: Config) -> Self {
        let input = input.into();
        let destination = PathResolver::destination_for(&input, output_dir.as_ref());
        Self::resolved(input, destination, config)
    }

    /// Job with a destination chosen by the caller
    pub fn resolved(input: PathBuf, destination: PathBuf, config: Config) -> Self {
        Self {
            input,
            config,
            destination,
        }
    }

    /// Same job written somewhere else
    pub fn with_destination(mut self, destination: PathBuf) -> Self {
        self.destination = destination;
        self
    }

    /// File name used in status messages
    pub fn display_name(&self) -> String {
        display_name(&self.input)
    }
}

/// Result of a single job
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompressionOutcome {
    Success {
        original_path: PathBuf,
        destination_path: PathBuf,
        original_size: u64,
        new_size: u64,
    },
    Failure {
        original_path: PathBuf,
        original_size: u64,
        reason: CompressError,
    },
}

impl CompressionOutcome {
    pub fn original_path(&self) -> &Path {
        match self {
            Self::Success { original_path, .. } | Self::Failure { original_path, .. } => original_path,
        }
    }

    pub fn original_size(&self) -> u64 {
        match self {
            Self::Success { original_size, .. } | Self::Failure { original_size, .. } => *original_size,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Percentage saved; 0 for failures
    pub fn reduction_percent(&self) -> f64 {
        match self {
            Self::Success { original_size, new_size, .. } => {
                FileManager::calculate_reduction(*original_size, *new_size)
            }
            Self::Failure { .. } => 0.0,
        }
    }

    pub fn saved_bytes(&self) -> u64 {
        match self {
            Self::Success { original_size, new_size, .. } => original_size.saturating_sub(*new_size),
            Self::Failure { .. } => 0,
        }
    }

    /// User-facing error text for failures
    pub fn error_message(&self) -> Option<String> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { reason, .. } => Some(reason.to_string()),
        }
    }

    pub fn display_name(&self) -> String {
        display_name(self.original_path())
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
