//! # Batch State Module
//!
//! Aggregato osservabile di un batch in corso.
//!
//! ## Responsabilità:
//! - Contatori (totale, ammessi, completati) e frazione di progresso
//! - Messaggio di stato leggibile e file attualmente in elaborazione
//! - Lista dei risultati in ordine di completamento
//!
//! Un solo scrittore: il task coordinatore di `BatchOptimizer`. I collaboratori
//! ricevono copie (`Clone`) tramite callback o canale `watch`.

use crate::job::CompressionOutcome;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Snapshot of a running or finished batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchState {
    pub total: usize,
    pub admitted_count: usize,
    pub completed_count: usize,
    /// Completed fraction in `[0, 1]`
    pub progress: f64,
    pub status_message: String,
    pub current_file: Option<PathBuf>,
    /// Outcomes in completion order
    pub results: Vec<CompressionOutcome>,
    pub is_processing: bool,
    pub cancelled: bool,
}

impl Default for BatchState {
    fn default() -> Self {
        Self {
            total: 0,
            admitted_count: 0,
            completed_count: 0,
            progress: 0.0,
            status_message: "Ready".to_string(),
            current_file: None,
            results: Vec::new(),
            is_processing: false,
            cancelled: false,
        }
    }
}

impl BatchState {
    /// Fresh state for a batch of `total` jobs
    pub(crate) fn start(total: usize) -> Self {
        Self {
            total,
            status_message: "Starting...".to_string(),
            is_processing: true,
            ..Default::default()
        }
    }

    pub(crate) fn record_admission(&mut self, input: &Path) {
        self.admitted_count += 1;
        self.current_file = Some(input.to_path_buf());
        if !self.cancelled {
            self.status_message = format!("Processing {}...", file_label(input));
        }
    }

    pub(crate) fn record_completion(&mut self, outcome: CompressionOutcome) {
        self.completed_count += 1;
        self.progress = if self.total == 0 {
            1.0
        } else {
            (self.completed_count as f64 / self.total as f64).min(1.0)
        };

        if !self.cancelled {
            let name = outcome.display_name();
            self.status_message = if outcome.is_success() {
                format!("Completed {}", name)
            } else {
                format!("Failed {}", name)
            };
        }
        self.results.push(outcome);
    }

    pub(crate) fn mark_cancelling(&mut self) {
        self.cancelled = true;
        self.status_message = "Cancelling...".to_string();
    }

    pub(crate) fn finish(&mut self) {
        self.status_message = if self.cancelled {
            "Cancelled".to_string()
        } else {
            "Batch Complete".to_string()
        };
        self.progress = 1.0;
        self.is_processing = false;
        self.current_file = None;
    }

    /// Jobs admitted but not yet completed
    pub fn in_flight(&self) -> usize {
        self.admitted_count - self.completed_count
    }

    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.results.len() - self.success_count()
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
