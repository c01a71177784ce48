//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce la progress bar e le statistiche di compressione.
//!
//! ## Responsabilità:
//! - Progress bar visual con `indicatif` per feedback real-time
//! - Statistiche aggregate calcolate dai `CompressionOutcome` del batch
//! - Calcolo percentuali di riduzione e byte risparmiati
//! - Report finale in forma leggibile
//!
//! ## Componenti principali:
//! - `ProgressManager`: Gestisce progress bar principale
//! - `BatchStats`: Statistiche cumulative del batch
//!
//! ## Statistiche tracciate:
//! - **files_processed**: Totale file completati
//! - **files_optimized**: File effettivamente ridotti
//! - **files_unchanged**: File copiati invariati dal size guard
//! - **errors**: File falliti
//! - **total_bytes_saved**: Byte totali risparmiati
//! - **total_original_size**: Dimensione totale dei file originali riusciti
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:00:04] [========================================] 12/12 (100%) Completed scan.pdf
//! ```

use crate::file_manager::FileManager;
use crate::job::CompressionOutcome;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::time::Duration;

/// Manages progress reporting for a batch
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total_files: u64) -> Self {
        let bar = ProgressBar::new(total_files);

        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
        {
            bar.set_style(style.progress_chars("=>-"));
        }

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Hidden bar, used when output goes elsewhere
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Update progress with a message
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    /// Set a custom message without incrementing
    pub fn set_message(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

/// Aggregate statistics for a finished or running batch
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct BatchStats {
    pub files_processed: usize,
    pub files_optimized: usize,
    pub files_unchanged: usize,
    pub errors: usize,
    pub total_bytes_saved: u64,
    pub total_original_size: u64,
}

impl BatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_outcomes(outcomes: &[CompressionOutcome]) -> Self {
        let mut stats = Self::new();
        for outcome in outcomes {
            stats.add(outcome);
        }
        stats
    }

    pub fn add(&mut self, outcome: &CompressionOutcome) {
        self.files_processed += 1;
        match outcome {
            CompressionOutcome::Success { original_size, new_size, .. } => {
                if new_size < original_size {
                    self.files_optimized += 1;
                } else {
                    self.files_unchanged += 1;
                }
                self.total_original_size += original_size;
                self.total_bytes_saved += original_size.saturating_sub(*new_size);
            }
            CompressionOutcome::Failure { .. } => self.errors += 1,
        }
    }

    pub fn overall_reduction_percent(&self) -> f64 {
        if self.total_original_size > 0 {
            (self.total_bytes_saved as f64 / self.total_original_size as f64) * 100.0
        } else {
            0.0
        }
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Processed: {} files | Compressed: {} | Unchanged: {} | Errors: {} | Total saved: {} ({:.2}%)",
            self.files_processed,
            self.files_optimized,
            self.files_unchanged,
            self.errors,
            FileManager::format_size(self.total_bytes_saved),
            self.overall_reduction_percent()
        )
    }
}
