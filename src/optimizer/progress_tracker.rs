//! # Progress Tracking Module
//!
//! Traduce gli snapshot di `BatchState` in feedback per l'utente.
//! Gestisce sia output JSON che progress bar tradizionale.
//!
//! Va usato dentro la callback di `BatchOptimizer::run_batch`: confronta ogni
//! snapshot con l'ultimo visto ed emette solo gli eventi nuovi.

use crate::{
    json_output::JsonMessage,
    optimizer::batch_state::BatchState,
    progress::{BatchStats, ProgressManager},
};

/// Renders batch snapshots as a progress bar or JSON-lines events
pub struct ProgressTracker {
    json_output: bool,
    progress_manager: ProgressManager,
    seen_admitted: usize,
    seen_completed: usize,
    stats: BatchStats,
}

impl ProgressTracker {
    pub fn new(total_files: usize, json_output: bool) -> Self {
        let progress_manager = if json_output {
            ProgressManager::hidden()
        } else {
            ProgressManager::new(total_files as u64)
        };

        Self {
            json_output,
            progress_manager,
            seen_admitted: 0,
            seen_completed: 0,
            stats: BatchStats::new(),
        }
    }

    /// Consume one snapshot
    pub fn observe(&mut self, state: &BatchState) {
        if state.admitted_count > self.seen_admitted {
            if let (true, Some(path)) = (self.json_output, &state.current_file) {
                let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
                JsonMessage::file_start(path.clone(), size, state.admitted_count - 1, state.total).emit();
            }
            self.seen_admitted = state.admitted_count;
        }

        for outcome in state.results.iter().skip(self.seen_completed) {
            self.stats.add(outcome);

            if self.json_output {
                JsonMessage::file_complete(outcome).emit();
                JsonMessage::progress(self.stats.files_processed, state.total, &state.status_message, &self.stats).emit();
            } else {
                let message = match outcome.error_message() {
                    None => format!("[OK] {}: {:.1}% saved", outcome.display_name(), outcome.reduction_percent()),
                    Some(err) => format!("[ERROR] {}: {}", outcome.display_name(), err),
                };
                self.progress_manager.update(&message);
            }
        }
        self.seen_completed = state.results.len();

        if !self.json_output && state.is_processing {
            self.progress_manager.set_message(&state.status_message);
        }
    }

    /// Close the bar and return the final statistics
    pub fn finish(&self, state: &BatchState) -> BatchStats {
        self.progress_manager
            .finish(&format!("{} | {}", state.status_message, self.stats.format_summary()));
        self.stats.clone()
    }

    pub fn stats(&self) -> &BatchStats {
        &self.stats
    }
}
