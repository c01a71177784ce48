//! # JSON Output Module
//!
//! Questo modulo gestisce l'output strutturato in JSON per l'uso programmatico
//! (es. un'interfaccia grafica che pilota il binario).
//!
//! ## Responsabilità:
//! - Emette messaggi JSON-lines su stdout per gli eventi del batch
//! - Converte `CompressionOutcome` e `BatchStats` nel formato di scambio
//!
//! ## Tipi di messaggi:
//! - `start`: Inizio del batch
//! - `file_start`: Un file è stato ammesso
//! - `file_complete`: Un file è terminato (successo o errore)
//! - `progress`: Progresso corrente dopo ogni completamento
//! - `complete`: Fine del batch con statistiche finali
//! - `error`: Errore fatale prima o durante l'avvio

use crate::config::{Config, PdfCompressionMode};
use crate::job::CompressionOutcome;
use crate::progress::BatchStats;
use serde::Serialize;
use std::path::PathBuf;

/// Tipo di messaggio JSON
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JsonMessage {
    Start {
        inputs: Vec<PathBuf>,
        output_dir: Option<PathBuf>,
        total_files: usize,
        config: JsonConfig,
    },

    FileStart {
        path: PathBuf,
        size: u64,
        index: usize,
        total: usize,
    },

    FileComplete {
        path: PathBuf,
        destination: Option<PathBuf>,
        original_size: u64,
        compressed_size: Option<u64>,
        reduction_percent: f64,
        error: Option<String>,
        error_kind: Option<&'static str>,
    },

    Progress {
        current: usize,
        total: usize,
        percentage: f64,
        status: String,
        files_optimized: usize,
        files_unchanged: usize,
        errors: usize,
        bytes_saved: u64,
    },

    Complete {
        files_processed: usize,
        files_optimized: usize,
        files_unchanged: usize,
        errors: usize,
        total_bytes_saved: u64,
        average_reduction: f64,
        duration_seconds: f64,
        cancelled: bool,
    },

    Error {
        message: String,
        details: Option<String>,
    },
}

/// Configurazione riportata nel messaggio `start`
#[derive(Debug, Serialize)]
pub struct JsonConfig {
    pub quality: f32,
    pub jpeg_quality: u8,
    pub pdf_mode: PdfCompressionMode,
    pub workers: usize,
}

impl From<&Config> for JsonConfig {
    fn from(config: &Config) -> Self {
        Self {
            quality: config.quality,
            jpeg_quality: config.jpeg_quality(),
            pdf_mode: config.pdf_mode,
            workers: config.workers,
        }
    }
}

impl JsonMessage {
    /// Emette il messaggio JSON su stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }

    pub fn start(inputs: Vec<PathBuf>, output_dir: Option<PathBuf>, total_files: usize, config: &Config) -> Self {
        Self::Start {
            inputs,
            output_dir,
            total_files,
            config: JsonConfig::from(config),
        }
    }

    pub fn file_start(path: PathBuf, size: u64, index: usize, total: usize) -> Self {
        Self::FileStart { path, size, index, total }
    }

    pub fn file_complete(outcome: &CompressionOutcome) -> Self {
        match outcome {
            CompressionOutcome::Success {
                original_path,
                destination_path,
                original_size,
                new_size,
            } => Self::FileComplete {
                path: original_path.clone(),
                destination: Some(destination_path.clone()),
                original_size: *original_size,
                compressed_size: Some(*new_size),
                reduction_percent: outcome.reduction_percent(),
                error: None,
                error_kind: None,
            },
            CompressionOutcome::Failure {
                original_path,
                original_size,
                reason,
            } => Self::FileComplete {
                path: original_path.clone(),
                destination: None,
                original_size: *original_size,
                compressed_size: None,
                reduction_percent: 0.0,
                error: Some(reason.to_string()),
                error_kind: Some(reason.kind()),
            },
        }
    }

    pub fn progress(current: usize, total: usize, status: &str, stats: &BatchStats) -> Self {
        let percentage = if total > 0 {
            (current as f64 / total as f64) * 100.0
        } else {
            100.0
        };

        Self::Progress {
            current,
            total,
            percentage,
            status: status.to_string(),
            files_optimized: stats.files_optimized,
            files_unchanged: stats.files_unchanged,
            errors: stats.errors,
            bytes_saved: stats.total_bytes_saved,
        }
    }

    pub fn complete(stats: &BatchStats, duration_seconds: f64, cancelled: bool) -> Self {
        Self::Complete {
            files_processed: stats.files_processed,
            files_optimized: stats.files_optimized,
            files_unchanged: stats.files_unchanged,
            errors: stats.errors,
            total_bytes_saved: stats.total_bytes_saved,
            average_reduction: stats.overall_reduction_percent(),
            duration_seconds,
            cancelled,
        }
    }

    pub fn error(message: String, details: Option<String>) -> Self {
        Self::Error { message, details }
    }
}
