//! # NanoPress Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare del motore di compressione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per altri consumatori
//!
//! ## Architettura dei moduli:
//! - `config`: Configurazione, soglie PDF e settings live
//! - `error`: Tipi di errore per-file
//! - `file_manager`: Classificazione per estensione e discovery degli input
//! - `image_processor`: Ricodifica immagini (JPEG/PNG/TIFF)
//! - `image_metadata`: Orientamento EXIF e profilo ICC
//! - `pdf_processor`: Compressione PDF standard e multi-pass
//! - `size_guard`: L'output non supera mai l'originale
//! - `compressor`: Backend per singolo file
//! - `job`: Job e risultati
//! - `optimizer`: Orchestratore del batch
//! - `progress` / `json_output`: Progress bar, statistiche ed eventi JSON
//!
//! ## Utilizzo:
//! ```rust,no_run
//! use nanopress::{BatchOptimizer, Config, OutputStrategy, SettingsHandle};
//! use std::path::PathBuf;
//!
//! # async fn run() {
//! let optimizer = BatchOptimizer::new(SettingsHandle::new(Config::default()));
//! let outcomes = optimizer
//!     .compress_files(vec![PathBuf::from("scan.pdf")], OutputStrategy::SameAsOriginal, |state| {
//!         println!("{:.0}% {}", state.progress * 100.0, state.status_message);
//!     })
//!     .await;
//! # let _ = outcomes;
//! # }
//! ```

pub mod config;
pub mod error;
pub mod file_manager;
pub mod image_processor;
pub mod image_metadata;
pub mod pdf_processor;
pub mod size_guard;
pub mod compressor;
pub mod job;
pub mod optimizer;
pub mod progress;
pub mod json_output;

#[cfg(test)]
mod test_support;
#[cfg(test)]
mod end_to_end;

pub use compressor::Compressor;
pub use config::{Config, OutputStrategy, PassPolicy, PdfCompressionMode, SettingsHandle};
pub use error::CompressError;
pub use job::{CompressionJob, CompressionOutcome};
pub use optimizer::{BatchOptimizer, BatchState, CancelHandle};
pub use pdf_processor::{LopdfFilter, PdfFilter};
pub use progress::BatchStats;
