//! # Error Types Module
//!
//! Questo modulo definisce i tipi di errore del motore di compressione.
//!
//! ## Responsabilità:
//! - Definisce `CompressError` enum per categorizzare i fallimenti per-file
//! - Fornisce messaggi di errore leggibili dall'utente
//! - Integra con `thiserror` per `Display` ed `Error`
//!
//! ## Categorie di errori:
//! - `UnsupportedFormat`: Estensione non gestita dal motore
//! - `InvalidInput`: File sorgente illeggibile o corrotto
//! - `ConversionFailed`: L'encoder non riesce a elaborare l'immagine
//! - `SaveFailed`: Scrittura o finalizzazione dell'output fallita
//! - `PdfCreationError`: Impossibile riaprire il PDF intermedio per il secondo passaggio
//!
//! ## Nota:
//! Gli errori sono valori semplici (`Clone`, `PartialEq`) perché finiscono dentro
//! `CompressionOutcome` e negli snapshot di `BatchState`. L'errore sottostante
//! (io, image, lopdf) viene loggato con `tracing` nel punto in cui avviene.
//!
//! ## Esempio:
//! ```rust
//! use nanopress::CompressError;
//!
//! let err = CompressError::UnsupportedFormat("gif".to_string());
//! assert_eq!(err.to_string(), "The file extension '.gif' is not supported.");
//! ```

use serde::Serialize;

/// Per-file failure reasons produced by the compression backend
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail")]
pub enum CompressError {
    #[error("The file extension '.{0}' is not supported.")]
    UnsupportedFormat(String),

    #[error("Could not read the file '{0}'. It might be corrupted.")]
    InvalidInput(String),

    #[error("We couldn't compress this file properly.")]
    ConversionFailed,

    #[error("Failed to save the compressed file.")]
    SaveFailed,

    #[error("Could not process the PDF page.")]
    PdfCreationError,
}

impl CompressError {
    /// Builds an `InvalidInput` carrying only the file name of `path`
    pub fn invalid_input(path: &std::path::Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::InvalidInput(name)
    }

    /// Short machine-friendly name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat(_) => "unsupported_format",
            Self::InvalidInput(_) => "invalid_input",
            Self::ConversionFailed => "conversion_failed",
            Self::SaveFailed => "save_failed",
            Self::PdfCreationError => "pdf_creation_error",
        }
    }
}
