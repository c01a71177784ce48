//! # PDF Processing Module
//!
//! Questo modulo gestisce la compressione dei documenti PDF tramite `lopdf`.
//!
//! ## Modalità
//!
//! - **Standard**: un singolo passaggio del filtro di riduzione, scritto sulla destinazione
//! - **Aggressive**: ottimizzazione multi-passaggio
//!   1. Pass 1: filtro + rimozione metadata/attributi di sicurezza → file temporaneo
//!   2. Gate: secondo passaggio solo se riduzione > soglia e pass 1 > soglia byte
//!      (`PassPolicy`, default 10% e 100 000 byte)
//!   3. Pass 2: riapre l'output del pass 1 e riapplica il filtro su un secondo temporaneo;
//!      vince solo se strettamente più piccolo, altrimenti il fallimento viene assorbito
//!   4. Finalize: rename atomico del temporaneo scelto sulla destinazione
//!
//! ## Documenti cifrati
//!
//! I PDF protetti solo da password del proprietario vengono decifrati con la
//! password utente vuota al caricamento e scritti in chiaro. Se serve una
//! password utente il file è `InvalidInput`.
//!
//! ## Filtro iniettabile
//!
//! Il passo di "riduzione" è una strategia (`PdfFilter`). L'implementazione di default
//! (`LopdfFilter`) elimina oggetti non referenziati e stream vuoti, rinumera gli oggetti
//! e comprime gli stream con Flate.
//!
//! ## Pulizia dei temporanei
//!
//! I file temporanei sono `NamedTempFile` creati nella directory di destinazione:
//! vengono rimossi al drop su ogni percorso di uscita (successo, fallimento del
//! pass 2, fallimento del rename finale).

use crate::config::{PassPolicy, PdfCompressionMode};
use crate::error::CompressError;
use crate::file_manager::FileManager;
use lopdf::{Document, Object};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, error, warn};

/// Size-reduction strategy applied to a loaded document before it is written
pub trait PdfFilter: Send + Sync {
    /// One size-reduction pass
    fn reduce(&self, doc: &mut Document);

    /// Drop document metadata and security attributes (aggressive mode only)
    fn strip_metadata(&self, doc: &mut Document) {
        strip_document_metadata(doc);
    }
}

/// Default filter built on lopdf's object pruning and stream compression
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfFilter;

impl PdfFilter for LopdfFilter {
    fn reduce(&self, doc: &mut Document) {
        let empty = doc.delete_zero_length_streams();
        let pruned = doc.prune_objects();
        doc.renumber_objects();
        doc.compress();
        debug!(
            "PDF filter: {} empty streams, {} unreferenced objects removed",
            empty.len(),
            pruned.len()
        );
    }
}

/// Removes the Info dictionary, XMP metadata stream and encryption entry
pub fn strip_document_metadata(doc: &mut Document) {
    doc.trailer.remove(b"Info");
    doc.trailer.remove(b"Encrypt");

    let root = doc.trailer.get(b"Root").and_then(Object::as_reference);
    if let Ok(root_id) = root {
        if let Ok(catalog) = doc.get_object_mut(root_id).and_then(Object::as_dict_mut) {
            catalog.remove(b"Metadata");
        }
    }
}

/// Which pass produced the final file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    First,
    Second,
}

/// What the aggressive optimizer did for one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub original_size: u64,
    pub pass1_size: u64,
    /// `None` when the gate skipped pass 2 or its write failed
    pub pass2_size: Option<u64>,
    pub chosen: Pass,
}

impl PassReport {
    /// Size of the file moved onto the destination
    pub fn final_size(&self) -> u64 {
        match (self.chosen, self.pass2_size) {
            (Pass::Second, Some(size)) => size,
            _ => self.pass1_size,
        }
    }
}

/// Compresses PDF documents in standard or aggressive mode
#[derive(Clone)]
pub struct PdfProcessor {
    filter: Arc<dyn PdfFilter>,
    policy: PassPolicy,
}

impl PdfProcessor {
    pub fn new(filter: Arc<dyn PdfFilter>, policy: PassPolicy) -> Self {
        Self { filter, policy }
    }

    /// Compress `input` into `destination` using `mode`. Blocking.
    pub fn compress(&self, input: &Path, destination: &Path, mode: PdfCompressionMode) -> Result<(), CompressError> {
        match mode {
            PdfCompressionMode::Standard => self.compress_standard(input, destination),
            PdfCompressionMode::Aggressive => {
                let report = self.compress_aggressive(input, destination)?;
                debug!(
                    "Aggressive PDF {}: original {} B, pass1 {} B, pass2 {:?}, chosen {:?}",
                    input.display(),
                    report.original_size,
                    report.pass1_size,
                    report.pass2_size,
                    report.chosen
                );
                Ok(())
            }
        }
    }

    /// Single filter pass written to `destination`
    pub fn compress_standard(&self, input: &Path, destination: &Path) -> Result<(), CompressError> {
        let mut doc = Self::load(input)?;
        self.filter.reduce(&mut doc);

        let (temp, _) = Self::write_pass(&mut doc, destination, ".nanopress-")?;
        FileManager::persist(temp, destination)
    }

    /// Multi-pass optimization; see the module docs for the state machine
    pub fn compress_aggressive(&self, input: &Path, destination: &Path) -> Result<PassReport, CompressError> {
        let mut doc = Self::load(input)?;
        let original_size = std::fs::metadata(input)
            .map(|m| m.len())
            .map_err(|_| CompressError::invalid_input(input))?;

        self.filter.strip_metadata(&mut doc);
        self.filter.reduce(&mut doc);
        let (mut chosen, pass1_size) = Self::write_pass(&mut doc, destination, ".nanopress-pass1-")?;
        drop(doc);

        let mut report = PassReport {
            original_size,
            pass1_size,
            pass2_size: None,
            chosen: Pass::First,
        };

        if self.policy.should_run_second_pass(original_size, pass1_size) {
            let mut reopened = Self::open(chosen.path()).map_err(|e| {
                error!("Cannot reopen first-pass output for {}: {}", input.display(), e);
                CompressError::PdfCreationError
            })?;

            self.filter.reduce(&mut reopened);
            match Self::write_pass(&mut reopened, destination, ".nanopress-pass2-") {
                Ok((pass2, pass2_size)) => {
                    report.pass2_size = Some(pass2_size);
                    if pass2_size < pass1_size {
                        chosen = pass2;
                        report.chosen = Pass::Second;
                    }
                }
                Err(e) => warn!("Second PDF pass failed for {}, keeping first pass: {}", input.display(), e),
            }
        }

        FileManager::persist(chosen, destination)?;
        Ok(report)
    }

    fn load(input: &Path) -> Result<Document, CompressError> {
        Self::open(input).map_err(|e| {
            debug!("Cannot open PDF {}: {}", input.display(), e);
            CompressError::invalid_input(input)
        })
    }

    /// Parse `path`, unlocking documents that only carry an owner password.
    ///
    /// The result is plain text: its object numbers can change freely.
    fn open(path: &Path) -> Result<Document, lopdf::Error> {
        let mut doc = Document::load(path)?;
        if doc.is_encrypted() {
            doc.decrypt("")?;
            doc.trailer.remove(b"Encrypt");
            debug!("Decrypted {} with the empty user password", path.display());
        }
        Ok(doc)
    }

    /// Serialize `doc` into a fresh temp file next to `destination`
    fn write_pass(doc: &mut Document, destination: &Path, prefix: &str) -> Result<(NamedTempFile, u64), CompressError> {
        let dir = destination.parent().unwrap_or_else(|| Path::new("."));
        let mut temp = FileManager::temp_file_in(dir, prefix, ".pdf")?;

        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            doc.save_to(&mut writer).map_err(|e| {
                error!("Failed to write PDF to {}: {}", dir.display(), e);
                CompressError::SaveFailed
            })?;
            writer.flush().map_err(|e| {
                error!("Failed to flush PDF to {}: {}", dir.display(), e);
                CompressError::SaveFailed
            })?;
        }

        let size = temp
            .as_file()
            .metadata()
            .map(|m| m.len())
            .map_err(|_| CompressError::SaveFailed)?;
        Ok((temp, size))
    }
}

impl Default for PdfProcessor {
    fn default() -> Self {
        Self::new(Arc::new(LopdfFilter), PassPolicy::default())
    }
}
