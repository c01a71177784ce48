//! # Path Resolution Module
//!
//! Centralizza tutta la logica di calcolo dei path di output.
//! Evita duplicazione tra il backend e l'orchestratore del batch.
//!
//! ## Regole:
//! - Stessa directory del sorgente: `<stem>_compressed.<ext>`
//! - Directory diversa: nome file originale invariato
//! - Collisioni dentro un batch: `<stem>_2.<ext>`, `<stem>_3.<ext>`, ...
//! - Un input del batch non viene mai usato come destinazione

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Utility per calcolare i path di output in modo centralizzato
pub struct PathResolver;

impl PathResolver {
    /// Destination of `input` when written into `output_dir`
    pub fn destination_for(input: &Path, output_dir: &Path) -> PathBuf {
        let file_name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if Self::same_directory(input, output_dir) {
            output_dir.join(Self::with_stem_suffix(input, "_compressed"))
        } else {
            output_dir.join(file_name)
        }
    }

    fn same_directory(input: &Path, output_dir: &Path) -> bool {
        let source_dir = match input.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        match (source_dir.canonicalize(), output_dir.canonicalize()) {
            (Ok(a), Ok(b)) => a == b,
            _ => source_dir == output_dir,
        }
    }

    /// `name.ext` -> `name<suffix>.ext`, extension casing preserved
    fn with_stem_suffix(path: &Path, suffix: &str) -> String {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        match path.extension() {
            Some(ext) => format!("{}{}.{}", stem, suffix, ext.to_string_lossy()),
            None => format!("{}{}", stem, suffix),
        }
    }
}

/// Destinations already handed out in the current batch.
///
/// Paths are compared by filesystem identity. The batch inputs are never
/// handed out, so a job cannot write over another job's source.
#[derive(Debug, Default)]
pub struct DestinationRegistry {
    reserved: HashSet<PathBuf>,
    inputs: HashSet<PathBuf>,
}

impl DestinationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry that refuses every path in `inputs`
    pub fn with_inputs<'a, I>(inputs: I) -> Self
    where
        I: IntoIterator<Item = &'a Path>,
    {
        Self {
            reserved: HashSet::new(),
            inputs: inputs.into_iter().map(identity).collect(),
        }
    }

    /// Final destinations for `(input, wanted)` pairs, in order.
    ///
    /// Blocking: every candidate is resolved against the filesystem.
    pub fn plan(requests: &[(PathBuf, PathBuf)]) -> Vec<PathBuf> {
        let mut registry = Self::with_inputs(requests.iter().map(|(input, _)| input.as_path()));
        requests
            .iter()
            .map(|(_, wanted)| registry.reserve(wanted.clone()))
            .collect()
    }

    /// Reserve `wanted`, or the first free `_N` variant of it
    pub fn reserve(&mut self, wanted: PathBuf) -> PathBuf {
        let mut candidate = wanted.clone();
        let mut n = 1;
        loop {
            let key = identity(&candidate);
            if !self.inputs.contains(&key) && self.reserved.insert(key) {
                if n > 1 {
                    debug!("Destination {} already taken, using {}", wanted.display(), candidate.display());
                }
                return candidate;
            }
            n += 1;
            candidate = wanted.with_file_name(PathResolver::with_stem_suffix(&wanted, &format!("_{}", n)));
        }
    }

    pub fn len(&self) -> usize {
        self.reserved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reserved.is_empty()
    }
}

/// Canonical form of `path`; a file that does not exist yet is resolved
/// through its parent directory
fn identity(path: &Path) -> PathBuf {
    if let Ok(resolved) = path.canonicalize() {
        return resolved;
    }
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    match (parent.canonicalize(), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => path.to_path_buf(),
    }
}
