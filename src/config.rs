//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione del motore di compressione.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con tutti i parametri di compressione
//! - Fornisce validazione dei parametri di input
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Espone `SettingsHandle` per modifiche live con semantica snapshot-per-job
//!
//! ## Parametri di configurazione:
//! - `quality`: Qualità di encoding immagini (0.0-1.0, default: 0.8)
//! - `pdf_mode`: Modalità PDF (`standard` | `aggressive`, default: standard)
//! - `pdf_passes`: Soglie del secondo passaggio PDF (riduzione > 10%, size > 100 000 byte)
//! - `workers`: Numero massimo di job concorrenti (default: 4)
//! - `json_output`: Output JSON-lines per uso programmatico
//!
//! ## Snapshot-per-job:
//! Il batch legge la configurazione al momento del dispatch di ogni job.
//! Le modifiche successive tramite `SettingsHandle` valgono solo per i job
//! non ancora avviati.
//!
//! ## Esempio:
//! ```rust
//! use nanopress::{Config, PdfCompressionMode};
//!
//! let config = Config {
//!     quality: 0.6,
//!     pdf_mode: PdfCompressionMode::Aggressive,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;

/// PDF compression mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PdfCompressionMode {
    /// Balanced quality and size: a single filter pass
    #[default]
    Standard,
    /// Maximum compression: metadata stripping plus an optional second pass
    Aggressive,
}

impl PdfCompressionMode {
    pub fn description(&self) -> &'static str {
        match self {
            Self::Standard => "Balanced quality and size",
            Self::Aggressive => "Maximum compression, lower quality",
        }
    }
}

impl std::fmt::Display for PdfCompressionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::Aggressive => write!(f, "aggressive"),
        }
    }
}

/// Thresholds deciding whether aggressive mode runs a second PDF pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PassPolicy {
    /// First pass must shrink the file by strictly more than this fraction
    pub min_reduction: f64,
    /// First pass output must be strictly larger than this many bytes
    pub min_pass1_size: u64,
}

impl Default for PassPolicy {
    fn default() -> Self {
        Self {
            min_reduction: 0.10,
            min_pass1_size: 100_000,
        }
    }
}

impl PassPolicy {
    /// Decision gate between pass 1 and pass 2
    pub fn should_run_second_pass(&self, original_size: u64, pass1_size: u64) -> bool {
        if original_size == 0 {
            return false;
        }
        let reduction = (original_size as f64 - pass1_size as f64) / original_size as f64;
        reduction > self.min_reduction && pass1_size > self.min_pass1_size
    }
}

/// Where compressed files are written for a batch
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputStrategy {
    /// Next to each source file, with a `_compressed` suffix
    #[default]
    SameAsOriginal,
    /// Into one chosen directory, keeping the original file names
    Specific(PathBuf),
}

impl OutputStrategy {
    /// Output directory for a given source file
    pub fn output_dir_for(&self, input: &Path) -> PathBuf {
        match self {
            Self::Specific(dir) => dir.clone(),
            Self::SameAsOriginal => input
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }
}

/// Configuration for a compression batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Image encoding quality (0.0-1.0)
    pub quality: f32,
    /// PDF compression mode
    pub pdf_mode: PdfCompressionMode,
    /// Second-pass thresholds for aggressive PDF mode
    pub pdf_passes: PassPolicy,
    /// Maximum number of jobs in flight
    pub workers: usize,
    /// Output progress and status as JSON for programmatic use
    pub json_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            quality: 0.8,
            pdf_mode: PdfCompressionMode::Standard,
            pdf_passes: PassPolicy::default(),
            workers: 4,
            json_output: false,
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.quality) {
            return Err(anyhow::anyhow!("Quality must be between 0.0 and 1.0"));
        }

        if !(0.0..1.0).contains(&self.pdf_passes.min_reduction) {
            return Err(anyhow::anyhow!("PDF second-pass reduction threshold must be between 0.0 and 1.0"));
        }

        if self.workers == 0 {
            return Err(anyhow::anyhow!("Number of workers must be greater than 0"));
        }

        Ok(())
    }

    /// JPEG quality on the encoder's 1-100 scale
    pub fn jpeg_quality(&self) -> u8 {
        (self.quality * 100.0).round().clamp(1.0, 100.0) as u8
    }

    /// Load configuration from file
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

/// Live, shareable view of the configuration.
///
/// Collaborators update settings while a batch runs; each job takes a
/// snapshot when it is dispatched.
#[derive(Clone)]
pub struct SettingsHandle {
    tx: Arc<watch::Sender<Config>>,
}

impl SettingsHandle {
    pub fn new(config: Config) -> Self {
        let (tx, _rx) = watch::channel(config);
        Self { tx: Arc::new(tx) }
    }

    /// Copy of the current configuration
    pub fn snapshot(&self) -> Config {
        self.tx.borrow().clone()
    }

    /// Apply a change; only jobs dispatched afterwards see it
    pub fn update<F>(&self, change: F)
    where
        F: FnOnce(&mut Config),
    {
        self.tx.send_modify(change);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.quality = 1.5;
        assert!(config.validate().is_err());

        config.quality = -0.1;
        assert!(config.validate().is_err());

        config.quality = 0.0;
        assert!(config.validate().is_ok());

        config.workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.quality, 0.8);
        assert_eq!(config.pdf_mode, PdfCompressionMode::Standard);
        assert_eq!(config.workers, 4);
        assert_eq!(config.pdf_passes.min_reduction, 0.10);
        assert_eq!(config.pdf_passes.min_pass1_size, 100_000);
        assert!(!config.json_output);
    }

    #[test]
    fn test_jpeg_quality_scale() {
        let mut config = Config::default();
        assert_eq!(config.jpeg_quality(), 80);
        config.quality = 0.0;
        assert_eq!(config.jpeg_quality(), 1);
        config.quality = 1.0;
        assert_eq!(config.jpeg_quality(), 100);
    }

    #[test]
    fn test_second_pass_gate() {
        let policy = PassPolicy::default();

        // 50% reduction, large output
        assert!(policy.should_run_second_pass(1_000_000, 500_000));
        // exactly 10% is not enough
        assert!(!policy.should_run_second_pass(1_000_000, 900_000));
        // small reduction
        assert!(!policy.should_run_second_pass(1_000_000, 950_000));
        // good reduction but output too small
        assert!(!policy.should_run_second_pass(400_000, 100_000));
        assert!(!policy.should_run_second_pass(200_000, 50_000));
        // grew instead of shrinking
        assert!(!policy.should_run_second_pass(200_000, 250_000));
        assert!(!policy.should_run_second_pass(0, 0));
    }

    #[test]
    fn test_output_strategy() {
        let input = Path::new("/photos/trip/beach.jpg");
        assert_eq!(
            OutputStrategy::SameAsOriginal.output_dir_for(input),
            PathBuf::from("/photos/trip")
        );
        assert_eq!(
            OutputStrategy::Specific(PathBuf::from("/out")).output_dir_for(input),
            PathBuf::from("/out")
        );
    }

    #[test]
    fn test_settings_snapshot_is_detached() {
        let settings = SettingsHandle::new(Config::default());
        let before = settings.snapshot();

        settings.update(|c| c.pdf_mode = PdfCompressionMode::Aggressive);

        assert_eq!(before.pdf_mode, PdfCompressionMode::Standard);
        assert_eq!(settings.snapshot().pdf_mode, PdfCompressionMode::Aggressive);
    }

    #[tokio::test]
    async fn test_config_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let original_config = Config {
            quality: 0.55,
            pdf_mode: PdfCompressionMode::Aggressive,
            pdf_passes: PassPolicy {
                min_reduction: 0.2,
                min_pass1_size: 4096,
            },
            workers: 2,
            json_output: true,
        };

        original_config.save_to_file(&config_path).await.unwrap();
        let loaded_config = Config::from_file(&config_path).await.unwrap();

        assert_eq!(loaded_config, original_config);
    }

    #[tokio::test]
    async fn test_missing_config_file_gives_default() {
        let temp_dir = TempDir::new().unwrap();
        let loaded = Config::from_file(&temp_dir.path().join("absent.json")).await.unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[tokio::test]
    async fn test_partial_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("partial.json");
        tokio::fs::write(&config_path, r#"{ "pdf_mode": "aggressive" }"#).await.unwrap();

        let loaded = Config::from_file(&config_path).await.unwrap();
        assert_eq!(loaded.pdf_mode, PdfCompressionMode::Aggressive);
        assert_eq!(loaded.quality, 0.8);
    }
}
