//! # NanoPress - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing` (su stderr)
//! - Caricamento della configurazione da file e override da CLI
//! - Discovery degli input e avvio del batch
//! - Ctrl-C richiede la cancellazione cooperativa
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI (input, quality, pdf-mode, output, workers, etc.)
//! 2. Configura il logging (INFO o DEBUG a seconda del flag verbose, `RUST_LOG` ha priorità)
//! 3. Espande directory e rimuove duplicati
//! 4. Esegue il batch mostrando progress bar o eventi JSON
//! 5. Stampa il riepilogo finale
//!
//! ## Esempio di utilizzo:
//! ```bash
//! nanopress ~/Scans report.pdf --pdf-mode aggressive --output ~/Compressed --verbose
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use nanopress::{
    file_manager::FileManager,
    json_output::JsonMessage,
    optimizer::ProgressTracker,
    BatchOptimizer, Config, OutputStrategy, PdfCompressionMode, SettingsHandle,
};

#[derive(Parser)]
#[command(name = "nanopress")]
#[command(about = "Compress images and PDFs in batch, never producing a larger file")]
struct Args {
    /// Files or directories to compress
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Image quality (0.0-1.0)
    #[arg(short, long)]
    quality: Option<f32>,

    /// PDF compression mode
    #[arg(short, long, value_enum)]
    pdf_mode: Option<PdfCompressionMode>,

    /// Output directory (if not specified, write next to each original with a `_compressed` suffix)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of files compressed in parallel
    #[arg(short, long)]
    workers: Option<usize>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output progress as JSON lines for programmatic use
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let json = args.json;
    let result = run(args).await;
    if let (true, Err(e)) = (json, &result) {
        JsonMessage::error(e.to_string(), e.chain().nth(1).map(|s| s.to_string())).emit();
    }
    result
}

async fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path).await?,
        None => Config::default(),
    };
    if let Some(quality) = args.quality {
        config.quality = quality;
    }
    if let Some(mode) = args.pdf_mode {
        config.pdf_mode = mode;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    config.json_output |= args.json;
    config.validate()?;

    let strategy = match &args.output {
        Some(dir) => {
            if !dir.exists() {
                tokio::fs::create_dir_all(dir).await?;
                info!("Created output directory: {}", dir.display());
            }
            if !dir.is_dir() {
                return Err(anyhow::anyhow!("Output path is not a directory: {}", dir.display()));
            }
            OutputStrategy::Specific(dir.clone())
        }
        None => OutputStrategy::SameAsOriginal,
    };

    let files = FileManager::collect_inputs(&args.inputs)?;

    if config.json_output {
        JsonMessage::start(args.inputs.clone(), args.output.clone(), files.len(), &config).emit();
    } else {
        info!(
            "Compressing {} files (quality {:.2}, PDF mode: {} - {})",
            files.len(),
            config.quality,
            config.pdf_mode,
            config.pdf_mode.description()
        );
        match &strategy {
            OutputStrategy::Specific(dir) => info!("Output directory: {}", dir.display()),
            OutputStrategy::SameAsOriginal => info!("Writing next to originals with '_compressed' suffix"),
        }
    }

    let start_time = Instant::now();
    let optimizer = BatchOptimizer::new(SettingsHandle::new(config.clone()));

    let cancel = optimizer.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, waiting for running files to finish");
            cancel.cancel();
        }
    });

    let mut tracker = ProgressTracker::new(files.len(), config.json_output);
    optimizer
        .compress_files(files, strategy, |state| tracker.observe(state))
        .await;

    let state = optimizer.state();
    let stats = tracker.finish(&state);
    let duration = start_time.elapsed().as_secs_f64();

    if config.json_output {
        JsonMessage::complete(&stats, duration, state.cancelled).emit();
    } else {
        info!("=== {} ===", state.status_message);
        info!("Files processed: {}", stats.files_processed);
        info!("Files compressed: {}", stats.files_optimized);
        info!("Files left unchanged: {}", stats.files_unchanged);
        info!("Errors: {}", stats.errors);
        info!("Bytes saved: {}", FileManager::format_size(stats.total_bytes_saved));
        info!("Average reduction: {:.2}%", stats.overall_reduction_percent());
        info!("Duration: {:.1}s", duration);

        for outcome in state.results.iter().filter(|o| !o.is_success()) {
            if let Some(message) = outcome.error_message() {
                warn!("{}: {}", outcome.original_path().display(), message);
            }
        }
    }

    Ok(())
}
