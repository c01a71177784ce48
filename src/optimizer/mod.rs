//! # Optimizer Module
//!
//! Modulo che separa le responsabilità del batch in sottomoduli:
//! - `batch_optimizer`: Orchestratore principale
//! - `batch_state`: Stato osservabile del batch
//! - `task_optimizer`: Worker per singoli file
//! - `progress_tracker`: Gestione progress unificata
//! - `path_resolver`: Logica di calcolo path centralizzata

pub mod batch_optimizer;
pub mod batch_state;
pub mod task_optimizer;
pub mod progress_tracker;
pub mod path_resolver;

pub use batch_optimizer::{BatchOptimizer, CancelHandle};
pub use batch_state::BatchState;
pub use task_optimizer::TaskOptimizer;
pub use progress_tracker::ProgressTracker;
pub use path_resolver::{DestinationRegistry, PathResolver};
