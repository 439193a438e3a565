//! docmig migration engine
//!
//! Drives a rule catalog over batches of documents while keeping `ref`
//! attributes pointing at what they pointed at before.
//!
//! # Core Concepts
//!
//! - [`Pipeline`]: Collect and mutate phases for one document
//! - [`Migrator`]: Batch driver; parallel phases with a barrier in between
//! - [`MigrateConfig`]: TOML run configuration
//! - [`BatchReport`]: Per-document outcome, serializable as JSON
//! - [`dangling_references`]: Post-migration reference check
//!
//! # Example
//!
//! ```rust,ignore
//! use docmig_engine::{MigrateConfig, Migrator};
//!
//! let config = MigrateConfig::load("docmig.toml".as_ref())?;
//! let report = Migrator::from_config(&config)?.migrate_directory(&config, root)?;
//! if report.has_failures() {
//!     std::process::exit(1);
//! }
//! ```

// Core modules
mod batch;
mod check;
mod config;
mod error;
mod pipeline;
mod report;

// Re-exports
pub use batch::{discover, BatchResult, DocumentInput, MigratedDocument, Migrator};
pub use check::{dangling_references, DanglingRef};
pub use config::{MigrateConfig, OutputTarget};
pub use error::{MigrateError, MigrateResult};
pub use pipeline::{MutateStats, Pipeline, MAX_REDISPATCH};
pub use report::{BatchReport, DocumentReport, DocumentStatus, Totals};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
