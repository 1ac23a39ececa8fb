//! Word-level Markov chain verse generation library.
//!
//! This crate provides an order-N Markov text synthesizer including:
//! - Corpus ingestion from marker-delimited text resources
//! - Additive order-N transition tables, frozen into immutable models
//! - Temperature-controlled generation with length and duplicate constraints
//! - A registry of named models built once at startup
//!
//! ```no_run
//! use verse_core::store::ModelStore;
//!
//! let (store, report) = ModelStore::from_config_file("verses.toml")?;
//! for failure in report.failures() {
//!     eprintln!("{failure}");
//! }
//! for line in store.generate_default("jabberwocky", 4)?.lines() {
//!     println!("{line}");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Core Markov models and generation logic.
pub mod model;

/// Extraction of the story body from raw corpus text.
pub mod corpus;

/// Corpus sources (directories, in-memory units).
pub mod io;

/// TOML startup configuration.
pub mod config;

/// Registry of named models.
pub mod store;

/// Error types.
pub mod error;

pub use config::{ModelConfig, StoreConfig};
pub use error::{ConfigError, ConstraintError, CorpusError, GenerateError, ModelError, StoreError};
pub use model::constraints::Constraints;
pub use model::generator::{Exhaustion, GeneratedSequence, Line};
pub use model::markov_model::{LineBound, MarkovModel};
pub use store::{BuildReport, ModelStore};
