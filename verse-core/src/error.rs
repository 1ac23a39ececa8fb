use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A corpus unit that could not be read.
///
/// Recoverable: the build loop logs it, records it in the report and moves
/// on to the next unit.
#[derive(Debug, Error)]
pub enum CorpusError {
	#[error("corpus unit '{unit}' unavailable: {source}")]
	Unavailable {
		unit: String,
		#[source]
		source: io::Error,
	},
}

impl CorpusError {
	/// Name of the unit that failed.
	pub fn unit(&self) -> &str {
		match self {
			CorpusError::Unavailable { unit, .. } => unit,
		}
	}
}

/// Errors raised while constructing, merging or restoring a model.
#[derive(Debug, Error)]
pub enum ModelError {
	#[error("model order must be >= 2, got {0}")]
	InvalidOrder(usize),

	#[error("order mismatch: expected {expected}, got {found}")]
	OrderMismatch { expected: usize, found: usize },

	#[error("snapshot {path}: {reason}")]
	Snapshot { path: PathBuf, reason: String },
}

/// A generation constraint that can never be satisfied.
#[derive(Debug, Error, PartialEq)]
pub enum ConstraintError {
	#[error("temperature must be a finite value > 0, got {0}")]
	Temperature(f64),

	#[error("max_attempts must be at least 1")]
	Attempts,

	#[error("min_length {min_length} exceeds the longest representable line ({max_length} tokens)")]
	MinLengthUnreachable { min_length: usize, max_length: usize },
}

/// Per-call generation failures. None of them touch the shared model.
#[derive(Debug, Error)]
pub enum GenerateError {
	#[error("unknown model '{0}'")]
	UnknownModel(String),

	#[error("model '{0}' has no transitions")]
	ModelEmpty(String),

	#[error("invalid constraint: {0}")]
	InvalidConstraint(#[from] ConstraintError),
}

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("cannot read config {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("invalid config: {0}")]
	Parse(#[from] toml::de::Error),
}

/// Fatal startup errors. Per-unit corpus failures never end up here.
#[derive(Debug, Error)]
pub enum StoreError {
	#[error(transparent)]
	Config(#[from] ConfigError),

	#[error("model '{0}' is configured more than once")]
	DuplicateModel(String),

	#[error("model '{name}': {source}")]
	Model {
		name: String,
		#[source]
		source: ModelError,
	},
}
