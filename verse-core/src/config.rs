use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::corpus::Markers;
use crate::error::ConfigError;
use crate::model::constraints::Constraints;

/// Startup configuration of a `ModelStore`.
///
/// ```toml
/// corpus_dir = "./data"
///
/// [[model]]
/// name = "dickens"
/// order = 5
/// corpus = ["Hard_Times.txt", "Oliver_Twist.txt"]
/// snapshot = "./data/dickens.bin"
/// markers = { comment = "***", start = "START", end = "END" }
///
/// [model.defaults]
/// min_length = 15
/// temperature = 100.0
/// allow_duplicates = false
/// ```
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct StoreConfig {
	/// Folder the corpus units are read from.
	#[serde(default = "default_corpus_dir")]
	pub corpus_dir: PathBuf,

	#[serde(default, rename = "model")]
	pub models: Vec<ModelConfig>,
}

/// One named model.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct ModelConfig {
	pub name: String,

	/// Order N, at least 2.
	pub order: usize,

	/// Corpus unit names, ingested in this order.
	#[serde(default)]
	pub corpus: Vec<String>,

	/// Body delimiters. Without them every unit is used whole.
	#[serde(default)]
	pub markers: Option<Markers>,

	/// Postcard snapshot, read if present, written after a fresh build.
	#[serde(default)]
	pub snapshot: Option<PathBuf>,

	/// Constraints used by `ModelStore::generate_default`.
	#[serde(default)]
	pub defaults: Constraints,
}

fn default_corpus_dir() -> PathBuf {
	PathBuf::from("./data")
}

impl StoreConfig {
	pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(s)?)
	}

	/// Reads and parses a TOML file.
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let contents = std::fs::read_to_string(path)
			.map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
		Self::from_toml_str(&contents)
	}
}
