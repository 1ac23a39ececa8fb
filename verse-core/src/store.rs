use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{ModelConfig, StoreConfig};
use crate::corpus::{extract_body, read_all};
use crate::error::{CorpusError, GenerateError, StoreError};
use crate::io::{CorpusSource, DirectorySource};
use crate::model::constraints::Constraints;
use crate::model::generator::{GeneratedSequence, Generator};
use crate::model::markov_model::{MarkovModel, ModelBuilder};

/// Outcome of building one model.
#[derive(Debug)]
pub struct ModelReport {
	pub name: String,
	/// Units ingested successfully (or recorded in the snapshot).
	pub ingested: Vec<String>,
	/// Units that could not be read. The model was built without them.
	pub failures: Vec<CorpusError>,
	/// `true` when the model was restored from its snapshot.
	pub from_snapshot: bool,
	pub elapsed: Duration,
}

/// Outcome of `ModelStore::build`.
#[derive(Debug, Default)]
pub struct BuildReport {
	pub models: Vec<ModelReport>,
	pub elapsed: Duration,
}

impl BuildReport {
	/// Every unit failure across all models.
	pub fn failures(&self) -> impl Iterator<Item = &CorpusError> {
		self.models.iter().flat_map(|m| m.failures.iter())
	}

	/// `true` when every configured unit was ingested.
	pub fn is_clean(&self) -> bool {
		self.failures().next().is_none()
	}

	pub fn model(&self, name: &str) -> Option<&ModelReport> {
		self.models.iter().find(|m| m.name == name)
	}
}

#[derive(Debug)]
struct Entry {
	model: Arc<MarkovModel>,
	defaults: Constraints,
}

/// Registry of named, frozen models.
///
/// # Responsibilities
/// - Run the one-time build: ingest every configured unit, freeze each model
/// - Answer `generate` calls by name, each with its own RNG
///
/// # Notes
/// - Built once, never mutated afterwards: share it behind `&` or `Arc`.
/// - There is no rebuild; build a new store and swap it instead.
#[derive(Debug, Default)]
pub struct ModelStore {
	models: HashMap<String, Entry>,
}

impl ModelStore {
	/// Builds every model described by `config`, reading units from `source`.
	///
	/// # Behavior
	/// - Models are built one after the other, units in configured order.
	/// - An unreadable unit is logged, recorded in the report and skipped.
	///   A model whose units all failed is still registered, empty.
	/// - A model with a `snapshot` path is restored from it when possible,
	///   otherwise built and, if every unit was ingested, written there.
	///
	/// # Errors
	/// - `StoreError::DuplicateModel` if a name appears twice
	/// - `StoreError::Model` if an order is below 2
	pub fn build(config: &StoreConfig, source: &dyn CorpusSource) -> Result<(Self, BuildReport), StoreError> {
		let start = Instant::now();
		let mut store = Self::default();
		let mut report = BuildReport::default();

		for model_config in &config.models {
			if store.models.contains_key(&model_config.name) {
				return Err(StoreError::DuplicateModel(model_config.name.clone()));
			}
			let (model, model_report) = Self::build_model(model_config, source)?;
			store.models.insert(
				model_config.name.clone(),
				Entry { model: Arc::new(model), defaults: model_config.defaults.clone() },
			);
			report.models.push(model_report);
		}

		report.elapsed = start.elapsed();
		info!("Built {} model(s) in {}ms", store.models.len(), report.elapsed.as_millis());
		Ok((store, report))
	}

	/// Loads a TOML config and builds from the files under its `corpus_dir`.
	pub fn from_config_file<P: AsRef<Path>>(path: P) -> Result<(Self, BuildReport), StoreError> {
		let config = StoreConfig::load(path)?;
		let source = DirectorySource::new(&config.corpus_dir);
		Self::build(&config, &source)
	}

	fn build_model(config: &ModelConfig, source: &dyn CorpusSource) -> Result<(MarkovModel, ModelReport), StoreError> {
		let start = Instant::now();
		let model_error = |e| StoreError::Model { name: config.name.clone(), source: e };

		let mut builder = ModelBuilder::new(config.order).map_err(model_error)?;

		if let Some(model) = Self::restore_snapshot(config) {
			let report = ModelReport {
				name: config.name.clone(),
				ingested: model.provenance().map(str::to_owned).collect(),
				failures: Vec::new(),
				from_snapshot: true,
				elapsed: start.elapsed(),
			};
			return Ok((model, report));
		}

		let mut ingested = Vec::new();
		let mut failures = Vec::new();
		for unit in &config.corpus {
			match Self::ingest(config, source, unit) {
				Ok(prose) => {
					builder.add_text(unit, &prose);
					info!("{}: ingested {}", config.name, unit);
					ingested.push(unit.clone());
				}
				Err(e) => {
					warn!("{}: {}", config.name, e);
					failures.push(e);
				}
			}
		}

		let model = builder.build();
		let elapsed = start.elapsed();
		info!(
			"{}: {} context(s) from {} unit(s) in {}ms",
			config.name,
			model.context_count(),
			ingested.len(),
			elapsed.as_millis()
		);

		// An incomplete model would otherwise shadow the corpus on every later start
		match &config.snapshot {
			Some(_) if !failures.is_empty() => {
				warn!("{}: {} unit(s) missing, snapshot not written", config.name, failures.len());
			}
			Some(path) => {
				if let Err(e) = model.save(path) {
					warn!("{}: could not write snapshot: {}", config.name, e);
				}
			}
			None => (),
		}

		let report = ModelReport { name: config.name.clone(), ingested, failures, from_snapshot: false, elapsed };
		Ok((model, report))
	}

	/// Reads one unit and extracts its prose.
	fn ingest(config: &ModelConfig, source: &dyn CorpusSource, unit: &str) -> Result<String, CorpusError> {
		let unavailable = |e| CorpusError::Unavailable { unit: unit.to_owned(), source: e };
		let reader = source.open(unit).map_err(unavailable)?;
		let prose = match &config.markers {
			Some(markers) => extract_body(reader, markers),
			None => read_all(reader),
		};
		prose.map_err(unavailable)
	}

	/// Returns the snapshot model if the file exists, decodes, has the
	/// configured order and was built from exactly the configured units.
	fn restore_snapshot(config: &ModelConfig) -> Option<MarkovModel> {
		let path = config.snapshot.as_ref()?;
		if !path.exists() {
			return None;
		}
		match MarkovModel::load(path) {
			Ok(model) if model.order() != config.order => {
				warn!(
					"{}: snapshot has order {}, expected {}; rebuilding",
					config.name,
					model.order(),
					config.order
				);
				None
			}
			Ok(model) => {
				let recorded: BTreeSet<&str> = model.provenance().collect();
				let configured: BTreeSet<&str> = config.corpus.iter().map(String::as_str).collect();
				if recorded != configured {
					warn!("{}: snapshot was built from other corpus units; rebuilding", config.name);
					return None;
				}
				info!("{}: restored from snapshot {}", config.name, path.display());
				Some(model)
			}
			Err(e) => {
				warn!("{}: {}; rebuilding", config.name, e);
				None
			}
		}
	}

	pub fn has_model(&self, name: &str) -> bool {
		self.models.contains_key(name)
	}

	/// Shared handle on a model.
	pub fn model(&self, name: &str) -> Option<Arc<MarkovModel>> {
		self.models.get(name).map(|entry| Arc::clone(&entry.model))
	}

	/// Registered names, sorted.
	pub fn model_names(&self) -> Vec<String> {
		let mut names: Vec<String> = self.models.keys().cloned().collect();
		names.sort();
		names
	}

	/// Configured default constraints of a model.
	pub fn defaults(&self, name: &str) -> Option<&Constraints> {
		self.models.get(name).map(|entry| &entry.defaults)
	}

	/// Generates `line_count` lines from model `name` with a fresh RNG.
	///
	/// # Errors
	/// - `UnknownModel` if `name` was never registered
	/// - any error of `Generator::generate`
	pub fn generate(
		&self,
		name: &str,
		line_count: usize,
		constraints: &Constraints,
	) -> Result<GeneratedSequence, GenerateError> {
		let mut rng = StdRng::from_rng(&mut rand::rng());
		self.generate_with_rng(name, line_count, constraints, &mut rng)
	}

	/// Same as `generate`, drawing from the caller's RNG.
	pub fn generate_with_rng<R: Rng + ?Sized>(
		&self,
		name: &str,
		line_count: usize,
		constraints: &Constraints,
		rng: &mut R,
	) -> Result<GeneratedSequence, GenerateError> {
		let entry = self.models.get(name).ok_or_else(|| GenerateError::UnknownModel(name.to_owned()))?;
		Generator::new(name, &entry.model).generate(line_count, constraints, rng)
	}

	/// Generates with the model's configured defaults.
	pub fn generate_default(&self, name: &str, line_count: usize) -> Result<GeneratedSequence, GenerateError> {
		let entry = self.models.get(name).ok_or_else(|| GenerateError::UnknownModel(name.to_owned()))?;
		self.generate(name, line_count, &entry.defaults)
	}
}
