use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor};
use std::path::{Path, PathBuf};
use std::env;

/// Read-by-name access to raw corpus text.
///
/// The build loop only needs to open a unit by its name; where the bytes
/// live (files, bundled strings) is up to the implementation.
pub trait CorpusSource {
	/// Opens the unit called `name`.
	fn open(&self, name: &str) -> io::Result<Box<dyn BufRead + '_>>;
}

/// Corpus units stored as files under a root directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
	root: PathBuf,
}

impl DirectorySource {
	/// `"."` and `"./"` resolve to the current working directory.
	pub fn new<P: AsRef<Path>>(root: P) -> Self {
		Self { root: normalize_folder(root.as_ref()) }
	}

	pub fn root(&self) -> &Path {
		&self.root
	}
}

impl CorpusSource for DirectorySource {
	fn open(&self, name: &str) -> io::Result<Box<dyn BufRead + '_>> {
		let file = File::open(self.root.join(name))?;
		Ok(Box::new(BufReader::new(file)))
	}
}

/// Corpus units held in memory, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
	units: HashMap<String, String>,
}

impl MemorySource {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds (or replaces) a unit.
	pub fn with_unit(mut self, name: &str, text: &str) -> Self {
		self.insert(name, text);
		self
	}

	pub fn insert(&mut self, name: &str, text: &str) {
		self.units.insert(name.to_owned(), text.to_owned());
	}
}

impl CorpusSource for MemorySource {
	fn open(&self, name: &str) -> io::Result<Box<dyn BufRead + '_>> {
		match self.units.get(name) {
			Some(text) => Ok(Box::new(Cursor::new(text.as_bytes()))),
			None => Err(io::Error::new(io::ErrorKind::NotFound, format!("no corpus unit named '{name}'"))),
		}
	}
}

/// Normalize a folder path.
///
/// - `"."` or `"./"` resolves to the current working directory
/// - Other paths are returned as-is (not canonicalized)
pub(crate) fn normalize_folder(input: &Path) -> PathBuf {
	if input == Path::new(".") || input == Path::new("./") {
		env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
	} else {
		input.to_path_buf()
	}
}
