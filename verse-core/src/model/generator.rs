use std::collections::HashSet;
use std::fmt;

use log::debug;
use rand::Rng;

use super::constraints::Constraints;
use super::markov_model::{LineBound, MarkovModel};
use super::tokenizer::{is_sentence_end, untokenize};
use crate::error::{ConstraintError, GenerateError};

/// One generated line: its tokens and their rendered text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line {
	tokens: Vec<String>,
	text: String,
}

impl Line {
	fn new(tokens: Vec<String>) -> Self {
		let text = untokenize(&tokens);
		Self { tokens, text }
	}

	pub fn tokens(&self) -> &[String] {
		&self.tokens
	}

	pub fn text(&self) -> &str {
		&self.text
	}

	/// Number of tokens, punctuation included.
	pub fn len(&self) -> usize {
		self.tokens.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tokens.is_empty()
	}
}

impl fmt::Display for Line {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.text)
	}
}

/// Why a call could not fully honour its constraints.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Exhaustion {
	/// The duplicate budget ran out `accepted` times; those duplicates were kept.
	Duplicates { accepted: usize },
	/// No attempt produced a terminated line long enough; only `produced`
	/// of `requested` lines were returned.
	Length { produced: usize, requested: usize },
}

/// Lines produced by one `generate` call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeneratedSequence {
	lines: Vec<Line>,
	exhaustion: Option<Exhaustion>,
}

impl GeneratedSequence {
	pub fn lines(&self) -> &[Line] {
		&self.lines
	}

	pub fn into_lines(self) -> Vec<Line> {
		self.lines
	}

	/// Rendered text of every line, in order.
	pub fn texts(&self) -> Vec<&str> {
		self.lines.iter().map(Line::text).collect()
	}

	pub fn len(&self) -> usize {
		self.lines.len()
	}

	pub fn is_empty(&self) -> bool {
		self.lines.is_empty()
	}

	/// `Some` when a retry budget ran out during the call.
	pub fn exhaustion(&self) -> Option<&Exhaustion> {
		self.exhaustion.as_ref()
	}

	pub fn is_exhausted(&self) -> bool {
		self.exhaustion.is_some()
	}
}

/// Samples lines from a single model.
///
/// # Responsibilities
/// - Pick a uniformly random start context for every attempt
/// - Walk the chain with temperature-scaled sampling until a sentence ends
/// - Enforce `min_length`, the token cap and duplicate suppression
///
/// Every loop is bounded by `token_cap() * max_attempts * line_count` steps,
/// whatever the model looks like.
#[derive(Debug, Clone, Copy)]
pub struct Generator<'a> {
	name: &'a str,
	model: &'a MarkovModel,
}

impl<'a> Generator<'a> {
	/// `name` only appears in errors and logs.
	pub fn new(name: &'a str, model: &'a MarkovModel) -> Self {
		Self { name, model }
	}

	/// Generates up to `line_count` lines.
	///
	/// # Behavior
	/// - Each line gets `max_attempts` attempts. An attempt fails when it hits
	///   the token cap, reaches a context with no successors, or (with
	///   `allow_duplicates == false`) repeats a line already accepted.
	/// - When the budget runs out and some attempt produced a valid duplicate,
	///   that duplicate is accepted and reported as `Exhaustion::Duplicates`.
	/// - When no attempt produced a valid line at all, generation stops and
	///   the partial sequence is reported as `Exhaustion::Length`.
	///
	/// # Errors
	/// - `InvalidConstraint` if `constraints` fail validation, or if
	///   `min_length` is longer than any line the model can terminate
	/// - `ModelEmpty` if the model has no transitions (and `line_count > 0`)
	pub fn generate<R: Rng + ?Sized>(
		&self,
		line_count: usize,
		constraints: &Constraints,
		rng: &mut R,
	) -> Result<GeneratedSequence, GenerateError> {
		constraints.validate()?;
		if line_count == 0 {
			return Ok(GeneratedSequence::default());
		}
		if self.model.is_empty() {
			return Err(GenerateError::ModelEmpty(self.name.to_owned()));
		}
		if let LineBound::Longest(longest) = self.model.line_bound() {
			if constraints.min_length > longest {
				return Err(ConstraintError::MinLengthUnreachable {
					min_length: constraints.min_length,
					max_length: longest,
				}
				.into());
			}
		}

		let mut lines: Vec<Line> = Vec::with_capacity(line_count);
		let mut seen: HashSet<String> = HashSet::new();
		let mut accepted_duplicates = 0;
		let mut exhaustion = None;

		for _ in 0..line_count {
			let mut accepted = None;
			let mut duplicate = None;

			for attempt in 1..=constraints.max_attempts {
				let Some(tokens) = self.attempt_line(constraints, rng) else {
					debug!("{}: attempt {} hit a dead end or the token cap", self.name, attempt);
					continue;
				};
				let line = Line::new(tokens);
				if !constraints.allow_duplicates && seen.contains(line.text()) {
					debug!("{}: attempt {} repeated an earlier line", self.name, attempt);
					duplicate.get_or_insert(line);
					continue;
				}
				accepted = Some(line);
				break;
			}

			let line = match (accepted, duplicate) {
				(Some(line), _) => line,
				(None, Some(line)) => {
					accepted_duplicates += 1;
					line
				}
				(None, None) => {
					exhaustion = Some(Exhaustion::Length { produced: lines.len(), requested: line_count });
					break;
				}
			};
			seen.insert(line.text().to_owned());
			lines.push(line);
		}

		if exhaustion.is_none() && accepted_duplicates > 0 {
			exhaustion = Some(Exhaustion::Duplicates { accepted: accepted_duplicates });
		}

		Ok(GeneratedSequence { lines, exhaustion })
	}

	/// One walk along the chain.
	///
	/// Returns `None` if the walk hits the token cap or a context that was
	/// never followed by anything.
	fn attempt_line<R: Rng + ?Sized>(&self, constraints: &Constraints, rng: &mut R) -> Option<Vec<String>> {
		let width = self.model.order() - 1;
		let cap = constraints.token_cap();

		let mut tokens = self.model.random_context(rng)?.to_vec();

		while tokens.len() < cap {
			let context = &tokens[tokens.len() - width..];
			let next = self.model.state(context)?.sample(constraints.temperature, rng)?.to_owned();
			let done = is_sentence_end(&next) && tokens.len() + 1 >= constraints.min_length;
			tokens.push(next);
			if done {
				return Some(tokens);
			}
		}

		None
	}
}
