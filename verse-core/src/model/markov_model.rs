use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use rand::Rng;

use serde::{Deserialize, Serialize};

use super::state::SuccessorSet;
use super::tokenizer::{is_sentence_end, tokenize};
use crate::error::ModelError;

/// Ordered window of `order - 1` tokens used as a transition table key.
pub type Context = Vec<String>;

/// Accumulates an order-N transition table from prose.
///
/// # Responsibilities
/// - Tokenize corpus units and count every (context, successor) window
/// - Remember which units contributed (provenance)
/// - Merge with another builder of the same order
/// - Freeze into an immutable `MarkovModel`
///
/// # Invariants
/// - `order` is always >= 2
/// - Every key of `states` holds exactly `order - 1` tokens
/// - Counts only ever grow: adding the same text twice doubles its counts
#[derive(Clone, Debug)]
pub struct ModelBuilder {
	order: usize,
	states: BTreeMap<Context, SuccessorSet>,
	provenance: BTreeSet<String>,
}

impl ModelBuilder {
	/// Creates an empty builder of order `order`.
	///
	/// # Errors
	/// Returns `ModelError::InvalidOrder` if `order < 2`.
	pub fn new(order: usize) -> Result<Self, ModelError> {
		if order < 2 {
			return Err(ModelError::InvalidOrder(order));
		}
		Ok(Self { order, states: BTreeMap::new(), provenance: BTreeSet::new() })
	}

	pub fn order(&self) -> usize {
		self.order
	}

	/// Tokenizes `prose` and counts its windows, crediting `unit` in the provenance.
	///
	/// Windows never cross from one call to the next.
	pub fn add_text(&mut self, unit: &str, prose: &str) {
		let tokens = tokenize(prose);
		self.add_tokens(&tokens);
		self.provenance.insert(unit.to_owned());
	}

	/// Counts every window of `order` tokens in `tokens`.
	///
	/// Sequences shorter than `order` contribute nothing; the tail is never padded.
	pub fn add_tokens<S: AsRef<str>>(&mut self, tokens: &[S]) {
		if tokens.len() < self.order {
			return;
		}

		for window in tokens.windows(self.order) {
			let (context, next) = window.split_at(self.order - 1);
			let key: Context = context.iter().map(|t| t.as_ref().to_owned()).collect();
			// `windows(order)` with order >= 2 always leaves one successor
			let next = next[0].as_ref();
			self.states.entry(key).or_default().add_transition(next);
		}
	}

	/// Merges another builder into this one, summing counts.
	///
	/// # Errors
	/// Returns `ModelError::OrderMismatch` if the orders differ.
	pub fn merge(&mut self, other: &Self) -> Result<(), ModelError> {
		if self.order != other.order {
			return Err(ModelError::OrderMismatch { expected: self.order, found: other.order });
		}

		for (key, state) in &other.states {
			if let Some(existing) = self.states.get_mut(key) {
				existing.merge(state);
			} else {
				self.states.insert(key.clone(), state.clone());
			}
		}
		self.provenance.extend(other.provenance.iter().cloned());

		Ok(())
	}

	/// Freezes the table. The returned model has no mutating API.
	///
	/// Also measures the longest line the chain can produce, so that
	/// generation can reject a `min_length` no line could ever reach.
	pub fn build(self) -> MarkovModel {
		let (contexts, states): (Vec<Context>, Vec<SuccessorSet>) = self.states.into_iter().unzip();
		let line_bound = measure_line_bound(&contexts, &states);
		MarkovModel { order: self.order, contexts, states, provenance: self.provenance, line_bound }
	}
}

/// Longest line a model can end on a sentence terminator.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineBound {
	/// No walk ever produces a terminator.
	NoSentenceEnd,
	/// Longest terminated line, in tokens (start context included).
	Longest(usize),
	/// A cycle can reach a terminator: lines have no upper bound.
	Unbounded,
}

/// Immutable order-N Markov model.
///
/// Produced by `ModelBuilder::build` or restored from a snapshot. Nothing in
/// its public API can change a context, a successor or a count, so a model
/// behind an `Arc` is read concurrently without locking.
///
/// # Invariants
/// - `contexts` is sorted and strictly increasing
/// - `states[i]` is the successor set of `contexts[i]`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MarkovModel {
	order: usize,
	contexts: Vec<Context>,
	states: Vec<SuccessorSet>,
	provenance: BTreeSet<String>,
	line_bound: LineBound,
}

impl MarkovModel {
	/// Order N of the model (contexts hold N - 1 tokens).
	pub fn order(&self) -> usize {
		self.order
	}

	/// Number of distinct contexts.
	pub fn context_count(&self) -> usize {
		self.contexts.len()
	}

	/// `true` when no transition was ever recorded.
	pub fn is_empty(&self) -> bool {
		self.contexts.is_empty()
	}

	/// Names of the corpus units that were ingested into this model.
	pub fn provenance(&self) -> impl Iterator<Item = &str> {
		self.provenance.iter().map(String::as_str)
	}

	/// Longest line the chain can terminate.
	pub fn line_bound(&self) -> LineBound {
		self.line_bound
	}

	/// Iterates all contexts in sorted order.
	pub fn contexts(&self) -> impl Iterator<Item = &[String]> {
		self.contexts.iter().map(Vec::as_slice)
	}

	/// Successor set of `context`, if it was ever observed.
	pub fn successors<S: AsRef<str>>(&self, context: &[S]) -> Option<&SuccessorSet> {
		let key: Context = context.iter().map(|t| t.as_ref().to_owned()).collect();
		self.state(&key)
	}

	pub(crate) fn state(&self, context: &[String]) -> Option<&SuccessorSet> {
		let index = self.contexts.binary_search_by(|c| c.as_slice().cmp(context)).ok()?;
		self.states.get(index)
	}

	/// Picks a context uniformly among all contexts.
	pub(crate) fn random_context<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&[String]> {
		if self.contexts.is_empty() {
			return None;
		}
		let index = rng.random_range(0..self.contexts.len());
		Some(&self.contexts[index])
	}

	/// Writes the model to `path` using `postcard`.
	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ModelError> {
		let path = path.as_ref();
		let bytes = postcard::to_stdvec(self).map_err(|e| snapshot_error(path, e))?;
		std::fs::write(path, bytes).map_err(|e| snapshot_error(path, e))
	}

	/// Reads a model previously written by `save`.
	///
	/// # Errors
	/// Returns `ModelError::Snapshot` if the file cannot be read or decoded,
	/// if it decodes to an order below 2, or if its table is not well formed.
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
		let path = path.as_ref();
		let bytes = std::fs::read(path).map_err(|e| snapshot_error(path, e))?;
		let model: Self = postcard::from_bytes(&bytes).map_err(|e| snapshot_error(path, e))?;
		if model.order < 2 {
			return Err(snapshot_error(path, ModelError::InvalidOrder(model.order)));
		}
		let width = model.order - 1;
		if model.contexts.len() != model.states.len()
			|| model.contexts.iter().any(|c| c.len() != width)
			|| model.contexts.windows(2).any(|pair| pair[0] >= pair[1])
		{
			return Err(snapshot_error(path, "malformed transition table"));
		}
		Ok(model)
	}
}

/// Measures the longest terminated line over the context graph.
///
/// Nodes are contexts; emitting token `t` from context `c` moves to the
/// context `c[1..] + t`. Only nodes that can still reach a terminator
/// matter: a cycle among them makes lines unbounded, otherwise the longest
/// path is found with an iterative post-order walk.
fn measure_line_bound(contexts: &[Context], states: &[SuccessorSet]) -> LineBound {
	let count = contexts.len();
	let Some(width) = contexts.first().map(Vec::len) else {
		return LineBound::NoSentenceEnd;
	};
	let index_of = |key: &[String]| contexts.binary_search_by(|c| c.as_slice().cmp(key)).ok();

	let mut ends = vec![false; count];
	let mut next: Vec<Vec<usize>> = vec![Vec::new(); count];
	let mut prev: Vec<Vec<usize>> = vec![Vec::new(); count];
	for (i, (context, state)) in contexts.iter().zip(states).enumerate() {
		let mut key: Context = context[1..].to_vec();
		for (token, _) in state.iter() {
			if is_sentence_end(token) {
				ends[i] = true;
			}
			key.push(token.to_owned());
			if let Some(j) = index_of(key.as_slice()) {
				next[i].push(j);
				prev[j].push(i);
			}
			key.pop();
		}
	}

	// Backwards from every terminator
	let mut reaches = ends.clone();
	let mut queue: Vec<usize> = (0..count).filter(|&i| ends[i]).collect();
	while let Some(j) = queue.pop() {
		for &i in &prev[j] {
			if !reaches[i] {
				reaches[i] = true;
				queue.push(i);
			}
		}
	}
	if !reaches.contains(&true) {
		return LineBound::NoSentenceEnd;
	}

	// 0 = unvisited, 1 = on the walk, 2 = done
	let mut mark = vec![0u8; count];
	// Tokens that can still be appended from a context up to a terminator
	let mut longest = vec![0usize; count];
	for root in 0..count {
		if !reaches[root] || mark[root] != 0 {
			continue;
		}
		mark[root] = 1;
		let mut stack = vec![(root, 0usize)];
		while let Some((i, edge)) = stack.pop() {
			if let Some(&j) = next[i].get(edge) {
				stack.push((i, edge + 1));
				if !reaches[j] {
					continue;
				}
				match mark[j] {
					0 => {
						mark[j] = 1;
						stack.push((j, 0));
					}
					1 => return LineBound::Unbounded,
					_ => (),
				}
			} else {
				let mut best = usize::from(ends[i]);
				for &j in &next[i] {
					if reaches[j] {
						best = best.max(longest[j] + 1);
					}
				}
				longest[i] = best;
				mark[i] = 2;
			}
		}
	}

	let deepest = (0..count).filter(|&i| reaches[i]).map(|i| longest[i]).max().unwrap_or(0);
	LineBound::Longest(width + deepest)
}

fn snapshot_error(path: &Path, reason: impl std::fmt::Display) -> ModelError {
	ModelError::Snapshot { path: path.to_path_buf(), reason: reason.to_string() }
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn order_below_two_is_rejected() {
		assert!(matches!(ModelBuilder::new(1), Err(ModelError::InvalidOrder(1))));
		assert!(matches!(ModelBuilder::new(0), Err(ModelError::InvalidOrder(0))));
		assert!(ModelBuilder::new(2).is_ok());
	}

	#[test]
	fn windows_of_order_three() {
		let mut builder = ModelBuilder::new(3).unwrap();
		builder.add_text("unit", "a b c a b d");
		let model = builder.build();

		assert_eq!(model.context_count(), 3);
		let ab = model.successors(&["a", "b"]).unwrap();
		assert_eq!(ab.count("c"), 1);
		assert_eq!(ab.count("d"), 1);
		assert_eq!(model.successors(&["b", "c"]).unwrap().count("a"), 1);
		assert_eq!(model.successors(&["c", "a"]).unwrap().count("b"), 1);
		assert!(model.successors(&["b", "d"]).is_none());
	}

	#[test]
	fn short_text_is_dropped() {
		let mut builder = ModelBuilder::new(4).unwrap();
		builder.add_text("short", "too short");
		let model = builder.build();
		assert!(model.is_empty());
		assert_eq!(model.provenance().collect::<Vec<_>>(), vec!["short"]);
	}

	#[test]
	fn windows_do_not_cross_units() {
		let mut builder = ModelBuilder::new(2).unwrap();
		builder.add_text("first", "end");
		builder.add_text("second", "start");
		assert!(builder.build().is_empty());
	}

	#[test]
	fn merge_requires_same_order() {
		let mut a = ModelBuilder::new(2).unwrap();
		let b = ModelBuilder::new(3).unwrap();
		assert!(matches!(
			a.merge(&b),
			Err(ModelError::OrderMismatch { expected: 2, found: 3 })
		));
	}

	#[test]
	fn merge_sums_counts_and_provenance() {
		let mut a = ModelBuilder::new(2).unwrap();
		a.add_text("a", "x y");
		let mut b = ModelBuilder::new(2).unwrap();
		b.add_text("b", "x y x z");
		a.merge(&b).unwrap();

		let model = a.build();
		let x = model.successors(&["x"]).unwrap();
		assert_eq!(x.count("y"), 2);
		assert_eq!(x.count("z"), 1);
		assert_eq!(model.provenance().collect::<Vec<_>>(), vec!["a", "b"]);
	}

	fn model(order: usize, text: &str) -> MarkovModel {
		let mut builder = ModelBuilder::new(order).unwrap();
		builder.add_text("unit", text);
		builder.build()
	}

	#[test]
	fn longest_line_of_an_acyclic_chain() {
		assert_eq!(model(2, "a .").line_bound(), LineBound::Longest(2));
		// "x y z ." is the longest; (z, .) -> w never reaches a terminator
		assert_eq!(model(3, "x y z . w").line_bound(), LineBound::Longest(4));
	}

	#[test]
	fn cycle_through_a_terminator_is_unbounded() {
		assert_eq!(model(2, "the cat sat . the dog ran .").line_bound(), LineBound::Unbounded);
	}

	#[test]
	fn cycle_that_never_terminates_is_ignored() {
		// "round and round" loops forever but can never reach "stop ."
		assert_eq!(model(2, "stop . round and round").line_bound(), LineBound::Longest(2));
		assert_eq!(model(2, "round and round").line_bound(), LineBound::NoSentenceEnd);
		assert_eq!(ModelBuilder::new(2).unwrap().build().line_bound(), LineBound::NoSentenceEnd);
	}

	#[test]
	fn random_context_comes_from_the_table() {
		use rand::SeedableRng;
		use rand::rngs::StdRng;

		let m = model(3, "a b c d e f");
		let mut rng = StdRng::seed_from_u64(4);
		let all: Vec<&[String]> = m.contexts().collect();
		for _ in 0..50 {
			let picked = m.random_context(&mut rng).unwrap();
			assert!(all.contains(&picked));
			assert!(m.state(picked).is_some());
		}
	}

	#[test]
	fn snapshot_keeps_the_line_bound() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("m.bin");
		let m = model(2, "a b .");
		m.save(&path).unwrap();
		assert_eq!(MarkovModel::load(&path).unwrap().line_bound(), LineBound::Longest(3));
	}
}
