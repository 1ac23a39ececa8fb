use std::collections::BTreeMap;

use rand::Rng;

use serde::{Deserialize, Serialize};


/// Weighted successor set of one context.
///
/// Conceptually, this is a node in a Markov chain where outgoing edges
/// are weighted by their number of observations.
///
/// ## Responsibilities:
/// - Accumulate successor occurrences during learning
/// - Pick the next token using temperature-scaled weighted sampling
/// - Merge with the successor set of the same context from another builder
///
/// ## Invariants
/// - Each occurrence count is strictly positive
/// - Successors iterate in token order, so a seeded RNG gives stable output
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct SuccessorSet {
	/// Observed successors and how many times each one was seen.
	/// Example: { "cat" => 2, "dog" => 1 }
	transitions: BTreeMap<String, usize>,
}

impl SuccessorSet {
	pub fn new() -> Self {
		Self::default()
	}

	/// Records one occurrence of `token` following this context.
	pub(crate) fn add_transition(&mut self, token: &str) {
		if let Some(occurrence) = self.transitions.get_mut(token) {
			*occurrence += 1;
		} else {
			self.transitions.insert(token.to_owned(), 1);
		}
	}

	/// Occurrence count of `token`, 0 when never observed.
	pub fn count(&self, token: &str) -> usize {
		self.transitions.get(token).copied().unwrap_or(0)
	}

	/// Sum of all occurrence counts.
	pub fn total(&self) -> usize {
		self.transitions.values().sum()
	}

	/// Number of distinct successors.
	pub fn len(&self) -> usize {
		self.transitions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.transitions.is_empty()
	}

	/// Iterates `(token, count)` pairs in token order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
		self.transitions.iter().map(|(token, occurrence)| (token.as_str(), *occurrence))
	}

	/// Samples a successor.
	///
	/// Each successor is weighted by `count^(1/temperature)`. Counts are
	/// first divided by the largest count so that a tiny temperature cannot
	/// overflow the weights; the distribution is unchanged by that scaling.
	///
	/// - `temperature == 1.0` follows the raw frequencies
	/// - `temperature < 1.0` sharpens toward the most frequent successor
	/// - `temperature > 1.0` flattens toward uniform
	///
	/// Returns `None` if the set is empty. `temperature` must be finite and
	/// positive, which `Constraints::validate` guarantees.
	pub fn sample<R: Rng + ?Sized>(&self, temperature: f64, rng: &mut R) -> Option<&str> {
		let max = *self.transitions.values().max()? as f64;
		let exponent = 1.0 / temperature;

		let weight = |occurrence: usize| (occurrence as f64 / max).powf(exponent);
		let total: f64 = self.transitions.values().map(|o| weight(*o)).sum();
		if total.is_nan() || total <= 0.0 {
			return None;
		}

		let mut r = rng.random_range(0.0..total);

		let mut fallback: Option<&str> = None;
		for (token, occurrence) in &self.transitions {
			let w = weight(*occurrence);
			if r < w {
				return Some(token.as_str());
			}
			r -= w;
			if w > 0.0 {
				fallback = Some(token.as_str());
			}
		}

		// Floating point rounding can leave a sliver past the last bucket
		fallback
	}

	/// Sums another successor set into this one.
	pub(crate) fn merge(&mut self, other: &Self) {
		for (token, occurrence) in &other.transitions {
			*self.transitions.entry(token.clone()).or_insert(0) += *occurrence;
		}
	}
}
