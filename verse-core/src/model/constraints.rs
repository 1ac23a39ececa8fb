use serde::{Deserialize, Serialize};

use crate::error::ConstraintError;

/// Token cap used when no explicit `max_length` is given and `min_length` is small.
pub const DEFAULT_MAX_LENGTH: usize = 35;

/// Attempts allowed per line before the budget is considered exhausted.
pub const DEFAULT_MAX_ATTEMPTS: usize = 100;

/// Constraints applied to every line of one `generate` call.
///
/// Deserializes from a partial table: every missing field takes its default.
///
/// # Invariants (checked by `validate`)
/// - `temperature` is finite and > 0
/// - `max_attempts` >= 1
/// - `min_length` never exceeds the token cap
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Constraints {
	/// Minimum number of tokens per line (punctuation included).
	pub min_length: usize,

	/// Sampling temperature. 1.0 follows raw frequencies.
	pub temperature: f64,

	/// Whether a line may repeat a line already produced in the same call.
	pub allow_duplicates: bool,

	/// Hard token cap per line. `None` means `max(10 * min_length, 35)`.
	pub max_length: Option<usize>,

	/// Attempts per line before giving up.
	pub max_attempts: usize,
}

impl Default for Constraints {
	fn default() -> Self {
		Self {
			min_length: 0,
			temperature: 1.0,
			allow_duplicates: true,
			max_length: None,
			max_attempts: DEFAULT_MAX_ATTEMPTS,
		}
	}
}

impl Constraints {
	/// Token cap applied to a single line.
	pub fn token_cap(&self) -> usize {
		self.max_length
			.unwrap_or_else(|| (self.min_length.saturating_mul(10)).max(DEFAULT_MAX_LENGTH))
	}

	/// Checks that the constraints can be satisfied at all.
	pub fn validate(&self) -> Result<(), ConstraintError> {
		if !self.temperature.is_finite() || self.temperature <= 0.0 {
			return Err(ConstraintError::Temperature(self.temperature));
		}
		if self.max_attempts == 0 {
			return Err(ConstraintError::Attempts);
		}
		let max_length = self.token_cap();
		if self.min_length > max_length {
			return Err(ConstraintError::MinLengthUnreachable { min_length: self.min_length, max_length });
		}
		Ok(())
	}
}
