#[cfg(any(test, feature = "test-util"))]
use std::collections::VecDeque;

use rand::Rng;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SamplerError {
	#[error("cannot sample from an empty distribution")]
	EmptyDistribution,

	#[error("total weight does not fit in 64 bits")]
	WeightOverflow,
}

/// Source of uniform draws used for weighted sampling.
///
/// Every `rand::Rng` is a draw source; tests can replay a fixed sequence with
/// `ScriptedDraws` (feature `test-util`).
pub trait DrawSource {
	/// Returns a uniform integer in `[0, upper)`. `upper` is never 0.
	fn draw_below(&mut self, upper: u64) -> u64;
}

impl<R: Rng> DrawSource for R {
	fn draw_below(&mut self, upper: u64) -> u64 {
		self.random_range(0..upper)
	}
}

/// Draw source replaying a fixed sequence of values, cycling when exhausted.
///
/// Each value is reduced modulo the requested bound. Only built for tests
/// (enable the `test-util` feature from another crate).
#[cfg(any(test, feature = "test-util"))]
#[derive(Clone, Debug, Default)]
pub struct ScriptedDraws {
	values: VecDeque<u64>,
}

#[cfg(any(test, feature = "test-util"))]
impl ScriptedDraws {
	pub fn new<I: IntoIterator<Item = u64>>(values: I) -> Self {
		Self { values: values.into_iter().collect() }
	}
}

#[cfg(any(test, feature = "test-util"))]
impl DrawSource for ScriptedDraws {
	fn draw_below(&mut self, upper: u64) -> u64 {
		match self.values.pop_front() {
			Some(value) => {
				self.values.push_back(value);
				value % upper
			}
			None => 0,
		}
	}
}

/// Picks an item with probability `weight / total_weight`.
///
/// Entries are sorted by item before the cumulative sums are built, so a
/// given draw always maps to the same item whatever order the weights came in.
/// The sums are accumulated in 128 bits; a total above `u64::MAX` is rejected.
///
/// # Errors
/// - `EmptyDistribution` if there is no entry or every weight is zero
/// - `WeightOverflow` if the total weight exceeds `u64::MAX`
pub fn choose<T, I, D>(weights: I, draws: &mut D) -> Result<T, SamplerError>
where
	T: Ord,
	I: IntoIterator<Item = (T, u64)>,
	D: DrawSource + ?Sized,
{
	let mut entries: Vec<(T, u64)> = weights.into_iter().collect();
	entries.sort_by(|a, b| a.0.cmp(&b.0));

	let total: u128 = entries.iter().map(|(_, weight)| u128::from(*weight)).sum();
	if total == 0 {
		return Err(SamplerError::EmptyDistribution);
	}
	let total = u64::try_from(total).map_err(|_| SamplerError::WeightOverflow)?;

	let mut r = draws.draw_below(total);

	let mut fallback = None;
	for (item, weight) in entries {
		if r < weight {
			return Ok(item);
		}
		r -= weight;
		if weight > 0 {
			fallback = Some(item);
		}
	}

	// Only reached with a draw source breaking its contract.
	fallback.ok_or(SamplerError::EmptyDistribution)
}
