//! Occurrence counters of token chains, kept in an ordered key-value store.
//!
//! Keys are `scope:chain` byte strings, values are 8-byte big-endian counts.
//! Because keys sort lexicographically, every chain extending a given context
//! is found with a single prefix scan.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use thiserror::Error;

use crate::tokens::TOKEN_SEPARATOR;

mod memory;
mod sled_store;

pub use memory::MemoryStore;
pub use sled_store::SledStore;

/// Number of writes after which a pending transaction is committed.
pub const DEFAULT_BATCH_WRITES: usize = 10_000;

#[derive(Debug, Error)]
pub enum StoreError {
	#[error("storage error: {0}")]
	Sled(#[from] sled::Error),

	#[error("corrupt count for key {key:?}: expected 8 bytes, got {len}")]
	Corrupt { key: String, len: usize },

	#[error("stored key is not valid UTF-8: {0:?}")]
	InvalidKey(Vec<u8>),

	#[error("store lock poisoned")]
	Poisoned,
}

/// Size of the writes pending in the current transaction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchStats {
	pub writes: usize,
	pub bytes: usize,
}

/// Decides when a pending transaction is full and must be committed before
/// the remaining writes continue in a fresh one.
///
/// The predicate is asked before every write except the first of a batch, so
/// a batch always makes progress.
#[derive(Clone)]
pub struct BatchLimit(Arc<dyn Fn(&BatchStats) -> bool + Send + Sync>);

impl BatchLimit {
	pub fn new<F>(is_full: F) -> Self
	where
		F: Fn(&BatchStats) -> bool + Send + Sync + 'static,
	{
		Self(Arc::new(is_full))
	}

	/// Commits everything in a single transaction.
	pub fn unbounded() -> Self {
		Self::new(|_| false)
	}

	/// Commits every `max` writes.
	pub fn max_writes(max: usize) -> Self {
		Self::new(move |stats| stats.writes >= max)
	}

	pub fn is_full(&self, stats: &BatchStats) -> bool {
		(self.0)(stats)
	}

	/// Cuts `deltas` into consecutive batches according to the predicate.
	pub(crate) fn split(&self, deltas: &[(&str, u64)]) -> Vec<Range<usize>> {
		let mut batches = Vec::new();
		let mut start = 0;
		let mut stats = BatchStats::default();
		for (i, (key, _)) in deltas.iter().enumerate() {
			if i > start && self.is_full(&stats) {
				batches.push(start..i);
				start = i;
				stats = BatchStats::default();
			}
			stats.writes += 1;
			stats.bytes += key.len() + COUNT_LEN;
		}
		if start < deltas.len() {
			batches.push(start..deltas.len());
		}
		batches
	}
}

impl Default for BatchLimit {
	fn default() -> Self {
		Self::max_writes(DEFAULT_BATCH_WRITES)
	}
}

impl fmt::Debug for BatchLimit {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("BatchLimit(..)")
	}
}

const COUNT_LEN: usize = 8;

pub(crate) fn encode_count(count: u64) -> [u8; COUNT_LEN] {
	count.to_be_bytes()
}

pub(crate) fn decode_count(key: &[u8], value: &[u8]) -> Result<u64, StoreError> {
	let bytes: [u8; COUNT_LEN] = value.try_into().map_err(|_| StoreError::Corrupt {
		key: String::from_utf8_lossy(key).into_owned(),
		len: value.len(),
	})?;
	Ok(u64::from_be_bytes(bytes))
}

fn key_str(key: &[u8]) -> Result<&str, StoreError> {
	std::str::from_utf8(key).map_err(|_| StoreError::InvalidKey(key.to_vec()))
}

/// Returns the successor token if `key` is `head` followed by exactly one token.
///
/// `head` already ends with the separator. Keys carrying a further separator
/// belong to longer chains and are rejected.
fn exact_successor<'a>(key: &'a str, head: &str) -> Option<&'a str> {
	let rest = key.strip_prefix(head)?;
	if rest.contains(TOKEN_SEPARATOR) {
		return None;
	}
	Some(rest)
}

/// Callback receiving raw `(key, value)` pairs during a prefix visit.
pub type Visitor<'a> = dyn FnMut(&[u8], &[u8]) -> Result<(), StoreError> + 'a;

/// Transactional counter storage.
///
/// Implementors provide atomic batch commits and a consistent prefix visit;
/// the counting, batching and successor filtering are shared.
pub trait CountStore: Send + Sync {
	/// Atomically adds every delta of the batch (missing keys count as 0).
	fn commit_batch(&self, batch: &[(&str, u64)]) -> Result<(), StoreError>;

	/// Predicate splitting large updates into several commits.
	fn batch_limit(&self) -> &BatchLimit;

	/// Visits every entry whose key starts with `prefix`, in key order, from a
	/// view no concurrent commit can change halfway.
	fn visit_prefix(&self, prefix: &[u8], visitor: &mut Visitor<'_>) -> Result<(), StoreError>;

	/// Persists outstanding writes.
	fn flush(&self) -> Result<(), StoreError> {
		Ok(())
	}

	/// Increments the counter of every key by one.
	///
	/// A key listed twice is incremented twice.
	fn increment_all(&self, keys: &[String]) -> Result<(), StoreError> {
		let deltas: Vec<(&str, u64)> = keys.iter().map(|key| (key.as_str(), 1)).collect();
		self.apply(&deltas)
	}

	/// Adds arbitrary amounts to counters (used to restore snapshots).
	fn add_all(&self, entries: &[(String, u64)]) -> Result<(), StoreError> {
		let deltas: Vec<(&str, u64)> = entries.iter().map(|(key, n)| (key.as_str(), *n)).collect();
		self.apply(&deltas)
	}

	/// Commits the deltas batch after batch.
	///
	/// When a commit fails the error is returned as is; batches committed
	/// before it stay applied.
	fn apply(&self, deltas: &[(&str, u64)]) -> Result<(), StoreError> {
		let batches = self.batch_limit().split(deltas);
		if batches.len() > 1 {
			log::debug!("splitting {} writes into {} transactions", deltas.len(), batches.len());
		}
		for range in batches {
			self.commit_batch(&deltas[range])?;
		}
		Ok(())
	}

	/// Returns the immediate successors of `prefix` with their counts.
	///
	/// Only keys made of `prefix`, one separator and exactly one more token are
	/// kept: `scan("g1:hello")` sees `g1:hello there` but not
	/// `g1:hello there friend`.
	fn scan(&self, prefix: &str) -> Result<BTreeMap<String, u64>, StoreError> {
		let mut head = String::with_capacity(prefix.len() + TOKEN_SEPARATOR.len());
		head.push_str(prefix);
		head.push_str(TOKEN_SEPARATOR);

		let mut counts = BTreeMap::new();
		self.visit_prefix(head.as_bytes(), &mut |key, value| {
			if let Some(next) = exact_successor(key_str(key)?, &head) {
				counts.insert(next.to_owned(), decode_count(key, value)?);
			}
			Ok(())
		})?;
		Ok(counts)
	}

	/// Returns every entry under `prefix`, in key order.
	fn entries(&self, prefix: &str) -> Result<Vec<(String, u64)>, StoreError> {
		let mut entries = Vec::new();
		self.visit_prefix(prefix.as_bytes(), &mut |key, value| {
			entries.push((key_str(key)?.to_owned(), decode_count(key, value)?));
			Ok(())
		})?;
		Ok(entries)
	}
}
