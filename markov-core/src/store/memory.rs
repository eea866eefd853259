use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::RwLock;

use super::{decode_count, encode_count, BatchLimit, CountStore, StoreError, Visitor};

/// In-process counter store.
///
/// Keeps the same byte encoding as the persistent store, so both behave the
/// same from the outside. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
	entries: RwLock<BTreeMap<Vec<u8>, [u8; 8]>>,
	batch_limit: BatchLimit,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_batch_limit(mut self, batch_limit: BatchLimit) -> Self {
		self.batch_limit = batch_limit;
		self
	}

	/// Number of stored chains (all scopes).
	pub fn len(&self) -> Result<usize, StoreError> {
		let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
		Ok(entries.len())
	}

	pub fn is_empty(&self) -> Result<bool, StoreError> {
		Ok(self.len()? == 0)
	}
}

impl CountStore for MemoryStore {
	fn commit_batch(&self, batch: &[(&str, u64)]) -> Result<(), StoreError> {
		let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;

		// Compute every new value first so a corrupt entry leaves the map untouched.
		let mut updates: BTreeMap<&[u8], u64> = BTreeMap::new();
		for (key, delta) in batch {
			let key = key.as_bytes();
			let current = match updates.get(key) {
				Some(pending) => *pending,
				None => match entries.get(key) {
					Some(value) => decode_count(key, value)?,
					None => 0,
				},
			};
			updates.insert(key, current.saturating_add(*delta));
		}

		for (key, count) in updates {
			entries.insert(key.to_vec(), encode_count(count));
		}
		Ok(())
	}

	fn batch_limit(&self) -> &BatchLimit {
		&self.batch_limit
	}

	fn visit_prefix(&self, prefix: &[u8], visitor: &mut Visitor<'_>) -> Result<(), StoreError> {
		let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
		let range = entries.range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded));
		for (key, value) in range.take_while(|(key, _)| key.starts_with(prefix)) {
			visitor(key.as_slice(), value.as_slice())?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn keys(list: &[&str]) -> Vec<String> {
		list.iter().map(|k| k.to_string()).collect()
	}

	#[test]
	fn scan_is_depth_exact() {
		let store = MemoryStore::new();
		store
			.increment_all(&keys(&["g1:hello there", "g1:hello there friend", "g1:hello there friend \x03"]))
			.unwrap();

		let counts = store.scan("g1:hello").unwrap();
		assert_eq!(counts.len(), 1);
		assert_eq!(counts["there"], 1);
	}

	#[test]
	fn scan_does_not_cross_scopes() {
		let store = MemoryStore::new();
		store.increment_all(&keys(&["g1:a b", "g10:a c", "g:a d"])).unwrap();

		let counts = store.scan("g1:a").unwrap();
		assert_eq!(counts.keys().collect::<Vec<_>>(), vec!["b"]);
	}

	#[test]
	fn entries_lists_prefix_in_key_order() {
		let store = MemoryStore::new();
		store.increment_all(&keys(&["g1:b c", "g1:a b", "g2:a b", "g1:a b"])).unwrap();

		let entries = store.entries("g1:").unwrap();
		assert_eq!(entries, vec![("g1:a b".to_owned(), 2), ("g1:b c".to_owned(), 1)]);
		assert_eq!(store.len().unwrap(), 3);
	}

	#[test]
	fn poisoned_lock_is_reported() {
		let store = std::sync::Arc::new(MemoryStore::new());
		store.increment_all(&keys(&["g1:a b"])).unwrap();

		let writer = store.clone();
		let crashed = std::thread::spawn(move || {
			let _entries = writer.entries.write().unwrap();
			panic!("writer crashed while holding the lock");
		})
		.join();
		assert!(crashed.is_err());

		assert!(matches!(store.len(), Err(StoreError::Poisoned)));
		assert!(matches!(store.is_empty(), Err(StoreError::Poisoned)));
		assert!(matches!(store.scan("g1:a"), Err(StoreError::Poisoned)));
	}

	#[test]
	fn add_all_sums_deltas() {
		let store = MemoryStore::new();
		store.add_all(&[("g1:a b".to_owned(), 5), ("g1:a b".to_owned(), 2)]).unwrap();
		store.increment_all(&keys(&["g1:a b"])).unwrap();
		assert_eq!(store.scan("g1:a").unwrap()["b"], 8);
	}

	#[test]
	fn batch_limit_does_not_change_result() {
		let chains = keys(&["s:a b", "s:a c", "s:a b", "s:b c", "s:a b c"]);
		let whole = MemoryStore::new().with_batch_limit(BatchLimit::unbounded());
		let split = MemoryStore::new().with_batch_limit(BatchLimit::max_writes(2));
		whole.increment_all(&chains).unwrap();
		split.increment_all(&chains).unwrap();

		assert_eq!(whole.entries("s:").unwrap(), split.entries("s:").unwrap());
	}
}
