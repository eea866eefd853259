use std::path::Path;
use std::sync::RwLock;

use sled::transaction::{ConflictableTransactionError, ConflictableTransactionResult, TransactionError};

use super::{decode_count, encode_count, BatchLimit, CountStore, StoreError, Visitor};

const COUNTS_TREE: &str = "counts";

/// Persistent counter store backed by `sled`.
///
/// Every batch is a single sled transaction, so a crash never leaves half a
/// batch on disk. The commit gate is held shared by scans and exclusively by
/// commits: sled iterators are not snapshots, and without the gate a scan could
/// see one half of a batch.
pub struct SledStore {
	db: sled::Db,
	counts: sled::Tree,
	gate: RwLock<()>,
	batch_limit: BatchLimit,
}

impl SledStore {
	/// Opens (or creates) a store in the given directory.
	pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
		let db = sled::Config::new().path(path).open()?;
		Self::from_db(db)
	}

	/// Opens a store deleted when dropped.
	pub fn temporary() -> Result<Self, StoreError> {
		let db = sled::Config::new().temporary(true).open()?;
		Self::from_db(db)
	}

	fn from_db(db: sled::Db) -> Result<Self, StoreError> {
		let counts = db.open_tree(COUNTS_TREE)?;
		Ok(Self { db, counts, gate: RwLock::new(()), batch_limit: BatchLimit::default() })
	}

	/// Replaces the predicate deciding when a transaction is committed early.
	pub fn with_batch_limit(mut self, batch_limit: BatchLimit) -> Self {
		self.batch_limit = batch_limit;
		self
	}
}

impl From<TransactionError<StoreError>> for StoreError {
	fn from(err: TransactionError<StoreError>) -> Self {
		match err {
			TransactionError::Abort(e) => e,
			TransactionError::Storage(e) => StoreError::Sled(e),
		}
	}
}

impl CountStore for SledStore {
	fn commit_batch(&self, batch: &[(&str, u64)]) -> Result<(), StoreError> {
		let _gate = self.gate.write().map_err(|_| StoreError::Poisoned)?;

		// The closure may run again on conflict, it only reads through `tx`.
		self.counts.transaction(|tx| -> ConflictableTransactionResult<(), StoreError> {
			for (key, delta) in batch {
				let current = match tx.get(key.as_bytes())? {
					Some(value) => decode_count(key.as_bytes(), &value).map_err(ConflictableTransactionError::Abort)?,
					None => 0,
				};
				let updated = encode_count(current.saturating_add(*delta));
				tx.insert(key.as_bytes(), &updated[..])?;
			}
			Ok(())
		})?;
		Ok(())
	}

	fn batch_limit(&self) -> &BatchLimit {
		&self.batch_limit
	}

	fn visit_prefix(&self, prefix: &[u8], visitor: &mut Visitor<'_>) -> Result<(), StoreError> {
		let _gate = self.gate.read().map_err(|_| StoreError::Poisoned)?;
		for item in self.counts.scan_prefix(prefix) {
			let (key, value) = item?;
			visitor(&key[..], &value[..])?;
		}
		Ok(())
	}

	fn flush(&self) -> Result<(), StoreError> {
		self.db.flush()?;
		Ok(())
	}
}
