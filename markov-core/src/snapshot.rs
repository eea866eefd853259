use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::{CountStore, StoreError};
use crate::tokens::SCOPE_DELIMITER;

/// Version written in every snapshot; files with another version are refused.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SnapshotError {
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("encoding error: {0}")]
	Encoding(#[from] postcard::Error),

	#[error(transparent)]
	Store(#[from] StoreError),

	#[error("unsupported snapshot version {0}")]
	Version(u32),
}

/// All counts of one scope, as written to disk.
///
/// Entries hold the full store key (scope included) and its count.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
	pub version: u32,
	pub scope: String,
	pub entries: Vec<(String, u64)>,
}

impl Snapshot {
	/// Collects every entry of `scope` from the store.
	pub fn capture(store: &dyn CountStore, scope: &str) -> Result<Self, StoreError> {
		let mut prefix = scope.to_owned();
		prefix.push_str(SCOPE_DELIMITER);
		Ok(Self { version: SNAPSHOT_VERSION, scope: scope.to_owned(), entries: store.entries(&prefix)? })
	}

	pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
		Ok(postcard::to_stdvec(self)?)
	}

	pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
		let snapshot: Snapshot = postcard::from_bytes(bytes)?;
		if snapshot.version != SNAPSHOT_VERSION {
			return Err(SnapshotError::Version(snapshot.version));
		}
		Ok(snapshot)
	}
}

/// Writes every count of `scope` to `path` and returns the number of entries.
pub fn export<P: AsRef<Path>>(store: &dyn CountStore, scope: &str, path: P) -> Result<usize, SnapshotError> {
	let snapshot = Snapshot::capture(store, scope)?;
	std::fs::write(path, snapshot.to_bytes()?)?;
	Ok(snapshot.entries.len())
}

/// Adds the counts of a snapshot file to the store.
///
/// Counts already present are summed with the snapshot's, so restoring twice
/// doubles them.
pub fn restore<P: AsRef<Path>>(store: &dyn CountStore, path: P) -> Result<Snapshot, SnapshotError> {
	let bytes = std::fs::read(path)?;
	let snapshot = Snapshot::from_bytes(&bytes)?;
	store.add_all(&snapshot.entries)?;
	Ok(snapshot)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::store::MemoryStore;

	#[test]
	fn capture_only_takes_the_scope() {
		let store = MemoryStore::new();
		store.increment_all(&["g1:a b".to_owned(), "g10:a b".to_owned(), "g1:b c".to_owned()]).unwrap();

		let snapshot = Snapshot::capture(&store, "g1").unwrap();
		assert_eq!(snapshot.entries, vec![("g1:a b".to_owned(), 1), ("g1:b c".to_owned(), 1)]);
	}

	#[test]
	fn other_version_is_refused() {
		let snapshot = Snapshot { version: 42, scope: "g1".to_owned(), entries: Vec::new() };
		let bytes = snapshot.to_bytes().unwrap();
		assert!(matches!(Snapshot::from_bytes(&bytes), Err(SnapshotError::Version(42))));
	}

	#[test]
	fn garbage_is_an_encoding_error() {
		assert!(matches!(Snapshot::from_bytes(&[0xff, 0xff, 0xff]), Err(SnapshotError::Encoding(_))));
	}

	#[test]
	fn restore_merges_into_existing_counts() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("g1.bin");

		let source = MemoryStore::new();
		source.increment_all(&["g1:a b".to_owned(), "g1:a b".to_owned()]).unwrap();
		assert_eq!(export(&source, "g1", &path).unwrap(), 1);

		let target = MemoryStore::new();
		target.increment_all(&["g1:a b".to_owned()]).unwrap();
		let snapshot = restore(&target, &path).unwrap();
		assert_eq!(snapshot.scope, "g1");
		assert_eq!(target.scan("g1:a").unwrap()["b"], 3);
	}
}
