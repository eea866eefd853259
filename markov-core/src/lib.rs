//! Variable-order Markov text model stored in an ordered key-value store.
//!
//! This crate provides:
//! - Chain extraction from messages (`tokens`)
//! - Transactional occurrence counters with prefix scans (`store`)
//! - Weighted sampling with an injectable random source (`sampler`)
//! - Training and generation (`model`)
//! - Scope snapshots for backup and transfer (`snapshot`)
//!
//! Nothing is kept in memory between calls: every count lives in the store.

/// Sentinels, separators and chain extraction.
pub mod tokens;

/// Orders and policies of the model.
pub mod config;

/// Count store trait and its sled and in-memory backends.
pub mod store;

/// Weighted random choice.
pub mod sampler;

/// Trainer and generator.
pub mod model;

/// Export and restore the counts of a scope.
pub mod snapshot;

/// I/O utilities (history files, path helpers).
pub mod io;

/// Command line flags shared by the binaries.
#[cfg(feature = "cli")]
pub mod cli;

pub use config::{ConfigError, EmptyMessages, ModelConfig};
pub use model::{Generator, GeneratorError, Trainer};
pub use sampler::{DrawSource, SamplerError};
#[cfg(any(test, feature = "test-util"))]
pub use sampler::ScriptedDraws;
pub use store::{BatchLimit, BatchStats, CountStore, MemoryStore, SledStore, StoreError};
