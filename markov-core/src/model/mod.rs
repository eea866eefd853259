//! Training and generation on top of a count store.
//!
//! - `Trainer` records the chains of incoming messages
//! - `Generator` walks the recorded chains to produce new text
//!
//! Both hold a shared handle on the same `CountStore`; the store's
//! transactions are their only synchronization.

/// Records messages into a count store, one transaction batch per message.
pub mod trainer;

/// Samples new text from the successors stored for each context.
pub mod generator;

pub use generator::{Generator, GeneratorError};
pub use trainer::Trainer;
