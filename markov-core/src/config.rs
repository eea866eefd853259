use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest chain order stored while training (chains hold up to `order + 1` tokens).
pub const DEFAULT_MAX_SAVE_ORDER: usize = 5;

/// Context length used while generating.
pub const DEFAULT_GEN_ORDER: usize = 3;

/// Upper bound on the number of generated tokens before giving up.
pub const DEFAULT_MAX_TOKENS: usize = 512;

/// What training does with a message that has no text.
///
/// An empty message still tokenizes to `[start, end]`; learning that chain
/// makes "say nothing" a possible generation outcome.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EmptyMessages {
	/// Train the `[start, end]` chain.
	#[default]
	Learn,
	/// Skip the message without touching the store.
	Ignore,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
	#[error("max_save_order must be >= 1, got {0}")]
	SaveOrder(usize),

	#[error("gen_order must be between 1 and {max} (max_save_order), got {got}")]
	GenOrder { got: usize, max: usize },

	#[error("max_tokens must be >= 1")]
	MaxTokens,
}

/// Orders and policies shared by the trainer and the generator.
///
/// # Invariants
/// - `max_save_order >= 1`
/// - `1 <= gen_order <= max_save_order`: a context of `gen_order` tokens plus
///   its successor must fit in the longest stored chain, otherwise the
///   exact-successor scan stops finding matches once the text is long enough
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ModelConfig {
	pub max_save_order: usize,
	pub gen_order: usize,
	pub max_tokens: usize,
	pub empty_messages: EmptyMessages,
}

impl Default for ModelConfig {
	fn default() -> Self {
		Self {
			max_save_order: DEFAULT_MAX_SAVE_ORDER,
			gen_order: DEFAULT_GEN_ORDER,
			max_tokens: DEFAULT_MAX_TOKENS,
			empty_messages: EmptyMessages::default(),
		}
	}
}

impl ModelConfig {
	/// Checks the order invariants.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.max_save_order < 1 {
			return Err(ConfigError::SaveOrder(self.max_save_order));
		}
		let max = self.max_save_order;
		if self.gen_order < 1 || self.gen_order > max {
			return Err(ConfigError::GenOrder { got: self.gen_order, max });
		}
		if self.max_tokens < 1 {
			return Err(ConfigError::MaxTokens);
		}
		Ok(())
	}
}
