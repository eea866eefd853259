use clap::Args;

use crate::config::{EmptyMessages, ModelConfig, DEFAULT_GEN_ORDER, DEFAULT_MAX_SAVE_ORDER, DEFAULT_MAX_TOKENS};

/// Model flags shared by every binary touching the same database.
///
/// The trainer and the generator must agree on the orders: a generator asking
/// for longer contexts than were stored finds no continuation. Flattening this
/// struct into each command line keeps the names, defaults and environment
/// variables identical.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ModelArgs {
	/// Longest chain order stored while training
	#[arg(long, default_value_t = DEFAULT_MAX_SAVE_ORDER, env = "MARKOV_MAX_SAVE_ORDER")]
	pub max_save_order: usize,

	/// Context length used while generating
	#[arg(long, default_value_t = DEFAULT_GEN_ORDER, env = "MARKOV_GEN_ORDER")]
	pub gen_order: usize,

	/// Longest generated text, in tokens
	#[arg(long, default_value_t = DEFAULT_MAX_TOKENS, env = "MARKOV_MAX_TOKENS")]
	pub max_tokens: usize,
}

impl ModelArgs {
	pub fn model_config(&self, empty_messages: EmptyMessages) -> ModelConfig {
		ModelConfig {
			max_save_order: self.max_save_order,
			gen_order: self.gen_order,
			max_tokens: self.max_tokens,
			empty_messages,
		}
	}
}

#[cfg(test)]
mod tests {
	use clap::Parser;

	use super::*;

	#[derive(Parser)]
	struct Cli {
		#[command(flatten)]
		model: ModelArgs,
	}

	#[test]
	fn defaults_match_model_config() {
		let cli = Cli::parse_from(["markov"]);
		let config = cli.model.model_config(EmptyMessages::Learn);
		assert_eq!(config, ModelConfig::default());
	}

	#[test]
	fn flags_reach_the_config() {
		let cli = Cli::parse_from(["markov", "--max-save-order", "8", "--gen-order", "7", "--max-tokens", "64"]);
		let config = cli.model.model_config(EmptyMessages::Ignore);
		assert_eq!(config.max_save_order, 8);
		assert_eq!(config.gen_order, 7);
		assert_eq!(config.max_tokens, 64);
		assert_eq!(config.empty_messages, EmptyMessages::Ignore);
		assert_eq!(config.validate(), Ok(()));
	}
}
