use std::path::PathBuf;

use clap::Parser;

use markov_core::cli::ModelArgs;
use markov_core::store::DEFAULT_BATCH_WRITES;
use markov_core::{EmptyMessages, ModelConfig};

/// Command line (and environment) configuration of the server.
#[derive(Parser, Debug, Clone)]
#[command(name = "markov-server", version, about = "Learns chat messages and answers with generated ones")]
pub struct Args {
	/// Address to listen on
	#[arg(long, default_value = "127.0.0.1:5000", env = "MARKOV_BIND")]
	pub bind: String,

	/// Directory of the sled database
	#[arg(long, default_value = "./data/markov.db", env = "MARKOV_DB")]
	pub db: PathBuf,

	/// Reply to a message that does not mention the bot once in N (0 = never)
	#[arg(long, default_value_t = 1000, env = "MARKOV_REPLY_ONE_IN")]
	pub reply_one_in: u64,

	/// Also learn messages without text
	#[arg(long)]
	pub learn_empty: bool,

	#[command(flatten)]
	pub model: ModelArgs,

	/// Writes per store transaction before committing and continuing
	#[arg(long, default_value_t = DEFAULT_BATCH_WRITES)]
	pub batch_writes: usize,

	/// Accept cross-origin requests from any origin
	#[arg(long)]
	pub cors: bool,
}

impl Args {
	pub fn model_config(&self) -> ModelConfig {
		let empty_messages = if self.learn_empty { EmptyMessages::Learn } else { EmptyMessages::Ignore };
		self.model.model_config(empty_messages)
	}
}
