use std::sync::Arc;

use crate::config::{ConfigError, EmptyMessages, ModelConfig};
use crate::store::{CountStore, StoreError};
use crate::tokens::{chains, scoped_key};

/// Learns messages into a count store.
///
/// Every chain of a message is recorded under the scope the message arrived
/// in, all of them in one `increment_all` call.
#[derive(Clone)]
pub struct Trainer {
	store: Arc<dyn CountStore>,
	config: ModelConfig,
}

impl Trainer {
	/// Creates a trainer writing to `store`.
	///
	/// # Errors
	/// Returns an error if the configuration is invalid.
	pub fn new(store: Arc<dyn CountStore>, config: ModelConfig) -> Result<Self, ConfigError> {
		config.validate()?;
		Ok(Self { store, config })
	}

	pub fn config(&self) -> &ModelConfig {
		&self.config
	}

	/// Store keys produced by a message, in chain order.
	pub fn keys(&self, scope: &str, message: &str) -> Vec<String> {
		chains(message, self.config.max_save_order)
			.iter()
			.map(|chain| scoped_key(scope, chain))
			.collect()
	}

	/// Records one message.
	///
	/// An empty message trains the `[start, end]` chain unless the
	/// configuration says to ignore it.
	pub fn observe(&self, scope: &str, message: &str) -> Result<(), StoreError> {
		if message.is_empty() && self.config.empty_messages == EmptyMessages::Ignore {
			return Ok(());
		}
		self.store.increment_all(&self.keys(scope, message))
	}

	/// Records messages one after the other and returns how many were observed.
	///
	/// Stops at the first failing message; the ones before it stay recorded.
	pub fn observe_all<I, S>(&self, scope: &str, messages: I) -> Result<usize, StoreError>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut count = 0;
		for message in messages {
			self.observe(scope, message.as_ref())?;
			count += 1;
		}
		Ok(count)
	}
}
