use std::sync::Arc;

use thiserror::Error;

use crate::config::{ConfigError, ModelConfig};
use crate::sampler::{self, DrawSource, SamplerError};
use crate::store::{CountStore, StoreError};
use crate::tokens::{join, scoped_key, END_TOKEN, START_TOKEN};

#[derive(Debug, Error)]
pub enum GeneratorError {
	#[error("no continuation for context {context:?} in scope {scope:?}")]
	NoContinuation { scope: String, context: String },

	#[error("generated text exceeded {0} tokens")]
	TooLong(usize),

	#[error(transparent)]
	Store(#[from] StoreError),

	#[error(transparent)]
	Sampler(#[from] SamplerError),
}

/// Generates text from the counts learned in a scope.
///
/// # Behavior
/// - Starts from the start sentinel alone.
/// - At each step, looks up the successors of the last `gen_order` tokens
///   (fewer while the text is still shorter than that) and samples one,
///   weighted by its count.
/// - Stops on the end sentinel.
///
/// A context without any stored successor is an error, not an end of text: a
/// scope trained on at least one message always has a continuation for every
/// context it produced.
#[derive(Clone)]
pub struct Generator {
	store: Arc<dyn CountStore>,
	config: ModelConfig,
}

impl Generator {
	/// Creates a generator reading from `store`.
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

	/// Generates one text using the thread random generator.
	pub fn generate(&self, scope: &str) -> Result<String, GeneratorError> {
		self.generate_with(scope, &mut rand::rng())
	}

	/// Generates one text, drawing every choice from `draws`.
	pub fn generate_with<D: DrawSource + ?Sized>(&self, scope: &str, draws: &mut D) -> Result<String, GeneratorError> {
		let mut tokens: Vec<String> = vec![START_TOKEN.to_owned()];

		loop {
			let context_len = self.config.gen_order.min(tokens.len());
			let context = join(&tokens[tokens.len() - context_len..]);

			let successors = self.store.scan(&scoped_key(scope, &context))?;
			if successors.is_empty() {
				return Err(GeneratorError::NoContinuation { scope: scope.to_owned(), context });
			}

			let next = sampler::choose(successors, draws)?;
			if next == END_TOKEN {
				break;
			}
			tokens.push(next);

			if tokens.len() - 1 > self.config.max_tokens {
				return Err(GeneratorError::TooLong(self.config.max_tokens));
			}
		}

		log::trace!("generated {} tokens in scope {scope:?}", tokens.len() - 1);
		Ok(join(&tokens[1..]))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::trainer::Trainer;
	use crate::sampler::ScriptedDraws;
	use crate::store::MemoryStore;

	fn setup(config: ModelConfig) -> (Trainer, Generator) {
		let store: Arc<dyn CountStore> = Arc::new(MemoryStore::new());
		let trainer = Trainer::new(store.clone(), config.clone()).unwrap();
		let generator = Generator::new(store, config).unwrap();
		(trainer, generator)
	}

	#[test]
	fn single_message_is_reproduced() {
		let (trainer, generator) = setup(ModelConfig::default());
		trainer.observe("g1", "hello there friend").unwrap();
		for _ in 0..20 {
			assert_eq!(generator.generate("g1").unwrap(), "hello there friend");
		}
	}

	#[test]
	fn untrained_scope_has_no_continuation() {
		let (trainer, generator) = setup(ModelConfig::default());
		trainer.observe("g1", "hello there friend").unwrap();
		match generator.generate("g2") {
			Err(GeneratorError::NoContinuation { scope, context }) => {
				assert_eq!(scope, "g2");
				assert_eq!(context, START_TOKEN);
			}
			other => panic!("unexpected result: {other:?}"),
		}
	}

	#[test]
	fn empty_message_generates_empty_text() {
		let (trainer, generator) = setup(ModelConfig::default());
		trainer.observe("g1", "").unwrap();
		assert_eq!(generator.generate("g1").unwrap(), "");
	}

	#[test]
	fn scripted_draws_pick_branches() {
		let config = ModelConfig { gen_order: 1, ..ModelConfig::default() };
		let (trainer, generator) = setup(config);
		trainer.observe("g1", "a x").unwrap();
		trainer.observe("g1", "b x").unwrap();

		// successors of start sorted: a, b; then x; then end
		let mut draws = ScriptedDraws::new([1, 0, 0]);
		assert_eq!(generator.generate_with("g1", &mut draws).unwrap(), "b x");

		let mut draws = ScriptedDraws::new([0, 0, 0]);
		assert_eq!(generator.generate_with("g1", &mut draws).unwrap(), "a x");
	}

	#[test]
	fn cyclic_model_is_bounded() {
		let config = ModelConfig { gen_order: 1, max_tokens: 8, ..ModelConfig::default() };
		let (trainer, generator) = setup(config);
		trainer.observe("g1", "a a").unwrap();

		// successors of "a" sort as [end, "a"], draw 1 always picks "a"
		let mut draws = ScriptedDraws::new([1]);
		assert!(matches!(generator.generate_with("g1", &mut draws), Err(GeneratorError::TooLong(8))));
	}
}
