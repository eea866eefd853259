use std::collections::BTreeMap;
use std::sync::Arc;

use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;

use markov_core::tokens::{scoped_key, START_TOKEN};
use markov_core::{ConfigError, CountStore, Generator, ModelConfig, Trainer};

use crate::error::ApiError;
use crate::reply::ReplyPolicy;

/// Everything the handlers share: one store, and the trainer and generator on top of it.
pub struct SharedData {
	pub store: Arc<dyn CountStore>,
	trainer: Trainer,
	generator: Generator,
	reply_policy: ReplyPolicy,
}

impl SharedData {
	pub fn new(store: Arc<dyn CountStore>, config: ModelConfig, reply_policy: ReplyPolicy) -> Result<Self, ConfigError> {
		Ok(Self {
			trainer: Trainer::new(store.clone(), config.clone())?,
			generator: Generator::new(store.clone(), config)?,
			store,
			reply_policy,
		})
	}

	/// Inbound hook: learns the message and returns the reply to send, if any.
	///
	/// A reply that cannot be generated is dropped with a warning; only the
	/// training failure is an error.
	fn on_message(&self, scope: &str, text: &str, mentioned: bool) -> Result<Option<String>, ApiError> {
		self.trainer.observe(scope, text)?;

		if !self.reply_policy.should_reply(mentioned, &mut rand::rng()) {
			return Ok(None);
		}
		match self.generator.generate(scope) {
			Ok(reply) => Ok(Some(reply)),
			Err(e) => {
				log::warn!("Could not reply in scope {scope:?}: {e}");
				Ok(None)
			}
		}
	}
}

#[derive(Deserialize)]
struct MessageQuery {
	mentioned: Option<bool>,
}

#[derive(Deserialize)]
struct SuccessorsQuery {
	context: Option<String>,
}

/// HTTP POST endpoint `/v1/scopes/{scope}/messages`
///
/// The body is the message text. Returns the reply to send as the body of a
/// `200`, or `204` when the bot stays silent.
#[post("/v1/scopes/{scope}/messages")]
async fn post_message(
	data: web::Data<SharedData>,
	scope: web::Path<String>,
	query: web::Query<MessageQuery>,
	body: String,
) -> Result<HttpResponse, ApiError> {
	let scope = scope.into_inner();
	let mentioned = query.mentioned.unwrap_or(false);
	log::info!("Received message in scope {scope:?} ({} bytes)", body.len());

	let reply = web::block(move || data.on_message(&scope, &body, mentioned)).await??;
	Ok(match reply {
		Some(text) => {
			log::info!("Replying with {} bytes", text.len());
			HttpResponse::Ok().body(text)
		}
		None => HttpResponse::NoContent().finish(),
	})
}

/// HTTP GET endpoint `/v1/scopes/{scope}/generate`
///
/// Generates a message from what the scope learned.
#[get("/v1/scopes/{scope}/generate")]
async fn get_generated(data: web::Data<SharedData>, scope: web::Path<String>) -> Result<HttpResponse, ApiError> {
	let scope = scope.into_inner();
	let text = web::block(move || data.generator.generate(&scope)).await??;
	Ok(HttpResponse::Ok().body(text))
}

/// HTTP GET endpoint `/v1/scopes/{scope}/successors?context=...`
///
/// Returns the successor counts of a context as JSON (the start sentinel when
/// no context is given).
#[get("/v1/scopes/{scope}/successors")]
async fn get_successors(
	data: web::Data<SharedData>,
	scope: web::Path<String>,
	query: web::Query<SuccessorsQuery>,
) -> Result<HttpResponse, ApiError> {
	let prefix = scoped_key(&scope, query.context.as_deref().unwrap_or(START_TOKEN));
	let counts: BTreeMap<String, u64> = web::block(move || data.store.scan(&prefix)).await??;
	Ok(HttpResponse::Ok().json(counts))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
	cfg.service(post_message).service(get_generated).service(get_successors);
}
