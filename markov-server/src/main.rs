use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::middleware::{Condition, Logger};
use actix_web::{web, App, HttpServer};
use clap::Parser;

use markov_core::store::BatchLimit;
use markov_core::{CountStore, SledStore};

mod config;
mod error;
mod handlers;
mod reply;

use config::Args;
use handlers::SharedData;
use reply::ReplyPolicy;

/// Opens the database named on the command line.
fn open_store(args: &Args) -> Result<Arc<dyn CountStore>, markov_core::StoreError> {
	let batch_limit = BatchLimit::max_writes(args.batch_writes.max(1));
	log::info!("Opening database {}", args.db.display());
	Ok(Arc::new(SledStore::open(&args.db)?.with_batch_limit(batch_limit)))
}

/// Main entry point for the server.
///
/// Opens the count store, builds the trainer and generator on top of it,
/// and serves the HTTP endpoints until interrupted (SIGINT / SIGTERM). The
/// store is flushed before exiting.
#[actix_web::main]
async fn main() -> io::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
	let args = Args::parse();

	let store = open_store(&args).map_err(|e| io::Error::other(e.to_string()))?;
	let shared_data = SharedData::new(store.clone(), args.model_config(), ReplyPolicy::new(args.reply_one_in))
		.map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
	let shared_data = web::Data::new(shared_data);

	log::info!("Listening on {}", args.bind);
	let cors = args.cors;
	HttpServer::new(move || {
		App::new()
			.wrap(Logger::default())
			.wrap(Condition::new(cors, Cors::permissive()))
			.app_data(shared_data.clone())
			.configure(handlers::configure)
	})
		.bind(args.bind.as_str())?
		.run()
		.await?;

	log::info!("Stopping");
	store.flush().map_err(|e| io::Error::other(e.to_string()))?;
	Ok(())
}
