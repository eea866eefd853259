use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;

use clap::Parser;

use markov_core::io::{build_output_path, get_filename, read_messages};
use markov_core::cli::ModelArgs;
use markov_core::{snapshot, CountStore, EmptyMessages, ModelConfig, SledStore, Trainer};

/// Imports a message history into a scope, and moves scopes between stores.
#[derive(Parser, Debug)]
#[command(name = "markov-import", version)]
struct Args {
    /// Directory of the sled database
    #[arg(long, default_value = "./data/markov.db", env = "MARKOV_DB")]
    db: PathBuf,

    /// Scope to train into (defaults to the history file name)
    #[arg(long)]
    scope: Option<String>,

    /// History file, one message per line
    #[arg(long)]
    file: Option<PathBuf>,

    /// Snapshot file to add to the store before importing
    #[arg(long)]
    restore: Option<PathBuf>,

    /// Snapshot file to write the scope to once done
    #[arg(long)]
    export: Option<PathBuf>,

    /// Write the snapshot next to the history file (`general.txt` -> `general.bin`)
    #[arg(long, conflicts_with = "export", requires = "file")]
    snapshot: bool,

    /// Orders to train with; must match the server reading the database
    #[command(flatten)]
    model: ModelArgs,
}

impl Args {
    /// Training configuration. Empty lines never reach the trainer.
    fn model_config(&self) -> ModelConfig {
        self.model.model_config(EmptyMessages::Ignore)
    }

    fn export_path(&self) -> std::io::Result<Option<PathBuf>> {
        match (&self.export, &self.file) {
            (Some(path), _) => Ok(Some(path.clone())),
            (None, Some(file)) if self.snapshot => build_output_path(file, "bin").map(Some),
            _ => Ok(None),
        }
    }
}

/// Result of a history import.
#[derive(Debug, Default, PartialEq, Eq)]
struct ImportReport {
    imported: usize,
    failed: usize,
}

/// Trains every message on worker threads sharing the trainer's store.
///
/// Lines are split into `cpus * 8` chunks, one thread per chunk. A message
/// that fails is logged and skipped, the others keep going.
fn import_messages(trainer: &Trainer, scope: &str, messages: Vec<String>) -> ImportReport {
    let chunks = num_cpus::get() * 8;
    let chunk_size = messages.len().div_ceil(chunks).max(1);

    let (tx, rx) = mpsc::channel();
    for (index, chunk) in messages.chunks(chunk_size).enumerate() {
        let tx = tx.clone();
        let chunk: Vec<String> = chunk.to_vec();
        let trainer = trainer.clone();
        let scope = scope.to_owned();

        thread::spawn(move || {
            let mut failed = 0;
            for message in &chunk {
                if let Err(e) = trainer.observe(&scope, message) {
                    log::error!("Error: {e}");
                    failed += 1;
                }
            }
            // The receiver only disappears if the main thread is gone.
            let _ = tx.send((index, chunk.len(), failed));
        });
    }
    drop(tx);

    let mut report = ImportReport::default();
    for (index, len, failed) in rx.iter() {
        report.imported += len - failed;
        report.failed += failed;
        log::info!("Chunk {index}: processed {len} messages, {} in total", report.imported + report.failed);
    }
    report
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    log::info!("Starting");
    let store = Arc::new(SledStore::open(&args.db)?);

    if let Some(path) = &args.restore {
        let restored = snapshot::restore(store.as_ref(), path)?;
        log::info!("Restored {} chains of scope {:?}", restored.entries.len(), restored.scope);
    }

    let scope = match (&args.scope, &args.file) {
        (Some(scope), _) => Some(scope.clone()),
        (None, Some(file)) => Some(get_filename(file)?),
        (None, None) => None,
    };

    if let Some(file) = &args.file {
        let scope = scope.as_deref().ok_or("a scope is required to import")?;
        let trainer = Trainer::new(store.clone(), args.model_config())?;

        let messages = read_messages(file)?;
        log::info!("Importing {} messages from {} into scope {scope:?}", messages.len(), file.display());
        let report = import_messages(&trainer, scope, messages);
        log::info!("Imported {} messages ({} failed)", report.imported, report.failed);
    }

    if let Some(path) = args.export_path()? {
        let scope = scope.as_deref().ok_or("--export needs --scope or --file")?;
        let written = snapshot::export(store.as_ref(), scope, &path)?;
        log::info!("Exported {written} chains of scope {scope:?} to {}", path.display());
    }

    log::info!("Stopping");
    store.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use markov_core::{Generator, MemoryStore};

    use super::*;

    #[test]
    fn import_trains_every_message() {
        let store = Arc::new(MemoryStore::new());
        let trainer = Trainer::new(store.clone(), ModelConfig::default()).unwrap();
        let messages: Vec<String> = (0..100).map(|_| "same old line".to_owned()).collect();

        let report = import_messages(&trainer, "history", messages);
        assert_eq!(report, ImportReport { imported: 100, failed: 0 });
        assert_eq!(store.scan("history:\x02").unwrap()["same"], 100);

        let generator = Generator::new(store, ModelConfig::default()).unwrap();
        assert_eq!(generator.generate("history").unwrap(), "same old line");
    }

    #[test]
    fn import_of_nothing_is_empty() {
        let store = Arc::new(MemoryStore::new());
        let trainer = Trainer::new(store.clone(), ModelConfig::default()).unwrap();
        assert_eq!(import_messages(&trainer, "history", Vec::new()), ImportReport::default());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn args_accept_snapshot_paths() {
        let args = Args::parse_from(["markov-import", "--file", "general.txt", "--export", "general.bin"]);
        assert_eq!(args.file, Some(PathBuf::from("general.txt")));
        assert_eq!(args.export, Some(PathBuf::from("general.bin")));
        assert!(args.scope.is_none());
    }

    #[test]
    fn order_flags_reach_the_trainer() {
        let args = Args::parse_from(["markov-import", "--file", "g1.txt", "--max-save-order", "8", "--gen-order", "7"]);
        let config = args.model_config();
        assert_eq!(config.max_save_order, 8);
        assert_eq!(config.empty_messages, EmptyMessages::Ignore);

        let store = Arc::new(MemoryStore::new());
        let trainer = Trainer::new(store.clone(), config.clone()).unwrap();
        let report = import_messages(&trainer, "g1", vec!["a b c d e f g h i j".to_owned()]);
        assert_eq!(report.imported, 1);

        // a server started with the same flags finds every long context
        let generator = Generator::new(store, config).unwrap();
        assert_eq!(generator.generate("g1").unwrap(), "a b c d e f g h i j");
    }

    #[test]
    fn snapshot_lands_next_to_history() {
        let args = Args::parse_from(["markov-import", "--file", "data/general.txt", "--snapshot"]);
        assert_eq!(args.export_path().unwrap(), Some(PathBuf::from("data/general.bin")));

        let args = Args::parse_from(["markov-import", "--file", "data/general.txt"]);
        assert_eq!(args.export_path().unwrap(), None);
    }
}
