//! CLI utility to publish a train event for a model.

use std::path::PathBuf;

use emld_trainer::config::{self, ServiceConfig};
use emld_trainer::domain::TrainEvent;
use emld_trainer::queue;
use emld_trainer::store::Store;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let Some(options) = parse_args(std::env::args().skip(1).collect())? else {
        return Ok(());
    };
    let config: ServiceConfig = match &options.config_path {
        Some(path) => config::load_from(path),
        None => config::load_or_default(),
    }
    .map_err(|err| err.to_string())?;
    let db_path = config
        .store
        .resolved_db_path()
        .map_err(|err| err.to_string())?;
    let store = Store::open(&db_path)
        .map_err(|err| format!("Open store {} failed: {err}", db_path.display()))?;

    let event = TrainEvent::new(options.model_id, options.user_id);
    let body = event
        .encode()
        .map_err(|err| format!("Encode train event failed: {err}"))?;
    let id = queue::send(store.conn(), &config.queue.name, &body)
        .map_err(|err| format!("Enqueue failed: {err}"))?;
    println!("Queued message {id} on {}.", config.queue.name);
    Ok(())
}

struct Options {
    config_path: Option<PathBuf>,
    model_id: String,
    user_id: String,
}

fn parse_args(args: Vec<String>) -> Result<Option<Options>, String> {
    let mut config_path = None;
    let mut model_id = None;
    let mut user_id = None;
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => {
                println!("{}", help_text());
                return Ok(None);
            }
            "--config" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--config requires a value".to_string())?;
                config_path = Some(PathBuf::from(value));
            }
            "--model" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--model requires a value".to_string())?;
                model_id = Some(value.to_string());
            }
            "--user" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--user requires a value".to_string())?;
                user_id = Some(value.to_string());
            }
            unknown => {
                return Err(format!("Unknown argument: {unknown}\n\n{}", help_text()));
            }
        }
        idx += 1;
    }
    Ok(Some(Options {
        config_path,
        model_id: model_id.ok_or_else(|| format!("--model is required\n\n{}", help_text()))?,
        user_id: user_id.ok_or_else(|| format!("--user is required\n\n{}", help_text()))?,
    }))
}

fn help_text() -> &'static str {
    "emld-enqueue\n\n\
Publish a train event for a model.\n\n\
Usage:\n\
  emld-enqueue --model <id> --user <id> [--config <path>]\n"
}
