//! Entry point for the training service.

use std::path::PathBuf;
use std::sync::Arc;

use emld_trainer::config::{self, ServiceConfig};
use emld_trainer::logging;
use emld_trainer::pipeline::Pipeline;
use emld_trainer::queue;
use emld_trainer::store::Store;
use emld_trainer::worker::TrainWorkerPool;

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
    let config = load_config(&options)?;

    if let Err(err) = logging::init(&config.logging) {
        eprintln!("Logging disabled: {err}");
    }

    let db_path = config
        .store
        .resolved_db_path()
        .map_err(|err| err.to_string())?;
    let store = Store::open(&db_path)
        .map_err(|err| format!("Open store {} failed: {err}", db_path.display()))?;
    let depth = queue::depth(store.conn(), &config.queue.name).map_err(|err| err.to_string())?;
    tracing::info!(
        db = %db_path.display(),
        queue = %config.queue.name,
        pending = depth.pending,
        dead = depth.dead,
        "Store ready"
    );
    drop(store);

    let pipeline = Pipeline::from_config(&config).map_err(|err| err.to_string())?;
    let mut pool = TrainWorkerPool::new(Arc::new(pipeline), config.queue.clone(), db_path);
    pool.start();
    if pool.worker_count() == 0 {
        return Err("No train workers could be started".to_string());
    }
    pool.join();
    Ok(())
}

fn load_config(options: &Options) -> Result<ServiceConfig, String> {
    let mut config = match &options.config_path {
        Some(path) => config::load_from(path),
        None => config::load_or_default(),
    }
    .map_err(|err| err.to_string())?;
    if let Some(workers) = options.workers {
        config.queue.concurrency = workers;
        config = config.normalized();
    }
    Ok(config)
}

#[derive(Default)]
struct Options {
    config_path: Option<PathBuf>,
    workers: Option<u32>,
}

fn parse_args(args: Vec<String>) -> Result<Option<Options>, String> {
    let mut options = Options::default();
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
                options.config_path = Some(PathBuf::from(value));
            }
            "--workers" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--workers requires a value".to_string())?;
                let workers = value
                    .parse::<u32>()
                    .map_err(|_| format!("Invalid --workers value: {value}"))?;
                options.workers = Some(workers);
            }
            unknown => {
                return Err(format!("Unknown argument: {unknown}\n\n{}", help_text()));
            }
        }
        idx += 1;
    }
    Ok(Some(options))
}

fn help_text() -> &'static str {
    "emld-trainer\n\n\
Consume train events and run training jobs.\n\n\
Usage:\n\
  emld-trainer [--config <path>] [--workers <n>]\n\n\
Options:\n\
  --config <path>   Config file (default: <app dir>/config.toml).\n\
  --workers <n>     Override [queue].concurrency.\n"
}
