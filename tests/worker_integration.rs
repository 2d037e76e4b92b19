mod support;

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use emld_trainer::config::ServiceConfig;
use emld_trainer::domain::{ModelState, TrainEvent};
use emld_trainer::pipeline::Pipeline;
use emld_trainer::queue;
use emld_trainer::store::{Store, models};
use emld_trainer::worker::TrainWorkerPool;
use support::doubles::fast_trainer_settings;
use support::emld_env::EmldEnvGuard;
use support::fixtures::{MODEL, SeedOptions, USER, seed_project};
use tempfile::tempdir;

fn config(db_path: &Path) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.store.db_path = Some(db_path.to_path_buf());
    config.queue.concurrency = 2;
    config.queue.retry_delay_secs = 0;
    config.queue.max_receive_count = 2;
    config.queue.idle_poll_ms = 10;
    config.trainer = fast_trainer_settings();
    config.retry.backoff_ms = 0;
    config.normalized()
}

fn wait_until(timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if done() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    done()
}

#[test]
fn pool_trains_queued_model_and_discards_garbage() {
    let temp = tempdir().unwrap();
    let _env = EmldEnvGuard::set_config_home(temp.path().join("config"));
    let db_path = temp.path().join("emld.db");
    let config = config(&db_path);
    let store = Store::open(&db_path).unwrap();
    seed_project(store.conn(), &SeedOptions::default());
    let body = TrainEvent::new(MODEL, USER).encode().unwrap();
    queue::send(store.conn(), &config.queue.name, &body).unwrap();
    queue::send(store.conn(), &config.queue.name, "{not json").unwrap();

    let pipeline = Pipeline::from_config(&config).unwrap();
    let mut pool = TrainWorkerPool::new(Arc::new(pipeline), config.queue.clone(), db_path.clone());
    pool.start();
    assert_eq!(pool.worker_count(), 2);
    pool.notify();

    let trained = wait_until(Duration::from_secs(10), || {
        models::view(store.conn(), USER, MODEL).unwrap().state == ModelState::Trained
    });
    assert!(trained, "model never reached TRAINED");
    let drained = wait_until(Duration::from_secs(5), || {
        queue::depth(store.conn(), &config.queue.name).unwrap().pending == 0
    });
    pool.shutdown();
    assert!(drained, "queue still has pending messages");
    assert_eq!(pool.worker_count(), 0);

    let blob_root = temp.path().join("config").join(".emld").join("blobs");
    assert!(
        blob_root
            .join("emld")
            .join(USER)
            .join("models")
            .join(MODEL)
            .join("train.manifest")
            .is_file()
    );
}

#[test]
fn failing_lookups_end_in_dead_letter() {
    let temp = tempdir().unwrap();
    let _env = EmldEnvGuard::set_config_home(temp.path().join("config"));
    let db_path = temp.path().join("emld.db");
    let mut config = config(&db_path);
    config.queue.concurrency = 1;
    let store = Store::open(&db_path).unwrap();
    let body = TrainEvent::new("ghost", USER).encode().unwrap();
    let id = queue::send(store.conn(), &config.queue.name, &body).unwrap();

    let pipeline = Pipeline::from_config(&config).unwrap();
    let mut pool = TrainWorkerPool::new(Arc::new(pipeline), config.queue.clone(), db_path.clone());
    pool.start();

    let parked = wait_until(Duration::from_secs(10), || {
        queue::depth(store.conn(), &config.queue.name).unwrap().dead == 1
    });
    pool.shutdown();
    assert!(parked, "message was never dead-lettered");

    let (receives, last_error): (u32, Option<String>) = store
        .conn()
        .query_row(
            "SELECT receive_count, last_error FROM queue_messages WHERE id = ?1",
            [id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(receives, 2);
    assert!(last_error.unwrap().contains("not found"));
}
