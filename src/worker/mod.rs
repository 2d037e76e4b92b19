//! Fixed-size pool of threads that consume train events from the queue.
//!
//! Each worker owns its own store connection and processes one message at a
//! time; concurrency only exists across messages.

mod consume;
mod wakeup;

use std::path::{Path, PathBuf};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread::{self, JoinHandle, sleep};
use std::time::Duration;

use tracing::{debug, error, info, warn};

pub use consume::{ConsumeOutcome, consume_one};

use crate::config::QueueSettings;
use crate::pipeline::Pipeline;
use crate::queue;
use crate::store::{Store, StoreError};
use wakeup::QueueWakeup;

const OPEN_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Long-lived worker pool bound to one queue.
pub struct TrainWorkerPool {
    pipeline: Arc<Pipeline>,
    queue: QueueSettings,
    db_path: PathBuf,
    shutdown: Arc<AtomicBool>,
    wakeup: Arc<QueueWakeup>,
    threads: Vec<JoinHandle<()>>,
}

impl TrainWorkerPool {
    pub fn new(pipeline: Arc<Pipeline>, queue: QueueSettings, db_path: PathBuf) -> Self {
        Self {
            pipeline,
            queue,
            db_path,
            shutdown: Arc::new(AtomicBool::new(false)),
            wakeup: Arc::new(QueueWakeup::new()),
            threads: Vec::new(),
        }
    }

    /// Spawn `concurrency` workers. Calling again while running is a no-op.
    pub fn start(&mut self) {
        if !self.threads.is_empty() {
            return;
        }
        self.shutdown.store(false, Ordering::Relaxed);
        let worker_count = self.queue.concurrency.max(1);
        info!(
            "Train workers starting: count={}, queue={}, visibility={}s",
            worker_count, self.queue.name, self.queue.visibility_timeout_secs
        );
        for worker_index in 0..worker_count {
            let context = WorkerContext {
                pipeline: Arc::clone(&self.pipeline),
                queue: self.queue.clone(),
                db_path: self.db_path.clone(),
                shutdown: Arc::clone(&self.shutdown),
                wakeup: Arc::clone(&self.wakeup),
            };
            let spawned = thread::Builder::new()
                .name(format!("train-worker-{worker_index}"))
                .spawn(move || context.run());
            match spawned {
                Ok(handle) => self.threads.push(handle),
                Err(err) => error!("Failed to spawn train worker {worker_index}: {err}"),
            }
        }
    }

    /// Number of running worker threads.
    pub fn worker_count(&self) -> usize {
        self.threads.len()
    }

    /// Wake idle workers so they poll the queue immediately.
    pub fn notify(&self) {
        self.wakeup.notify();
    }

    /// Block until every worker exits.
    pub fn join(&mut self) {
        for handle in self.threads.drain(..) {
            if handle.join().is_err() {
                warn!("Train worker exited with a panic");
            }
        }
    }

    /// Ask workers to stop after their current message and wait for them.
    pub fn shutdown(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        self.wakeup.notify();
        self.join();
    }
}

impl Drop for TrainWorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct WorkerContext {
    pipeline: Arc<Pipeline>,
    queue: QueueSettings,
    db_path: PathBuf,
    shutdown: Arc<AtomicBool>,
    wakeup: Arc<QueueWakeup>,
}

impl WorkerContext {
    fn run(self) {
        let mut seen = 0u64;
        let mut store: Option<Store> = None;
        while !self.shutdown.load(Ordering::Relaxed) {
            if store.is_none() {
                match open_store_with_retry(&self.db_path) {
                    Ok(opened) => store = Some(opened),
                    Err(err) => {
                        error!("Train worker could not open store: {err}");
                        self.wakeup.wait_for(&mut seen, self.queue.idle_poll());
                        continue;
                    }
                }
            }
            let Some(current) = store.as_mut() else {
                continue;
            };
            if !self.poll_once(current) {
                self.wakeup.wait_for(&mut seen, self.queue.idle_poll());
            }
        }
        debug!("Train worker stopped");
    }

    /// Receive and settle at most one message. Returns `false` when idle.
    fn poll_once(&self, store: &mut Store) -> bool {
        match queue::dead_letter_exhausted(
            store.conn(),
            &self.queue.name,
            self.queue.max_receive_count,
        ) {
            Ok(0) => {}
            Ok(parked) => {
                warn!(queue = %self.queue.name, parked, "Dead-lettered exhausted messages")
            }
            Err(err) => warn!("Dead-letter sweep failed: {err}"),
        }

        let message = match queue::receive(
            store.conn_mut(),
            &self.queue.name,
            self.queue.visibility_timeout(),
        ) {
            Ok(Some(message)) => message,
            Ok(None) => return false,
            Err(err) => {
                warn!("Queue receive failed: {err}");
                return false;
            }
        };
        debug!(
            message = message.id,
            receive_count = message.receive_count,
            "Received train event"
        );
        if let Err(err) = consume_one(
            store.conn(),
            &self.pipeline,
            &message,
            self.queue.retry_delay(),
        ) {
            error!(message = message.id, "Failed to settle queue message: {err}");
        }
        true
    }
}

fn open_store_with_retry(path: &Path) -> Result<Store, StoreError> {
    match Store::open(path) {
        Ok(store) => Ok(store),
        Err(_) => {
            sleep(OPEN_RETRY_DELAY);
            Store::open(path)
        }
    }
}
