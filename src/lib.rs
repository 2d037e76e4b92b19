//! Training-job orchestration: consumes train events from a queue, versions
//! the source dataset, writes training manifests, drives the training backend
//! and records the outcome on the model.

/// Application directory helpers.
pub mod app_dirs;
/// Object storage for manifests.
pub mod blob;
/// Service configuration.
pub mod config;
/// Domain types shared by the store and the pipeline.
pub mod domain;
/// Tracing setup.
pub mod logging;
/// Run outcome notifications.
pub mod notify;
/// The training pipeline and its state machine.
pub mod pipeline;
/// SQLite-backed message queue.
pub mod queue;
/// SQLite document store.
pub mod store;
/// Training backend interface and local implementation.
pub mod trainer;
/// Queue consumer pool.
pub mod worker;
