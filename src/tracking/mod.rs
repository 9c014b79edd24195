//! Experiment tracking
//!
//! Records training runs (parameters, metrics, model artifacts) to a local
//! directory store. Each run is written when it starts and rewritten when it
//! ends, so an aborted job leaves a `running` or `failed` record behind.

mod storage;
mod tracker;

pub use storage::{LocalStorage, StorageBackend};
pub use tracker::{Experiment, ExperimentTracker, Run, RunStatus};
