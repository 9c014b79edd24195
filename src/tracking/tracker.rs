//! Experiment tracker implementation

use super::storage::{LocalStorage, StorageBackend};
use crate::error::{Result, WineError};
use crate::inference::{ModelArtifact, ARTIFACT_FILE_NAME};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{info, warn};
use uuid::Uuid;

/// Status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Finished,
    Failed,
}

/// A named group of runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experiment {
    pub experiment_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Experiment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            experiment_id: Uuid::new_v4().simple().to_string(),
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}

/// One recorded unit of training work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub run_id: String,
    pub run_name: String,
    pub experiment_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: RunStatus,
    pub params: BTreeMap<String, String>,
    pub metrics: BTreeMap<String, f64>,
    /// Artifact paths relative to the run's artifact directory
    pub artifacts: Vec<String>,
}

impl Run {
    pub fn new(experiment: &Experiment, run_name: Option<String>) -> Self {
        let run_id = Uuid::new_v4().simple().to_string();
        let run_name = run_name.unwrap_or_else(|| format!("run-{}", &run_id[..8]));
        Self {
            run_id,
            run_name,
            experiment_id: experiment.experiment_id.clone(),
            start_time: Utc::now(),
            end_time: None,
            status: RunStatus::Running,
            params: BTreeMap::new(),
            metrics: BTreeMap::new(),
            artifacts: Vec::new(),
        }
    }

    /// Elapsed wall time, up to now for an active run
    pub fn duration_secs(&self) -> f64 {
        let end = self.end_time.unwrap_or_else(Utc::now);
        (end - self.start_time).num_milliseconds() as f64 / 1000.0
    }
}

/// Tracks runs of a single experiment.
///
/// At most one run is active at a time. Parameters and metrics are buffered
/// on the active run and persisted when it ends; artifacts are written
/// immediately.
pub struct ExperimentTracker {
    storage: Box<dyn StorageBackend>,
    experiment: Experiment,
    current_run: RwLock<Option<Run>>,
}

impl ExperimentTracker {
    /// Open (or create) the named experiment in a local directory store
    pub fn local(root: impl Into<PathBuf>, experiment: &str) -> Result<Self> {
        Self::new(Box::new(LocalStorage::new(root)), experiment)
    }

    /// Open (or create) the named experiment in the given backend
    pub fn new(storage: Box<dyn StorageBackend>, experiment: &str) -> Result<Self> {
        let experiment = match storage.load_experiment(experiment)? {
            Some(existing) => existing,
            None => {
                let created = Experiment::new(experiment);
                storage.save_experiment(&created)?;
                info!(experiment = %created.name, id = %created.experiment_id, "Created experiment");
                created
            }
        };

        Ok(Self {
            storage,
            experiment,
            current_run: RwLock::new(None),
        })
    }

    pub fn experiment(&self) -> &Experiment {
        &self.experiment
    }

    /// Start a new run and return its id
    pub fn start_run(&self, run_name: Option<&str>) -> Result<String> {
        let mut current = self.current_run.write();
        if let Some(active) = current.as_ref() {
            return Err(WineError::TrackingError(format!(
                "Run {} is already active",
                active.run_id
            )));
        }

        let run = Run::new(&self.experiment, run_name.map(str::to_string));
        self.storage.save_run(&self.experiment.name, &run)?;
        let run_id = run.run_id.clone();
        info!(experiment = %self.experiment.name, run_id = %run_id, "Started run");
        *current = Some(run);
        Ok(run_id)
    }

    pub fn log_param(&self, key: impl Into<String>, value: impl ToString) -> Result<()> {
        self.with_run(|run| {
            run.params.insert(key.into(), value.to_string());
        })
    }

    pub fn log_params<K, V>(&self, params: impl IntoIterator<Item = (K, V)>) -> Result<()>
    where
        K: Into<String>,
        V: ToString,
    {
        self.with_run(|run| {
            run.params
                .extend(params.into_iter().map(|(k, v)| (k.into(), v.to_string())));
        })
    }

    /// Record a metric; a repeated name keeps the latest value
    pub fn log_metric(&self, name: impl Into<String>, value: f64) -> Result<()> {
        self.with_run(|run| {
            run.metrics.insert(name.into(), value);
        })
    }

    pub fn log_metrics<K: Into<String>>(&self, metrics: impl IntoIterator<Item = (K, f64)>) -> Result<()> {
        self.with_run(|run| {
            run.metrics
                .extend(metrics.into_iter().map(|(k, v)| (k.into(), v)));
        })
    }

    /// Write a model artifact under `artifacts/<artifact_path>/model.json`
    pub fn log_model(&self, artifact_path: &str, artifact: &ModelArtifact) -> Result<PathBuf> {
        let json = serde_json::to_string_pretty(artifact)?;
        let mut current = self.current_run.write();
        let run = current.as_mut().ok_or(WineError::NoActiveRun)?;

        let path = self.storage.save_artifact(
            &self.experiment.name,
            &run.run_id,
            artifact_path,
            ARTIFACT_FILE_NAME,
            &json,
        )?;
        run.artifacts.push(format!("{}/{}", artifact_path, ARTIFACT_FILE_NAME));
        info!(run_id = %run.run_id, path = %path.display(), "Logged model artifact");
        Ok(path)
    }

    /// End the active run and persist it
    pub fn end_run(&self, status: RunStatus) -> Result<Run> {
        let mut run = self.current_run.write().take().ok_or(WineError::NoActiveRun)?;
        run.end_time = Some(Utc::now());
        run.status = status;
        self.storage.save_run(&self.experiment.name, &run)?;

        match status {
            RunStatus::Failed => warn!(run_id = %run.run_id, "Run failed"),
            _ => info!(
                run_id = %run.run_id,
                status = ?status,
                duration_secs = run.duration_secs(),
                "Ended run"
            ),
        }
        Ok(run)
    }

    /// Run `f` inside a fresh run, ending it as finished or failed.
    ///
    /// Metrics and artifacts logged by `f` are dropped when it fails so a
    /// failed run never carries partial results. The error from `f` is
    /// returned even if recording the failure also fails.
    pub fn run<T>(&self, run_name: Option<&str>, f: impl FnOnce(&Self) -> Result<T>) -> Result<(Run, T)> {
        self.start_run(run_name)?;
        match f(self) {
            Ok(value) => Ok((self.end_run(RunStatus::Finished)?, value)),
            Err(err) => {
                if let Err(cleanup) = self.fail_run() {
                    warn!(error = %cleanup, "Could not record failed run");
                }
                Err(err)
            }
        }
    }

    fn fail_run(&self) -> Result<Run> {
        let (run_id, had_artifacts) = {
            let mut current = self.current_run.write();
            let run = current.as_mut().ok_or(WineError::NoActiveRun)?;
            run.metrics.clear();
            let had_artifacts = !run.artifacts.is_empty();
            run.artifacts.clear();
            (run.run_id.clone(), had_artifacts)
        };

        let removed = if had_artifacts {
            self.storage.remove_artifacts(&self.experiment.name, &run_id)
        } else {
            Ok(())
        };
        let run = self.end_run(RunStatus::Failed)?;
        removed.map(|_| run)
    }

    /// Snapshot of the active run
    pub fn active_run(&self) -> Option<Run> {
        self.current_run.read().clone()
    }

    /// Every persisted run of this experiment, oldest first
    pub fn list_runs(&self) -> Result<Vec<Run>> {
        self.storage.load_runs(&self.experiment.name)
    }

    /// Best finished run by a metric
    pub fn best_run(&self, metric: &str, maximize: bool) -> Result<Option<Run>> {
        let runs = self.list_runs()?;
        Ok(runs
            .into_iter()
            .filter(|r| r.status == RunStatus::Finished)
            .filter_map(|r| {
                let v = r.metrics.get(metric).copied()?;
                (!v.is_nan()).then_some((v, r))
            })
            .fold(None, |best: Option<(f64, Run)>, (v, r)| match best {
                Some((bv, _)) if (maximize && bv >= v) || (!maximize && bv <= v) => best,
                _ => Some((v, r)),
            })
            .map(|(_, r)| r))
    }

    fn with_run(&self, f: impl FnOnce(&mut Run)) -> Result<()> {
        let mut current = self.current_run.write();
        let run = current.as_mut().ok_or(WineError::NoActiveRun)?;
        f(run);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_basic() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = ExperimentTracker::local(dir.path(), "test_experiment").unwrap();

        let run_id = tracker.start_run(Some("run_1")).unwrap();
        tracker.log_param("alpha", 0.1).unwrap();
        tracker.log_metric("mse", 0.5).unwrap();
        tracker.log_metric("mse", 0.4).unwrap();
        let run = tracker.end_run(RunStatus::Finished).unwrap();

        assert_eq!(run.run_id, run_id);
        assert_eq!(run.params["alpha"], "0.1");
        assert_eq!(run.metrics["mse"], 0.4);
        assert!(run.end_time.is_some());
        assert_eq!(tracker.list_runs().unwrap(), vec![run]);
    }

    #[test]
    fn test_logging_without_run_fails() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = ExperimentTracker::local(dir.path(), "exp").unwrap();
        assert!(matches!(tracker.log_metric("mse", 1.0), Err(WineError::NoActiveRun)));
        assert!(matches!(tracker.end_run(RunStatus::Finished), Err(WineError::NoActiveRun)));
    }

    #[test]
    fn test_single_active_run() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = ExperimentTracker::local(dir.path(), "exp").unwrap();
        tracker.start_run(None).unwrap();
        assert!(tracker.start_run(None).is_err());
    }

    #[test]
    fn test_failed_run_drops_metrics() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = ExperimentTracker::local(dir.path(), "exp").unwrap();

        let result: Result<(Run, ())> = tracker.run(None, |t| {
            t.log_param("solver", "sag")?;
            t.log_metric("mse", 1.0)?;
            Err(WineError::TrainingError("boom".to_string()))
        });
        assert!(result.is_err());

        let runs = tracker.list_runs().unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].status, RunStatus::Failed);
        assert!(runs[0].metrics.is_empty());
        assert!(tracker.active_run().is_none());
    }

    #[test]
    fn test_failed_run_drops_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = ExperimentTracker::local(dir.path(), "exp").unwrap();
        let artifact = ModelArtifact::new(
            vec!["a".to_string()],
            crate::training::LinearRegression::new(),
        );

        let mut written = PathBuf::new();
        let result: Result<(Run, ())> = tracker.run(None, |t| {
            written = t.log_model("best_model", &artifact)?;
            Err(WineError::TrainingError("late failure".to_string()))
        });

        assert!(matches!(result, Err(WineError::TrainingError(msg)) if msg == "late failure"));
        assert!(!written.as_os_str().is_empty());
        assert!(!written.exists());
        let runs = tracker.list_runs().unwrap();
        assert_eq!(runs[0].status, RunStatus::Failed);
        assert!(runs[0].artifacts.is_empty());
    }

    /// Accepts runs and experiments but refuses to store anything else
    struct FlakyStorage(LocalStorage);

    impl StorageBackend for FlakyStorage {
        fn save_experiment(&self, experiment: &Experiment) -> Result<()> {
            self.0.save_experiment(experiment)
        }

        fn load_experiment(&self, name: &str) -> Result<Option<Experiment>> {
            self.0.load_experiment(name)
        }

        fn save_run(&self, experiment: &str, run: &Run) -> Result<()> {
            if run.status == RunStatus::Failed {
                return Err(WineError::TrackingError("disk full".to_string()));
            }
            self.0.save_run(experiment, run)
        }

        fn load_runs(&self, experiment: &str) -> Result<Vec<Run>> {
            self.0.load_runs(experiment)
        }

        fn save_artifact(
            &self,
            experiment: &str,
            run_id: &str,
            artifact_path: &str,
            file_name: &str,
            contents: &str,
        ) -> Result<PathBuf> {
            self.0
                .save_artifact(experiment, run_id, artifact_path, file_name, contents)
        }

        fn remove_artifacts(&self, experiment: &str, run_id: &str) -> Result<()> {
            self.0.remove_artifacts(experiment, run_id)
        }
    }

    #[test]
    fn test_failed_run_keeps_original_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FlakyStorage(LocalStorage::new(dir.path()));
        let tracker = ExperimentTracker::new(Box::new(storage), "exp").unwrap();

        let result: Result<(Run, ())> =
            tracker.run(None, |_| Err(WineError::TrainingError("solver diverged".to_string())));

        assert!(matches!(result, Err(WineError::TrainingError(msg)) if msg == "solver diverged"));
        assert!(tracker.active_run().is_none());
    }

    #[test]
    fn test_experiment_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let first = ExperimentTracker::local(dir.path(), "exp").unwrap();
        let second = ExperimentTracker::local(dir.path(), "exp").unwrap();
        assert_eq!(first.experiment(), second.experiment());
    }

    #[test]
    fn test_best_run() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = ExperimentTracker::local(dir.path(), "exp").unwrap();

        for mse in [0.8, 0.3, 0.5] {
            tracker
                .run(None, |t| t.log_metric("mse", mse))
                .unwrap();
        }

        let best = tracker.best_run("mse", false).unwrap().unwrap();
        assert_eq!(best.metrics["mse"], 0.3);
        let worst = tracker.best_run("mse", true).unwrap().unwrap();
        assert_eq!(worst.metrics["mse"], 0.8);
        assert!(tracker.best_run("r2", true).unwrap().is_none());
    }
}
