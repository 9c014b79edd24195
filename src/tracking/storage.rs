//! Storage backends for experiment tracking

use super::tracker::{Experiment, Run};
use crate::error::{Result, WineError};
use std::fs;
use std::path::{Path, PathBuf};

const EXPERIMENT_FILE: &str = "experiment.json";
const RUN_FILE: &str = "run.json";
const ARTIFACT_DIR: &str = "artifacts";

/// Storage backend trait
pub trait StorageBackend: Send + Sync {
    /// Persist experiment metadata
    fn save_experiment(&self, experiment: &Experiment) -> Result<()>;

    /// Look up an experiment by name
    fn load_experiment(&self, name: &str) -> Result<Option<Experiment>>;

    /// Create or overwrite a run record
    fn save_run(&self, experiment: &str, run: &Run) -> Result<()>;

    /// Every stored run of an experiment, oldest first
    fn load_runs(&self, experiment: &str) -> Result<Vec<Run>>;

    /// Store an artifact file and return where it was written
    fn save_artifact(
        &self,
        experiment: &str,
        run_id: &str,
        artifact_path: &str,
        file_name: &str,
        contents: &str,
    ) -> Result<PathBuf>;

    /// Delete every artifact stored for a run
    fn remove_artifacts(&self, experiment: &str, run_id: &str) -> Result<()>;
}

/// Local file system storage backend.
///
/// Layout: `<root>/<experiment>/experiment.json`,
/// `<root>/<experiment>/<run_id>/run.json` and
/// `<root>/<experiment>/<run_id>/artifacts/<artifact_path>/<file_name>`.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_dir: PathBuf,
}

impl LocalStorage {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn experiment_dir(&self, experiment: &str) -> Result<PathBuf> {
        check_component("experiment name", experiment)?;
        Ok(self.base_dir.join(experiment))
    }

    fn run_dir(&self, experiment: &str, run_id: &str) -> Result<PathBuf> {
        check_component("run id", run_id)?;
        Ok(self.experiment_dir(experiment)?.join(run_id))
    }
}

impl StorageBackend for LocalStorage {
    fn save_experiment(&self, experiment: &Experiment) -> Result<()> {
        let dir = self.experiment_dir(&experiment.name)?;
        fs::create_dir_all(&dir)?;
        write_json(&dir.join(EXPERIMENT_FILE), experiment)
    }

    fn load_experiment(&self, name: &str) -> Result<Option<Experiment>> {
        let path = self.experiment_dir(name)?.join(EXPERIMENT_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn save_run(&self, experiment: &str, run: &Run) -> Result<()> {
        let dir = self.run_dir(experiment, &run.run_id)?;
        fs::create_dir_all(&dir)?;
        write_json(&dir.join(RUN_FILE), run)
    }

    fn load_runs(&self, experiment: &str) -> Result<Vec<Run>> {
        let dir = self.experiment_dir(experiment)?;
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut runs = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path().join(RUN_FILE);
            if path.is_file() {
                let json = fs::read_to_string(&path)?;
                runs.push(serde_json::from_str::<Run>(&json)?);
            }
        }
        runs.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.run_id.cmp(&b.run_id)));
        Ok(runs)
    }

    fn save_artifact(
        &self,
        experiment: &str,
        run_id: &str,
        artifact_path: &str,
        file_name: &str,
        contents: &str,
    ) -> Result<PathBuf> {
        check_component("artifact path", artifact_path)?;
        check_component("artifact file name", file_name)?;

        let dir = self
            .run_dir(experiment, run_id)?
            .join(ARTIFACT_DIR)
            .join(artifact_path);
        fs::create_dir_all(&dir)?;
        let path = dir.join(file_name);
        fs::write(&path, contents)?;
        Ok(path)
    }

    fn remove_artifacts(&self, experiment: &str, run_id: &str) -> Result<()> {
        let dir = self.run_dir(experiment, run_id)?.join(ARTIFACT_DIR);
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        Ok(())
    }
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

/// Names become directory names, so they must be a single plain path component
fn check_component(what: &str, value: &str) -> Result<()> {
    let valid = !value.is_empty()
        && value != "."
        && value != ".."
        && !value.contains(['/', '\\'])
        && !value.chars().any(char::is_control);

    if valid {
        Ok(())
    } else {
        Err(WineError::TrackingError(format!("Invalid {}: '{}'", what, value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::RunStatus;

    #[test]
    fn test_experiment_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let exp = Experiment::new("wine");

        storage.save_experiment(&exp).unwrap();
        assert!(dir.path().join("wine").join("experiment.json").exists());
        assert_eq!(storage.load_experiment("wine").unwrap(), Some(exp));
        assert_eq!(storage.load_experiment("other").unwrap(), None);
    }

    #[test]
    fn test_runs_are_listed() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let exp = Experiment::new("wine");
        storage.save_experiment(&exp).unwrap();

        let mut run = Run::new(&exp, None);
        storage.save_run("wine", &run).unwrap();
        run.status = RunStatus::Finished;
        storage.save_run("wine", &run).unwrap();

        let runs = storage.load_runs("wine").unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].status, RunStatus::Finished);
        assert!(storage.load_runs("missing").unwrap().is_empty());
    }

    #[test]
    fn test_artifact_layout() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let path = storage
            .save_artifact("wine", "abc", "best_model", "model.json", "{}")
            .unwrap();
        assert_eq!(
            path,
            dir.path().join("wine/abc/artifacts/best_model/model.json")
        );

        storage.remove_artifacts("wine", "abc").unwrap();
        assert!(!path.exists());
        assert!(!dir.path().join("wine/abc/artifacts").exists());
        storage.remove_artifacts("wine", "abc").unwrap();
    }

    #[test]
    fn test_rejects_path_traversal() {
        let storage = LocalStorage::new("/tmp/unused");
        assert!(storage.load_experiment("../etc").is_err());
        assert!(storage.load_runs("a/b").is_err());
        assert!(check_component("name", "").is_err());
        assert!(check_component("name", "hyperparameter_tuning").is_ok());
    }
}
