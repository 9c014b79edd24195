//! Application state management

use crate::error::Result;
use crate::inference::ModelArtifact;
use std::path::Path;

/// Application state shared across handlers.
///
/// Built once at startup and never mutated, so handlers share it without locks.
#[derive(Debug)]
pub struct AppState {
    pub artifact: ModelArtifact,
}

impl AppState {
    /// Wrap an artifact after checking it against the request contract
    pub fn new(artifact: ModelArtifact) -> Result<Self> {
        artifact.ensure_serving_contract()?;
        Ok(Self { artifact })
    }

    /// Load the artifact from disk and validate it
    pub fn load(model_path: impl AsRef<Path>) -> Result<Self> {
        Self::new(ModelArtifact::load(model_path)?)
    }
}
