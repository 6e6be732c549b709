//! ConfigLoader facade delegating to merge service.

use super::merge::MergeService;
use super::DocdeskConfig;
use crate::error::ApiError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from files and environment.
    pub fn load(workspace_root: &Path) -> Result<DocdeskConfig, ApiError> {
        Ok(MergeService::load(workspace_root)?)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<DocdeskConfig, ApiError> {
        Ok(MergeService::load_from_file(path)?)
    }

    /// Explicit file when given, otherwise the layered sources.
    pub fn load_for(workspace_root: &Path, explicit: Option<&Path>) -> Result<DocdeskConfig, ApiError> {
        match explicit {
            Some(path) => Self::load_from_file(path),
            None => Self::load(workspace_root),
        }
    }
}
