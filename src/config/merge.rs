//! MergeService: orchestrates sources and deserializes to DocdeskConfig.

use super::sources::{add_environment, add_global_file, add_workspace_file};
use super::DocdeskConfig;
use config::{Config, ConfigError, File, FileFormat};
use std::path::Path;

/// Merge service for config composition.
pub struct MergeService;

impl MergeService {
    /// Load config from workspace and standard sources.
    /// Precedence: defaults (lowest) -> global file -> workspace file -> environment (highest).
    pub fn load(workspace_root: &Path) -> Result<DocdeskConfig, ConfigError> {
        let builder = Config::builder();
        let builder = add_global_file(builder)?;
        let builder = add_workspace_file(builder, workspace_root)?;
        let builder = add_environment(builder)?;

        builder.build()?.try_deserialize()
    }

    /// Load config from a specific file with environment overlay.
    pub fn load_from_file(path: &Path) -> Result<DocdeskConfig, ConfigError> {
        let builder = Config::builder().add_source(File::from(path).format(FileFormat::Toml));
        let builder = add_environment(builder)?;

        builder.build()?.try_deserialize()
    }
}
