//! Config sources: global file, workspace file, environment.

use super::xdg;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment, File, FileFormat};
use std::path::Path;

/// Environment variable prefix; nested keys use `DOCDESK__SECTION__KEY`.
pub const ENV_PREFIX: &str = "DOCDESK";
pub const ENV_SEPARATOR: &str = "__";

/// Workspace config file name, at the workspace root.
pub const WORKSPACE_CONFIG_FILE: &str = "docdesk.toml";

/// Add `$XDG_CONFIG_HOME/docdesk/config.toml` if it exists.
pub fn add_global_file(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    match xdg::global_config_path() {
        Ok(path) => Ok(builder.add_source(
            File::from(path)
                .format(FileFormat::Toml)
                .required(false),
        )),
        // No HOME: nothing to load from.
        Err(_) => Ok(builder),
    }
}

/// Add `<workspace>/docdesk.toml` if it exists.
pub fn add_workspace_file(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(
        File::from(workspace_root.join(WORKSPACE_CONFIG_FILE))
            .format(FileFormat::Toml)
            .required(false),
    ))
}

/// Add environment variable overlay to builder.
pub fn add_environment(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    ))
}
