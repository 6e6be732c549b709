//! StorageConfig and index path resolution.

use super::xdg;
use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Storage configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Index database directory (relative to workspace root unless absolute).
    /// Defaults to the workspace's XDG data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_path: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolve the index database directory.
    pub fn resolve_index_path(&self, workspace_root: &Path) -> Result<PathBuf, ApiError> {
        match &self.index_path {
            Some(path) if path.is_absolute() => Ok(path.clone()),
            Some(path) => Ok(workspace_root.join(path)),
            None => Ok(xdg::workspace_data_dir(workspace_root)?.join("indexes")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_paths_are_used() {
        let relative = StorageConfig {
            index_path: Some(PathBuf::from("vector_stores")),
        };
        assert_eq!(
            relative.resolve_index_path(Path::new("/ws")).unwrap(),
            PathBuf::from("/ws/vector_stores")
        );
        let absolute = StorageConfig {
            index_path: Some(PathBuf::from("/var/lib/docdesk")),
        };
        assert_eq!(
            absolute.resolve_index_path(Path::new("/ws")).unwrap(),
            PathBuf::from("/var/lib/docdesk")
        );
    }
}
