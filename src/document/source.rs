//! Document source port and the directory adapter.

use crate::error::StorageError;
use std::path::PathBuf;
use walkdir::WalkDir;

/// One listed source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub file_name: String,
    pub path: PathBuf,
}

/// Lists the source documents available to the registry.
pub trait DocumentSource: Send + Sync {
    fn list_documents(&self) -> Result<Vec<SourceFile>, StorageError>;
}

/// Lists files with accepted extensions directly inside one directory.
pub struct DirectorySource {
    root: PathBuf,
    extensions: Vec<String>,
}

impl DirectorySource {
    pub fn new(root: PathBuf, extensions: Vec<String>) -> Self {
        let extensions = extensions
            .into_iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .collect();
        Self { root, extensions }
    }

    fn accepts(&self, path: &std::path::Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|x| x == &e.to_lowercase()))
            .unwrap_or(false)
    }
}

impl DocumentSource for DirectorySource {
    fn list_documents(&self) -> Result<Vec<SourceFile>, StorageError> {
        if !self.root.exists() {
            tracing::warn!("Documents directory not found: {}", self.root.display());
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!(
                        "Failed to read directory entry in {}: {}",
                        self.root.display(),
                        e
                    );
                    continue;
                }
            };
            if !entry.file_type().is_file() || !self.accepts(entry.path()) {
                continue;
            }
            let file_name = match entry.file_name().to_str() {
                Some(name) => name.to_string(),
                None => {
                    tracing::warn!("Skipping document with non UTF8 name: {:?}", entry.path());
                    continue;
                }
            };
            let path = dunce::canonicalize(entry.path())?;
            files.push(SourceFile { file_name, path });
        }

        files.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        tracing::info!(
            count = files.len(),
            dir = %self.root.display(),
            "Discovered source documents"
        );
        Ok(files)
    }
}
