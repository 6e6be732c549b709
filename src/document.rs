//! Source Documents
//!
//! Discovery of source files, the canonical derived-name function that joins
//! documents to persisted indexes, and text extraction.

mod extract;
mod naming;
mod source;

pub use extract::{FileTextExtractor, TextExtractor};
pub use naming::{derive_name, spaced};
pub use source::{DirectorySource, DocumentSource, SourceFile};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A discovered source document. Immutable once discovered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Derived name, the join key with persisted indexes
    pub name: String,
    /// File name as listed by the source
    pub file_name: String,
    /// Absolute path to the source file
    pub path: PathBuf,
}

impl Document {
    /// Build a document from a listed source file, deriving its name from the file stem.
    pub fn from_source(source: SourceFile) -> Self {
        let stem = Path::new(&source.file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&source.file_name)
            .to_string();
        Self {
            name: derive_name(&stem),
            file_name: source.file_name,
            path: source.path,
        }
    }
}
