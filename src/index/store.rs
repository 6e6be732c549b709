//! Vector index storage port and the sled adapter.
//!
//! Layout: one `manifests` tree keyed by derived name, and one
//! `chunks/<name>` tree per index keyed by big-endian chunk ordinal. The
//! manifest is written after every chunk is flushed, so an index without a
//! manifest does not exist as far as readers are concerned.

use super::similarity::top_k;
use crate::error::StorageError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Summary record for one persisted index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub name: String,
    pub source_path: String,
    /// blake3 of the extracted text, hex encoded
    pub source_hash: String,
    pub chunk_count: u32,
    pub dimensions: u32,
    pub embedding_model: String,
    pub chunk_size: u32,
    pub chunk_overlap: u32,
    /// RFC 3339 UTC timestamp
    pub created_at: String,
}

/// One embedded chunk as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredChunk {
    pub ordinal: u32,
    pub page: u32,
    pub text: String,
    pub vector: Vec<f32>,
}

/// A retrieved chunk with its similarity score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub ordinal: u32,
    pub page: u32,
    pub text: String,
    pub score: f32,
}

/// An opened index, held in memory for search.
#[derive(Debug)]
pub struct IndexHandle {
    manifest: IndexManifest,
    chunks: Vec<StoredChunk>,
}

impl IndexHandle {
    pub fn new(manifest: IndexManifest, chunks: Vec<StoredChunk>) -> Self {
        Self { manifest, chunks }
    }

    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Rank chunks by cosine similarity to `query`, best first.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<Passage> {
        top_k(query, self.chunks.iter().map(|c| c.vector.as_slice()), k)
            .into_iter()
            .map(|(i, score)| {
                let chunk = &self.chunks[i];
                Passage {
                    ordinal: chunk.ordinal,
                    page: chunk.page,
                    text: chunk.text.clone(),
                    score,
                }
            })
            .collect()
    }
}

/// Durable storage for per-document indexes.
pub trait VectorStore: Send + Sync {
    /// Replace any index stored under `manifest.name` with these chunks.
    fn persist(&self, manifest: &IndexManifest, chunks: &[StoredChunk]) -> Result<(), StorageError>;

    /// Open an index without recomputation; `None` when it does not exist.
    fn open(&self, name: &str) -> Result<Option<IndexHandle>, StorageError>;

    fn exists(&self, name: &str) -> Result<bool, StorageError>;

    /// Storage keys of every persisted index.
    fn list(&self) -> Result<Vec<String>, StorageError>;

    /// Human-readable location of an index, for status output.
    fn location(&self, name: &str) -> String;
}

const MANIFESTS_TREE: &str = "manifests";

/// sled-backed vector store.
pub struct SledVectorStore {
    db: sled::Db,
    manifests: sled::Tree,
    path: Option<PathBuf>,
}

impl SledVectorStore {
    /// Open or create the store at `path`.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        std::fs::create_dir_all(path)?;
        let db = sled::open(path)?;
        Self::from_db(db, Some(path.to_path_buf()))
    }

    /// In-memory store removed on drop.
    pub fn temporary() -> Result<Self, StorageError> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db, None)
    }

    fn from_db(db: sled::Db, path: Option<PathBuf>) -> Result<Self, StorageError> {
        let manifests = db.open_tree(MANIFESTS_TREE)?;
        Ok(Self {
            db,
            manifests,
            path,
        })
    }

    fn chunk_tree(&self, name: &str) -> Result<sled::Tree, StorageError> {
        Ok(self.db.open_tree(format!("chunks/{}", name))?)
    }
}

impl VectorStore for SledVectorStore {
    fn persist(&self, manifest: &IndexManifest, chunks: &[StoredChunk]) -> Result<(), StorageError> {
        // Withdraw the old manifest first so a crash mid-write leaves no index behind.
        self.manifests.remove(manifest.name.as_bytes())?;

        let tree = self.chunk_tree(&manifest.name)?;
        tree.clear()?;
        let mut batch = sled::Batch::default();
        for chunk in chunks {
            batch.insert(&chunk.ordinal.to_be_bytes(), bincode::serialize(chunk)?);
        }
        tree.apply_batch(batch)?;
        tree.flush()?;

        self.manifests
            .insert(manifest.name.as_bytes(), bincode::serialize(manifest)?)?;
        self.manifests.flush()?;

        tracing::debug!(
            index = %manifest.name,
            chunks = chunks.len(),
            "Persisted index"
        );
        Ok(())
    }

    fn open(&self, name: &str) -> Result<Option<IndexHandle>, StorageError> {
        let Some(raw) = self.manifests.get(name.as_bytes())? else {
            return Ok(None);
        };
        let manifest: IndexManifest = bincode::deserialize(&raw)?;

        let tree = self.chunk_tree(name)?;
        let mut chunks = Vec::with_capacity(manifest.chunk_count as usize);
        for entry in tree.iter() {
            let (_, value) = entry?;
            chunks.push(bincode::deserialize::<StoredChunk>(&value)?);
        }

        if chunks.len() != manifest.chunk_count as usize {
            return Err(StorageError::Serialization(format!(
                "index '{}' has {} chunks but its manifest records {}",
                name,
                chunks.len(),
                manifest.chunk_count
            )));
        }
        Ok(Some(IndexHandle::new(manifest, chunks)))
    }

    fn exists(&self, name: &str) -> Result<bool, StorageError> {
        Ok(self.manifests.contains_key(name.as_bytes())?)
    }

    fn list(&self) -> Result<Vec<String>, StorageError> {
        let mut names = Vec::new();
        for key in self.manifests.iter().keys() {
            let key = key?;
            match String::from_utf8(key.to_vec()) {
                Ok(name) => names.push(name),
                Err(_) => tracing::warn!("Skipping index with non UTF8 key: {:?}", key),
            }
        }
        Ok(names)
    }

    fn location(&self, name: &str) -> String {
        match &self.path {
            Some(path) => format!("{}#{}", path.display(), name),
            None => format!("memory#{}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(name: &str, chunk_count: u32) -> IndexManifest {
        IndexManifest {
            name: name.to_string(),
            source_path: format!("/docs/{}.pdf", name),
            source_hash: "00".to_string(),
            chunk_count,
            dimensions: 2,
            embedding_model: "test".to_string(),
            chunk_size: 1000,
            chunk_overlap: 200,
            created_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    fn chunk(ordinal: u32, text: &str, vector: [f32; 2]) -> StoredChunk {
        StoredChunk {
            ordinal,
            page: 1,
            text: text.to_string(),
            vector: vector.to_vec(),
        }
    }

    #[test]
    fn missing_index_opens_as_none() {
        let store = SledVectorStore::temporary().unwrap();
        assert!(store.open("Notes").unwrap().is_none());
        assert!(!store.exists("Notes").unwrap());
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn persist_then_open_and_search() {
        let store = SledVectorStore::temporary().unwrap();
        let chunks = vec![
            chunk(0, "north", [0.0, 1.0]),
            chunk(1, "east", [1.0, 0.0]),
            chunk(2, "north-east", [0.7, 0.7]),
        ];
        store.persist(&manifest("Notes", 3), &chunks).unwrap();

        assert!(store.exists("Notes").unwrap());
        assert_eq!(store.list().unwrap(), vec!["Notes".to_string()]);

        let handle = store.open("Notes").unwrap().unwrap();
        assert_eq!(handle.len(), 3);
        let passages = handle.search(&[1.0, 0.0], 2);
        let texts: Vec<_> = passages.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, vec!["east", "north-east"]);
    }

    #[test]
    fn persisting_again_replaces_chunks() {
        let store = SledVectorStore::temporary().unwrap();
        let first = vec![chunk(0, "a", [1.0, 0.0]), chunk(1, "b", [0.0, 1.0])];
        store.persist(&manifest("Notes", 2), &first).unwrap();
        let second = vec![chunk(0, "c", [1.0, 0.0])];
        store.persist(&manifest("Notes", 1), &second).unwrap();

        let handle = store.open("Notes").unwrap().unwrap();
        assert_eq!(handle.len(), 1);
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn reopening_from_disk_keeps_indexes() {
        let temp = tempfile::TempDir::new().unwrap();
        {
            let store = SledVectorStore::open(temp.path()).unwrap();
            store
                .persist(&manifest("Notes", 1), &[chunk(0, "a", [1.0, 0.0])])
                .unwrap();
        }
        let store = SledVectorStore::open(temp.path()).unwrap();
        assert!(store.exists("Notes").unwrap());
        assert!(store.location("Notes").ends_with("#Notes"));
    }
}
