//! Document Index
//!
//! One document's chunked, embedded representation. A persisted index is
//! always opened in preference to a rebuild; `build` only runs behind
//! `ensure_built`, which holds the per-name build lock and re-checks storage
//! first.

mod chunker;
mod similarity;
mod store;

pub use chunker::{chunk_pages, split_text, ChunkSettings, TextChunk};
pub use similarity::{cosine, top_k};
pub use store::{IndexHandle, IndexManifest, Passage, SledVectorStore, StoredChunk, VectorStore};

use crate::concurrency::BuildLockManager;
use crate::document::{Document, TextExtractor};
use crate::error::{IndexError, ProviderError, StorageError};
use crate::provider::{with_retry, EmbeddingClient, RetryPolicy};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Tunables for building and querying indexes.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSettings {
    pub chunking: ChunkSettings,
    /// Passages returned per retrieval
    pub top_k: usize,
    /// Texts sent per embedding request
    pub embedding_batch_size: usize,
    pub retry: RetryPolicy,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            chunking: ChunkSettings::default(),
            top_k: 3,
            embedding_batch_size: 64,
            retry: RetryPolicy::default(),
        }
    }
}

/// What `ensure_built` had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BuildOutcome {
    /// A persisted index already existed and was opened
    Loaded,
    /// The document was extracted, embedded and persisted
    Built { chunks: usize },
}

/// Collaborators shared by every document index.
pub struct IndexServices {
    pub store: Arc<dyn VectorStore>,
    pub embedder: Arc<dyn EmbeddingClient>,
    pub extractor: Arc<dyn TextExtractor>,
    pub settings: IndexSettings,
    locks: BuildLockManager,
}

impl IndexServices {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingClient>,
        extractor: Arc<dyn TextExtractor>,
        settings: IndexSettings,
    ) -> Self {
        Self {
            store,
            embedder,
            extractor,
            settings,
            locks: BuildLockManager::new(),
        }
    }
}

/// The index of one document, opened lazily.
pub struct DocumentIndex {
    document: Document,
    /// Storage key; the derived name unless restored from a differently keyed index
    key: String,
    services: Arc<IndexServices>,
    handle: RwLock<Option<Arc<IndexHandle>>>,
}

impl DocumentIndex {
    pub fn new(document: Document, services: Arc<IndexServices>) -> Self {
        Self {
            key: document.name.clone(),
            document,
            services,
            handle: RwLock::new(None),
        }
    }

    /// Bind to a persisted index stored under `key`.
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.document.name
    }

    pub fn storage_key(&self) -> &str {
        &self.key
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn settings(&self) -> &IndexSettings {
        &self.services.settings
    }

    /// The in-memory handle, if one is open.
    pub fn handle(&self) -> Option<Arc<IndexHandle>> {
        self.handle.read().clone()
    }

    /// Whether an in-memory handle is open.
    pub fn is_open(&self) -> bool {
        self.handle.read().is_some()
    }

    /// Whether a persisted index exists for this document's name.
    /// Where the persisted index lives, for status output.
    pub fn location(&self) -> String {
        self.services.store.location(&self.key)
    }

    pub fn has_persisted(&self) -> Result<bool, StorageError> {
        self.services.store.exists(&self.key)
    }

    /// Open the persisted index without recomputation, caching the handle.
    pub fn load_if_exists(&self) -> Result<Option<Arc<IndexHandle>>, IndexError> {
        if let Some(handle) = self.handle() {
            return Ok(Some(handle));
        }
        let Some(handle) = self.services.store.open(&self.key)? else {
            return Ok(None);
        };
        let handle = Arc::new(handle);
        *self.handle.write() = Some(handle.clone());
        info!(
            index = %self.document.name,
            chunks = handle.len(),
            "Loaded persisted index"
        );
        Ok(Some(handle))
    }

    /// Load the persisted index, or build it if none exists.
    ///
    /// At most one build per name runs at a time; a caller that waited on the
    /// lock finds the index persisted by the first and loads it instead.
    pub async fn ensure_built(&self) -> Result<BuildOutcome, IndexError> {
        if self.load_if_exists()?.is_some() {
            return Ok(BuildOutcome::Loaded);
        }

        let lock = self.services.locks.get_lock(&self.key);
        let _guard = lock.lock().await;

        if self.load_if_exists()?.is_some() {
            return Ok(BuildOutcome::Loaded);
        }
        let handle = self.build().await?;
        Ok(BuildOutcome::Built {
            chunks: handle.len(),
        })
    }

    /// Extract, chunk, embed and persist the document.
    ///
    /// Replaces any persisted index under the same name. Callers outside this
    /// module go through [`DocumentIndex::ensure_built`].
    pub async fn build(&self) -> Result<Arc<IndexHandle>, IndexError> {
        let name = self.document.name.clone();
        let settings = &self.services.settings;
        info!(index = %name, path = %self.document.path.display(), "Building index");

        let extractor = self.services.extractor.clone();
        let path = self.document.path.clone();
        let pages = tokio::task::spawn_blocking(move || extractor.extract_pages(&path))
            .await
            .map_err(|e| IndexError::Task(e.to_string()))??;

        let chunks = chunk_pages(&pages, settings.chunking);
        if chunks.is_empty() {
            return Err(IndexError::EmptyDocument { name });
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embed_all(&texts).await?;

        let mut hasher = blake3::Hasher::new();
        for page in &pages {
            hasher.update(page.as_bytes());
            hasher.update(b"\x0c");
        }

        let stored: Vec<StoredChunk> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| StoredChunk {
                ordinal: chunk.ordinal,
                page: chunk.page,
                text: chunk.text,
                vector,
            })
            .collect();

        let manifest = IndexManifest {
            name: self.key.clone(),
            source_path: self.document.path.display().to_string(),
            source_hash: hasher.finalize().to_hex().to_string(),
            chunk_count: stored.len() as u32,
            dimensions: stored.first().map(|c| c.vector.len() as u32).unwrap_or(0),
            embedding_model: self.services.embedder.model().to_string(),
            chunk_size: settings.chunking.chunk_size as u32,
            chunk_overlap: settings.chunking.chunk_overlap as u32,
            created_at: chrono::Utc::now().to_rfc3339(),
        };

        let store = self.services.store.clone();
        let handle = tokio::task::spawn_blocking(move || {
            store.persist(&manifest, &stored)?;
            Ok::<_, StorageError>(IndexHandle::new(manifest, stored))
        })
        .await
        .map_err(|e| IndexError::Task(e.to_string()))??;

        let handle = Arc::new(handle);
        *self.handle.write() = Some(handle.clone());
        info!(index = %name, chunks = handle.len(), "Index built");
        Ok(handle)
    }

    async fn embed_all(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        let embedder: &dyn EmbeddingClient = self.services.embedder.as_ref();
        let batch_size = self.services.settings.embedding_batch_size.max(1);
        let mut vectors = Vec::with_capacity(texts.len());

        for batch in texts.chunks(batch_size) {
            let embedded = with_retry(self.services.settings.retry, "embed", move || {
                embedder.embed(batch)
            })
            .await?;
            if embedded.len() != batch.len() {
                return Err(ProviderError::InvalidResponse(format!(
                    "expected {} embeddings, got {}",
                    batch.len(),
                    embedded.len()
                )));
            }
            vectors.extend(embedded);
        }
        Ok(vectors)
    }

    /// The `k` passages nearest to `query`, best first.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Passage>, IndexError> {
        let handle = self.handle().ok_or_else(|| IndexError::NotInitialized {
            name: self.document.name.clone(),
        })?;
        let query_vector = self.services.embedder.embed_query(query).await?;
        let passages = handle.search(&query_vector, k);
        debug!(
            index = %self.document.name,
            k,
            returned = passages.len(),
            best = passages.first().map(|p| p.score),
            "Retrieved passages"
        );
        Ok(passages)
    }
}
