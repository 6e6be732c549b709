//! Configuration
//!
//! `DocdeskConfig` is assembled by [`ConfigLoader`] from struct defaults, the
//! global config file, the workspace config file and `DOCDESK__*` environment
//! variables, in increasing precedence.

mod facade;
mod merge;
mod sources;
mod storage;
pub mod xdg;

pub use facade::ConfigLoader;
pub use merge::MergeService;
pub use sources::{ENV_PREFIX, ENV_SEPARATOR, WORKSPACE_CONFIG_FILE};
pub use storage::StorageConfig;

use crate::error::ApiError;
use crate::index::{ChunkSettings, IndexSettings};
use crate::logging::LoggingConfig;
use crate::provider::ProviderConfig;
use crate::rules::{default_rules, Rule, RuleEngine};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocdeskConfig {
    pub documents: DocumentsConfig,
    pub storage: StorageConfig,
    pub retrieval: RetrievalConfig,
    pub provider: ProviderConfig,
    pub agent: AgentConfig,
    /// Replacement rule table, in match order; the built-in table when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<Rule>>,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

/// Where source documents live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentsConfig {
    /// Documents directory (relative to workspace root unless absolute)
    pub dir: PathBuf,
    /// File extensions treated as documents, without the dot
    pub extensions: Vec<String>,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("documents"),
            extensions: vec!["pdf".to_string()],
        }
    }
}

impl DocumentsConfig {
    pub fn resolve_dir(&self, workspace_root: &Path) -> PathBuf {
        if self.dir.is_absolute() {
            self.dir.clone()
        } else {
            workspace_root.join(&self.dir)
        }
    }
}

/// Chunking and retrieval tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Characters per chunk
    pub chunk_size: usize,
    /// Characters shared by consecutive chunks
    pub chunk_overlap: usize,
    /// Passages retrieved per question
    pub top_k: usize,
    pub embedding_batch_size: usize,
    /// Documents built at once by `process`
    pub build_concurrency: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 3,
            embedding_batch_size: 64,
            build_concurrency: 2,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// System prompt template file; `{agent_name}` is substituted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt_path: Option<String>,
}

/// HTTP server bind address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

impl DocdeskConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ApiError> {
        let retrieval = &self.retrieval;
        if retrieval.chunk_size == 0 {
            return Err(ApiError::ConfigError(
                "retrieval.chunk_size must be greater than zero".to_string(),
            ));
        }
        if retrieval.chunk_overlap >= retrieval.chunk_size {
            return Err(ApiError::ConfigError(format!(
                "retrieval.chunk_overlap ({}) must be smaller than retrieval.chunk_size ({})",
                retrieval.chunk_overlap, retrieval.chunk_size
            )));
        }
        if retrieval.top_k == 0 {
            return Err(ApiError::ConfigError(
                "retrieval.top_k must be greater than zero".to_string(),
            ));
        }
        if retrieval.embedding_batch_size == 0 || retrieval.build_concurrency == 0 {
            return Err(ApiError::ConfigError(
                "retrieval.embedding_batch_size and retrieval.build_concurrency must be greater than zero"
                    .to_string(),
            ));
        }
        if self.documents.extensions.is_empty() {
            return Err(ApiError::ConfigError(
                "documents.extensions must list at least one extension".to_string(),
            ));
        }
        if let Some(rules) = &self.rules {
            if rules.iter().any(|r| r.phrase.trim().is_empty()) {
                return Err(ApiError::ConfigError(
                    "rules entries must have a non-empty phrase".to_string(),
                ));
            }
        }
        self.provider
            .validate()
            .map_err(|e| ApiError::ConfigError(format!("provider: {}", e)))
    }

    pub fn index_settings(&self) -> IndexSettings {
        IndexSettings {
            chunking: ChunkSettings {
                chunk_size: self.retrieval.chunk_size,
                chunk_overlap: self.retrieval.chunk_overlap,
            },
            top_k: self.retrieval.top_k,
            embedding_batch_size: self.retrieval.embedding_batch_size,
            retry: self.provider.retry_policy(),
        }
    }

    pub fn rule_engine(&self) -> RuleEngine {
        RuleEngine::new(self.rules.clone().unwrap_or_else(default_rules))
    }
}
