//! Chat service facade.
//!
//! The surface transports (CLI, HTTP) talk to. Owns the registry and the
//! router and wires the concrete collaborators from configuration.

use crate::agent::{AgentRegistry, AgentServices, AgentStatus, PromptSource, ReconcileReport};
use crate::config::DocdeskConfig;
use crate::document::{DirectorySource, DocumentSource, FileTextExtractor, TextExtractor};
use crate::error::{ApiError, IndexError};
use crate::index::{BuildOutcome, IndexServices, IndexSettings, SledVectorStore, VectorStore};
use crate::provider::{CompletionClient, CompletionOptions, EmbeddingClient};
use crate::router::Router;
use crate::rules::RuleEngine;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

pub use crate::router::Reply;

/// External collaborators behind their ports.
pub struct Components {
    pub source: Arc<dyn DocumentSource>,
    pub store: Arc<dyn VectorStore>,
    pub extractor: Arc<dyn TextExtractor>,
    pub embedder: Arc<dyn EmbeddingClient>,
    pub llm: Arc<dyn CompletionClient>,
}

/// Behavioural settings for the service.
pub struct ServiceSettings {
    pub index: IndexSettings,
    pub completion: CompletionOptions,
    pub completion_timeout: Duration,
    /// Documents processed at once by `process_all_documents`
    pub build_concurrency: usize,
    pub rules: RuleEngine,
    pub prompts: PromptSource,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            index: IndexSettings::default(),
            completion: CompletionOptions::default(),
            completion_timeout: Duration::from_secs(60),
            build_concurrency: 2,
            rules: RuleEngine::default(),
            prompts: PromptSource::builtin(),
        }
    }
}

/// Result of processing one agent's document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProcessOutcome {
    Loaded,
    Built { chunks: usize },
    Failed { reason: String },
}

impl From<BuildOutcome> for ProcessOutcome {
    fn from(outcome: BuildOutcome) -> Self {
        match outcome {
            BuildOutcome::Loaded => ProcessOutcome::Loaded,
            BuildOutcome::Built { chunks } => ProcessOutcome::Built { chunks },
        }
    }
}

/// Per-agent outcomes of `process_all_documents`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessReport {
    pub outcomes: BTreeMap<String, ProcessOutcome>,
}

impl ProcessReport {
    pub fn failed(&self) -> usize {
        self.outcomes
            .values()
            .filter(|o| matches!(o, ProcessOutcome::Failed { .. }))
            .count()
    }

    pub fn built(&self) -> usize {
        self.outcomes
            .values()
            .filter(|o| matches!(o, ProcessOutcome::Built { .. }))
            .count()
    }
}

pub struct ChatService {
    registry: Arc<AgentRegistry>,
    router: Router,
    build_concurrency: usize,
}

impl ChatService {
    pub fn new(components: Components, settings: ServiceSettings) -> Self {
        let index_services = Arc::new(IndexServices::new(
            components.store,
            components.embedder,
            components.extractor,
            settings.index,
        ));
        let agent_services = Arc::new(AgentServices {
            llm: components.llm,
            options: settings.completion,
            timeout: settings.completion_timeout,
            prompts: settings.prompts,
        });
        let registry = Arc::new(AgentRegistry::new(
            components.source,
            index_services,
            agent_services,
        ));
        Self {
            router: Router::new(settings.rules, registry.clone()),
            registry,
            build_concurrency: settings.build_concurrency.max(1),
        }
    }

    /// Wire the service from validated configuration.
    pub fn from_config(config: &DocdeskConfig, workspace_root: &Path) -> Result<Self, ApiError> {
        config.validate()?;

        let client = Arc::new(config.provider.build_client()?);
        let index_path = config.storage.resolve_index_path(workspace_root)?;
        let store = Arc::new(SledVectorStore::open(&index_path)?);
        let documents_dir = config.documents.resolve_dir(workspace_root);
        info!(
            documents = %documents_dir.display(),
            index = %index_path.display(),
            "Opening chat service"
        );

        let components = Components {
            source: Arc::new(DirectorySource::new(
                documents_dir,
                config.documents.extensions.clone(),
            )),
            store,
            extractor: Arc::new(FileTextExtractor::new()),
            embedder: client.clone(),
            llm: client,
        };
        let settings = ServiceSettings {
            index: config.index_settings(),
            completion: config.provider.default_options.clone(),
            completion_timeout: config.provider.timeout(),
            build_concurrency: config.retrieval.build_concurrency,
            rules: config.rule_engine(),
            prompts: PromptSource::from_config(
                config.agent.system_prompt_path.as_deref(),
                workspace_root,
            )?,
        };
        Ok(Self::new(components, settings))
    }

    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    /// Route a free-text query.
    pub async fn chat(&self, query: &str) -> Result<Reply, ApiError> {
        self.reconciled().await?;
        self.router.route(query, None).await
    }

    /// Ask a named agent. Unknown names fail with `AgentNotFound`.
    pub async fn chat_with_agent(&self, name: &str, query: &str) -> Result<Reply, ApiError> {
        self.reconciled().await?;
        self.router.route(query, Some(name)).await
    }

    /// Reconcile the registry with documents and persisted indexes.
    pub fn create_agents(&self) -> Result<ReconcileReport, ApiError> {
        Ok(self.registry.reconcile()?)
    }

    /// Load or build every agent's index. One failure does not stop the rest.
    pub async fn process_all_documents(&self) -> Result<ProcessReport, ApiError> {
        self.reconciled().await?;
        let agents = self.registry.agents();
        info!(
            agents = agents.len(),
            concurrency = self.build_concurrency,
            "Processing documents"
        );

        let outcomes: Vec<(String, ProcessOutcome)> = stream::iter(agents)
            .map(|agent| async move {
                let name = agent.name().to_string();
                let outcome = match agent.process().await {
                    Ok(outcome) => outcome.into(),
                    Err(e) => {
                        error!(agent = %name, "Failed to process document: {}", e);
                        ProcessOutcome::Failed {
                            reason: e.to_string(),
                        }
                    }
                };
                (name, outcome)
            })
            .buffer_unordered(self.build_concurrency)
            .collect()
            .await;

        Ok(ProcessReport {
            outcomes: outcomes.into_iter().collect(),
        })
    }

    /// Load or build one agent's index.
    pub async fn process_agent(&self, name: &str) -> Result<BuildOutcome, ApiError> {
        self.reconciled().await?;
        let agent = self.registry.resolve(name).ok_or_else(|| self.not_found(name))?;
        Ok(agent.process().await?)
    }

    pub fn list_agents(&self) -> Result<BTreeMap<String, AgentStatus>, ApiError> {
        self.registry.ensure_reconciled()?;
        let mut statuses = BTreeMap::new();
        for agent in self.registry.agents() {
            statuses.insert(agent.name().to_string(), agent.status()?);
        }
        Ok(statuses)
    }

    pub fn get_agent_status(&self, name: &str) -> Result<AgentStatus, ApiError> {
        self.registry.ensure_reconciled()?;
        let agent = self.registry.resolve(name).ok_or_else(|| self.not_found(name))?;
        Ok(agent.status()?)
    }

    /// Run blocking registry work (directory listing, store scans) off the
    /// async executor.
    pub async fn run_blocking<T, F>(self: &Arc<Self>, work: F) -> Result<T, ApiError>
    where
        F: FnOnce(&ChatService) -> Result<T, ApiError> + Send + 'static,
        T: Send + 'static,
    {
        let service = Arc::clone(self);
        tokio::task::spawn_blocking(move || work(&service))
            .await
            .map_err(|e| ApiError::Index(IndexError::Task(e.to_string())))?
    }

    async fn reconciled(&self) -> Result<(), ApiError> {
        if self.registry.is_reconciled() {
            return Ok(());
        }
        let registry = self.registry.clone();
        tokio::task::spawn_blocking(move || registry.ensure_reconciled())
            .await
            .map_err(|e| ApiError::Index(IndexError::Task(e.to_string())))??;
        Ok(())
    }

    fn not_found(&self, name: &str) -> ApiError {
        ApiError::AgentNotFound {
            name: name.to_string(),
            available: self.registry.names(),
        }
    }
}
