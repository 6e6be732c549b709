//! Agent registry and reconciliation.
//!
//! Joins the documents currently in the source directory with the indexes
//! currently in storage, keyed by derived name. The registry never invents an
//! agent for an index whose document is gone and never picks a winner when two
//! documents derive the same name; both conditions are reported instead.

use super::document_agent::{Agent, AgentServices};
use crate::document::{derive_name, Document, DocumentSource};
use crate::error::StorageError;
use crate::index::{DocumentIndex, IndexServices};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Data-integrity conditions found during reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegistryIssue {
    #[error("Documents {paths:?} all derive the agent name '{name}'; rename all but one")]
    DuplicateAgentName { name: String, paths: Vec<PathBuf> },

    #[error("Persisted index '{name}' has no matching document; it was left in place")]
    OrphanedIndex { name: String },

    #[error("Document {path:?} derives an empty agent name; rename it")]
    UnnamedDocument { path: PathBuf },
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Agents registered after the pass
    pub agent_count: usize,
    /// New agents without a persisted index
    pub created: Vec<String>,
    /// New agents bound to an existing persisted index
    pub restored: Vec<String>,
    /// Agents removed because their document vanished or became ambiguous
    pub retired: Vec<String>,
    pub issues: Vec<RegistryIssue>,
}

impl ReconcileReport {
    pub fn duplicates(&self) -> impl Iterator<Item = &RegistryIssue> {
        self.issues
            .iter()
            .filter(|i| matches!(i, RegistryIssue::DuplicateAgentName { .. }))
    }

    pub fn orphans(&self) -> impl Iterator<Item = &RegistryIssue> {
        self.issues
            .iter()
            .filter(|i| matches!(i, RegistryIssue::OrphanedIndex { .. }))
    }

    pub fn unnamed(&self) -> impl Iterator<Item = &RegistryIssue> {
        self.issues
            .iter()
            .filter(|i| matches!(i, RegistryIssue::UnnamedDocument { .. }))
    }
}

/// Agents reconstructed purely from persisted indexes.
pub struct ExistingAgents {
    pub agents: BTreeMap<String, Agent>,
    /// Storage keys with no matching document
    pub orphans: Vec<String>,
}

/// Documents grouped by derived name.
struct Discovery {
    unique: BTreeMap<String, Document>,
    duplicates: BTreeMap<String, Vec<Document>>,
    /// Documents whose stem is nothing but separators
    unnamed: Vec<Document>,
}

/// Process-wide mapping from derived name to agent.
///
/// Reads take a short read lock; reconciliation is serialized and swaps the
/// whole map at the end of a pass.
pub struct AgentRegistry {
    agents: RwLock<BTreeMap<String, Arc<Agent>>>,
    reconcile_lock: Mutex<()>,
    reconciled: AtomicBool,
    source: Arc<dyn DocumentSource>,
    index_services: Arc<IndexServices>,
    agent_services: Arc<AgentServices>,
}

impl AgentRegistry {
    pub fn new(
        source: Arc<dyn DocumentSource>,
        index_services: Arc<IndexServices>,
        agent_services: Arc<AgentServices>,
    ) -> Self {
        Self {
            agents: RwLock::new(BTreeMap::new()),
            reconcile_lock: Mutex::new(()),
            reconciled: AtomicBool::new(false),
            source,
            index_services,
            agent_services,
        }
    }

    /// Documents currently in the source, sorted by file name.
    pub fn discover_documents(&self) -> Result<Vec<Document>, StorageError> {
        Ok(self
            .source
            .list_documents()?
            .into_iter()
            .map(Document::from_source)
            .collect())
    }

    fn discover(&self) -> Result<Discovery, StorageError> {
        let mut grouped: BTreeMap<String, Vec<Document>> = BTreeMap::new();
        let mut unnamed = Vec::new();
        for document in self.discover_documents()? {
            if document.name.is_empty() {
                unnamed.push(document);
                continue;
            }
            grouped
                .entry(document.name.clone())
                .or_default()
                .push(document);
        }

        let mut discovery = Discovery {
            unique: BTreeMap::new(),
            duplicates: BTreeMap::new(),
            unnamed,
        };
        for (name, mut documents) in grouped {
            if documents.len() == 1 {
                if let Some(document) = documents.pop() {
                    discovery.unique.insert(name, document);
                }
            } else {
                discovery.duplicates.insert(name, documents);
            }
        }
        Ok(discovery)
    }

    /// Map derived name to storage key for every persisted index with a
    /// matching document. Returns the keys left unmatched.
    fn match_indexes(
        &self,
        discovery: &Discovery,
    ) -> Result<(BTreeMap<String, String>, Vec<String>), StorageError> {
        let mut bound: BTreeMap<String, String> = BTreeMap::new();
        let mut orphans = Vec::new();

        for key in self.index_services.store.list()? {
            let name = derive_name(&key);
            if discovery.duplicates.contains_key(&name) {
                continue;
            }
            if !discovery.unique.contains_key(&name) {
                orphans.push(key);
                continue;
            }
            match bound.get(&name) {
                // An exactly keyed index wins over one that only derives the name.
                Some(existing) if *existing == name || key != name => orphans.push(key),
                Some(_) => {
                    if let Some(previous) = bound.insert(name, key) {
                        orphans.push(previous);
                    }
                }
                None => {
                    bound.insert(name, key);
                }
            }
        }
        Ok((bound, orphans))
    }

    fn build_agent(&self, document: Document, key: Option<&String>) -> Agent {
        let mut index = DocumentIndex::new(document, self.index_services.clone());
        if let Some(key) = key {
            index = index.with_storage_key(key.clone());
        }
        Agent::new(index, self.agent_services.clone())
    }

    /// Agents that can be reconstructed from persisted indexes alone.
    pub fn discover_existing_agents(&self) -> Result<ExistingAgents, StorageError> {
        let discovery = self.discover()?;
        let (bound, orphans) = self.match_indexes(&discovery)?;
        let agents = bound
            .iter()
            .filter_map(|(name, key)| {
                let document = discovery.unique.get(name)?.clone();
                Some((name.clone(), self.build_agent(document, Some(key))))
            })
            .collect();
        Ok(ExistingAgents { agents, orphans })
    }

    /// Reconcile the registry with the document source and index storage.
    pub fn reconcile(&self) -> Result<ReconcileReport, StorageError> {
        let _guard = self.reconcile_lock.lock();

        let discovery = self.discover()?;
        let (bound, orphans) = self.match_indexes(&discovery)?;
        let current = self.agents.read().clone();
        let mut report = ReconcileReport::default();

        for (name, documents) in &discovery.duplicates {
            let paths: Vec<PathBuf> = documents.iter().map(|d| d.path.clone()).collect();
            warn!(agent = %name, ?paths, "Multiple documents derive the same agent name");
            report.issues.push(RegistryIssue::DuplicateAgentName {
                name: name.clone(),
                paths,
            });
        }
        for document in &discovery.unnamed {
            warn!(path = ?document.path, "Document derives an empty agent name");
            report.issues.push(RegistryIssue::UnnamedDocument {
                path: document.path.clone(),
            });
        }
        for key in orphans {
            warn!(index = %key, "Persisted index has no matching document");
            report.issues.push(RegistryIssue::OrphanedIndex { name: key });
        }

        let mut next: BTreeMap<String, Arc<Agent>> = BTreeMap::new();
        for (name, document) in discovery.unique {
            if let Some(live) = current.get(&name) {
                if live.document().path == document.path {
                    next.insert(name, live.clone());
                    continue;
                }
            }
            let key = bound.get(&name);
            if key.is_some() {
                report.restored.push(name.clone());
            } else {
                report.created.push(name.clone());
            }
            next.insert(name, Arc::new(self.build_agent(document, key)));
        }

        for (name, live) in &current {
            let kept = next
                .get(name)
                .map(|agent| Arc::ptr_eq(agent, live))
                .unwrap_or(false);
            if !kept {
                report.retired.push(name.clone());
            }
        }

        report.agent_count = next.len();
        *self.agents.write() = next;
        self.reconciled.store(true, Ordering::SeqCst);

        info!(
            agents = report.agent_count,
            created = report.created.len(),
            restored = report.restored.len(),
            retired = report.retired.len(),
            issues = report.issues.len(),
            "Registry reconciled"
        );
        Ok(report)
    }

    pub fn is_reconciled(&self) -> bool {
        self.reconciled.load(Ordering::SeqCst)
    }

    /// Reconcile once if nobody has yet.
    pub fn ensure_reconciled(&self) -> Result<(), StorageError> {
        if !self.is_reconciled() {
            self.reconcile()?;
        }
        Ok(())
    }

    /// Look up an agent by its exact name, then by the derived form of `name`.
    pub fn resolve(&self, name: &str) -> Option<Arc<Agent>> {
        let agents = self.agents.read();
        agents
            .get(name)
            .or_else(|| agents.get(&derive_name(name)))
            .cloned()
    }

    /// Registered names in iteration (sorted) order.
    pub fn names(&self) -> Vec<String> {
        self.agents.read().keys().cloned().collect()
    }

    /// Registered agents in iteration (sorted) order.
    pub fn agents(&self) -> Vec<Arc<Agent>> {
        self.agents.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.agents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.read().is_empty()
    }
}
