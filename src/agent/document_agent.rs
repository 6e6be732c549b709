//! A question-answering agent scoped to one document.

use super::prompt::{answer_messages, condense_messages, render_system_prompt, PromptSource};
use super::session::{ConversationSession, Turn};
use super::status::AgentStatus;
use crate::document::Document;
use crate::error::{IndexError, ProviderError, StorageError};
use crate::index::{BuildOutcome, DocumentIndex, IndexServices};
use crate::provider::{ChatMessage, CompletionClient, CompletionOptions};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Collaborators shared by every agent.
pub struct AgentServices {
    pub llm: Arc<dyn CompletionClient>,
    pub options: CompletionOptions,
    /// Upper bound on one completion call
    pub timeout: Duration,
    pub prompts: PromptSource,
}

/// Runtime binding of one document, its index and its conversation.
pub struct Agent {
    index: DocumentIndex,
    session: Mutex<ConversationSession>,
    services: Arc<AgentServices>,
}

impl Agent {
    pub fn new(index: DocumentIndex, services: Arc<AgentServices>) -> Self {
        Self {
            index,
            session: Mutex::new(ConversationSession::new()),
            services,
        }
    }

    /// Agent for `document` with a fresh, unopened index.
    pub fn for_document(
        document: Document,
        index_services: Arc<IndexServices>,
        services: Arc<AgentServices>,
    ) -> Self {
        Self::new(DocumentIndex::new(document, index_services), services)
    }

    pub fn name(&self) -> &str {
        self.index.name()
    }

    pub fn document(&self) -> &Document {
        self.index.document()
    }

    pub fn index(&self) -> &DocumentIndex {
        &self.index
    }

    pub fn history(&self) -> Vec<Turn> {
        self.session.lock().turns().to_vec()
    }

    /// Load or build this agent's index.
    pub async fn process(&self) -> Result<BuildOutcome, IndexError> {
        let outcome = self.index.ensure_built().await?;
        info!(agent = %self.name(), ?outcome, "Agent processed");
        Ok(outcome)
    }

    /// Answer a question from this agent's document.
    ///
    /// Never builds an index: with nothing persisted the result is
    /// `NotInitialized` and no provider is called.
    pub async fn answer(&self, query: &str) -> Result<String, IndexError> {
        if self.index.load_if_exists()?.is_none() {
            return Err(IndexError::NotInitialized {
                name: self.name().to_string(),
            });
        }

        let history = self.history();
        let question = if history.is_empty() {
            query.to_string()
        } else {
            let standalone = self.complete(&condense_messages(&history, query)).await?;
            debug!(agent = %self.name(), %standalone, "Condensed follow-up question");
            standalone
        };

        let passages = self
            .index
            .retrieve(&question, self.index.settings().top_k)
            .await?;
        let system = render_system_prompt(&self.services.prompts.system_template(), self.name());
        let answer = self
            .complete(&answer_messages(&system, &passages, &question))
            .await?;

        self.session.lock().record(query, answer.clone());
        Ok(answer)
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ProviderError> {
        let timeout = self.services.timeout;
        tokio::time::timeout(
            timeout,
            self.services.llm.complete(messages, &self.services.options),
        )
        .await
        .map_err(|_| ProviderError::Timeout(timeout))?
    }

    pub fn status(&self) -> Result<AgentStatus, StorageError> {
        Ok(AgentStatus {
            name: self.name().to_string(),
            source_path: self.document().path.display().to_string(),
            is_initialized: self.index.is_open(),
            has_persisted_index: self.index.has_persisted()?,
            index_location: self.index.location(),
            turns: self.session.lock().len(),
        })
    }
}
