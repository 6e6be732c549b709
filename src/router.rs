//! Query routing.
//!
//! Precedence: an explicitly named agent must exist, then the rule table is
//! checked globally, then the named agent (or the first agent whose name
//! appears in the query) answers. With no name in the query the caller gets
//! the list of agents; the router never guesses between them.

use crate::agent::{Agent, AgentRegistry};
use crate::document::spaced;
use crate::error::{ApiError, IndexError};
use crate::rules::RuleEngine;
use std::sync::Arc;
use tracing::debug;

/// Result of routing one query. Rendering is left to the transport.
#[derive(Debug)]
pub enum Reply {
    /// Answered by the rule table
    Rule { text: String },
    /// Answered by an agent
    Answer { agent: String, text: String },
    /// The agent could not answer
    Failed { agent: String, error: IndexError },
    /// No agents are registered
    NoAgents,
    /// No agent name appeared in the query
    Disambiguation { agents: Vec<String> },
}

impl Reply {
    /// Agent that handled the query, if any.
    pub fn agent(&self) -> Option<&str> {
        match self {
            Reply::Answer { agent, .. } | Reply::Failed { agent, .. } => Some(agent),
            _ => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Reply::Failed { .. })
    }

    /// User-facing text for this reply.
    pub fn render(&self) -> String {
        match self {
            Reply::Rule { text } | Reply::Answer { text, .. } => text.clone(),
            Reply::Failed {
                error: error @ IndexError::NotInitialized { .. },
                ..
            } => error.to_string(),
            Reply::Failed { error, .. } => {
                format!("I apologize, but I encountered an error: {}", error)
            }
            Reply::NoAgents => "No agents available. Please create agents first.".to_string(),
            Reply::Disambiguation { agents } => format!(
                "I found multiple specialized agents. Please specify which document you're asking about:\n\n\
                 Available agents: {}\n\n\
                 You can mention the agent name in your question, or ask about a specific document.",
                agents.join(", ")
            ),
        }
    }
}

/// Whether `name` (or its spaced form) occurs in `query`, ignoring case.
pub fn mentions(query: &str, name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    let query = query.to_lowercase();
    let name = name.to_lowercase();
    query.contains(&name) || query.contains(&spaced(&name))
}

/// Routes queries to the rule table or to one agent.
pub struct Router {
    rules: RuleEngine,
    registry: Arc<AgentRegistry>,
}

impl Router {
    pub fn new(rules: RuleEngine, registry: Arc<AgentRegistry>) -> Self {
        Self { rules, registry }
    }

    pub fn rules(&self) -> &RuleEngine {
        &self.rules
    }

    /// First agent, in registry order, mentioned by the query.
    pub fn select(&self, query: &str) -> Option<Arc<Agent>> {
        self.registry
            .agents()
            .into_iter()
            .find(|agent| mentions(query, agent.name()))
    }

    pub async fn route(&self, query: &str, explicit: Option<&str>) -> Result<Reply, ApiError> {
        let explicit = match explicit {
            Some(name) => Some(self.registry.resolve(name).ok_or_else(|| {
                ApiError::AgentNotFound {
                    name: name.to_string(),
                    available: self.registry.names(),
                }
            })?),
            None => None,
        };

        if let Some(text) = self.rules.respond(query) {
            debug!("Query answered by rule table");
            return Ok(Reply::Rule {
                text: text.to_string(),
            });
        }

        let agent = match explicit {
            Some(agent) => agent,
            None => {
                if self.registry.is_empty() {
                    return Ok(Reply::NoAgents);
                }
                match self.select(query) {
                    Some(agent) => agent,
                    None => {
                        return Ok(Reply::Disambiguation {
                            agents: self.registry.names(),
                        })
                    }
                }
            }
        };

        debug!(agent = %agent.name(), "Routing query to agent");
        let name = agent.name().to_string();
        Ok(match agent.answer(query).await {
            Ok(text) => Reply::Answer { agent: name, text },
            Err(error) => {
                tracing::warn!(agent = %name, "Agent failed to answer: {}", error);
                Reply::Failed { agent: name, error }
            }
        })
    }
}
