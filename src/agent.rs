//! Document Agents
//!
//! An agent binds one source document to its index and its conversation
//! session and answers questions scoped to that document. The registry owns
//! the name → agent mapping and keeps it consistent with the document source
//! and index storage.

pub mod document_agent;
pub mod prompt;
pub mod registry;
pub mod session;
pub mod status;

pub use document_agent::{Agent, AgentServices};
pub use prompt::{resolve_prompt_path, PromptCache, PromptSource};
pub use registry::{AgentRegistry, ExistingAgents, ReconcileReport, RegistryIssue};
pub use session::{ConversationSession, Turn};
pub use status::AgentStatus;
