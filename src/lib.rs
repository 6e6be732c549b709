//! docdesk: Document-Grounded Question Answering
//!
//! One retrieval agent per source document. Each agent owns a persisted
//! embedding index of its document and answers questions from the passages it
//! retrieves; a router picks the agent a question names, after a short table of
//! canned conversational replies.

pub mod agent;
pub mod concurrency;
pub mod config;
pub mod document;
pub mod error;
pub mod index;
pub mod logging;
pub mod provider;
pub mod router;
pub mod rules;
pub mod service;
pub mod tooling;
