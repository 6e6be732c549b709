//! Prompt templates and prompt file loading.

use super::session::Turn;
use crate::error::ApiError;
use crate::index::Passage;
use crate::provider::ChatMessage;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Placeholder replaced with the agent's derived name.
pub const AGENT_NAME_PLACEHOLDER: &str = "{agent_name}";

/// Built-in system instruction for document agents.
pub const DEFAULT_SYSTEM_TEMPLATE: &str = "You are an assistant answering questions about the document: {agent_name}

You are an expert only in the contents of this document. Answer using only the information it contains. \
If a question is not related to this document, say that you cannot answer it.

Document: {agent_name}";

const CONDENSE_TEMPLATE: &str = "Given the following conversation and a follow up question, \
rephrase the follow up question to be a standalone question, in its original language.";

/// Resolve prompt file path with support for absolute, tilde, and relative paths
///
/// Path resolution priority:
/// 1. Absolute path (if starts with `/`)
/// 2. Tilde expansion (if starts with `~/`)
/// 3. Relative to current directory (if starts with `./`)
/// 4. Relative to base_dir (the workspace root)
pub fn resolve_prompt_path(path: &str, base_dir: &Path) -> Result<PathBuf, ApiError> {
    if path.starts_with('/') {
        return Ok(PathBuf::from(path));
    }
    if let Some(rest) = path.strip_prefix("~/") {
        let home =
            std::env::var("HOME").map_err(|_| ApiError::ConfigError("HOME not set".to_string()))?;
        return Ok(PathBuf::from(home).join(rest));
    }
    if let Some(rest) = path.strip_prefix("./") {
        let current_dir = std::env::current_dir().map_err(|e| {
            ApiError::ConfigError(format!("Failed to get current directory: {}", e))
        })?;
        return Ok(current_dir.join(rest));
    }
    Ok(base_dir.join(path))
}

/// Prompt file cache keyed by path, invalidated on modification time
pub struct PromptCache {
    cache: HashMap<PathBuf, (String, SystemTime)>,
}

impl PromptCache {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    pub fn load_prompt(&mut self, path: &Path) -> Result<String, ApiError> {
        let read_err = |e: std::io::Error| {
            ApiError::ConfigError(format!(
                "Failed to read prompt file {}: {}",
                path.display(),
                e
            ))
        };
        let mtime = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .map_err(read_err)?;
        if let Some((content, cached_mtime)) = self.cache.get(path) {
            if *cached_mtime == mtime {
                return Ok(content.clone());
            }
        }
        let content = std::fs::read_to_string(path).map_err(read_err)?;
        if content.trim().is_empty() {
            return Err(ApiError::ConfigError(format!(
                "Prompt file {} is empty",
                path.display()
            )));
        }
        self.cache
            .insert(path.to_path_buf(), (content.clone(), mtime));
        Ok(content)
    }
}

impl Default for PromptCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Where the system template comes from.
///
/// A file-backed source re-reads the file when it changes, so prompt edits
/// apply without restarting the server.
pub struct PromptSource {
    path: Option<PathBuf>,
    cache: Mutex<PromptCache>,
}

impl PromptSource {
    pub fn builtin() -> Self {
        Self {
            path: None,
            cache: Mutex::new(PromptCache::new()),
        }
    }

    /// Use the configured prompt file, if any. The file must load now.
    pub fn from_config(configured: Option<&str>, base_dir: &Path) -> Result<Self, ApiError> {
        let Some(configured) = configured else {
            return Ok(Self::builtin());
        };
        let path = resolve_prompt_path(configured, base_dir)?;
        let mut cache = PromptCache::new();
        cache.load_prompt(&path)?;
        Ok(Self {
            path: Some(path),
            cache: Mutex::new(cache),
        })
    }

    #[cfg(test)]
    fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Current system template. Falls back to the built-in one if the file
    /// has become unreadable.
    pub fn system_template(&self) -> String {
        let Some(path) = &self.path else {
            return DEFAULT_SYSTEM_TEMPLATE.to_string();
        };
        match self.cache.lock().load_prompt(path) {
            Ok(template) => template,
            Err(e) => {
                tracing::warn!("{}; using built-in system prompt", e);
                DEFAULT_SYSTEM_TEMPLATE.to_string()
            }
        }
    }
}

pub fn render_system_prompt(template: &str, agent_name: &str) -> String {
    template.replace(AGENT_NAME_PLACEHOLDER, agent_name)
}

/// Retrieved passages joined into one context block.
pub fn format_context(passages: &[Passage]) -> String {
    passages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// The document-scoped answer request.
pub fn answer_messages(system: &str, passages: &[Passage], question: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(system),
        ChatMessage::user(format!(
            "Context:\n{}\n\nQuestion: {}",
            format_context(passages),
            question
        )),
    ]
}

/// Request that rewrites a follow-up into a standalone question.
pub fn condense_messages(history: &[Turn], question: &str) -> Vec<ChatMessage> {
    let transcript = history
        .iter()
        .map(|t| format!("Human: {}\nAssistant: {}", t.question, t.answer))
        .collect::<Vec<_>>()
        .join("\n");
    vec![ChatMessage::user(format!(
        "{}\n\nChat History:\n{}\nFollow Up Input: {}\nStandalone question:",
        CONDENSE_TEMPLATE, transcript, question
    ))]
}
