//! Observable agent state.

use serde::{Deserialize, Serialize};

/// Status of one agent as reported to transports.
///
/// `is_initialized` and `has_persisted_index` are independent: an index can
/// exist on disk before any handle is opened for it in this process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStatus {
    pub name: String,
    pub source_path: String,
    /// An in-memory index handle is open
    pub is_initialized: bool,
    /// A persisted index exists in storage
    pub has_persisted_index: bool,
    /// Store path and key of the index, whether or not it exists yet
    pub index_location: String,
    /// Answered turns in the conversation session
    pub turns: usize,
}

impl AgentStatus {
    /// One-word summary for listings.
    pub fn state_label(&self) -> &'static str {
        match (self.is_initialized, self.has_persisted_index) {
            (true, _) => "ready",
            (false, true) => "persisted",
            (false, false) => "unprocessed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(is_initialized: bool, has_persisted_index: bool) -> AgentStatus {
        AgentStatus {
            name: "Notes".to_string(),
            source_path: "/docs/Notes.pdf".to_string(),
            is_initialized,
            has_persisted_index,
            index_location: "/data/indexes#Notes".to_string(),
            turns: 0,
        }
    }

    #[test]
    fn labels_distinguish_disk_from_memory() {
        assert_eq!(status(false, false).state_label(), "unprocessed");
        assert_eq!(status(false, true).state_label(), "persisted");
        assert_eq!(status(true, true).state_label(), "ready");
    }

    #[test]
    fn serializes_field_names() {
        let json = serde_json::to_value(status(false, true)).unwrap();
        assert_eq!(json["has_persisted_index"], true);
        assert_eq!(json["is_initialized"], false);
    }
}
