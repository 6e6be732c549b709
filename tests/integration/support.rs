use docdesk::document::{DirectorySource, FileTextExtractor};
use docdesk::index::{SledVectorStore, VectorStore};
use docdesk::provider::mock::{HashEmbedder, ScriptedCompletion};
use docdesk::service::{ChatService, Components, ServiceSettings};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub const LLM_REPLY: &str = "According to the document, the essay is due in week five.";

/// A documents directory and an on-disk index store that outlive any one
/// service, so tests can simulate a process restart.
pub struct Workspace {
    temp: TempDir,
    pub embedder: Arc<HashEmbedder>,
    pub llm: Arc<ScriptedCompletion>,
}

impl Workspace {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("documents")).unwrap();
        Self {
            temp,
            embedder: Arc::new(HashEmbedder::new(64)),
            llm: Arc::new(ScriptedCompletion::new(LLM_REPLY)),
        }
    }

    pub fn documents_dir(&self) -> PathBuf {
        self.temp.path().join("documents")
    }

    pub fn index_dir(&self) -> PathBuf {
        self.temp.path().join("indexes")
    }

    pub fn add_document(&self, file_name: &str, text: &str) {
        std::fs::write(self.documents_dir().join(file_name), text).unwrap();
    }

    pub fn remove_document(&self, file_name: &str) {
        std::fs::remove_file(self.documents_dir().join(file_name)).unwrap();
    }

    /// A fresh service over this workspace. Drop the previous one first;
    /// sled holds an exclusive lock on the index directory.
    pub fn service(&self) -> ChatService {
        let components = Components {
            source: Arc::new(DirectorySource::new(
                self.documents_dir(),
                vec!["txt".to_string()],
            )),
            store: Arc::new(SledVectorStore::open(&self.index_dir()).unwrap()),
            extractor: Arc::new(FileTextExtractor::new()),
            embedder: self.embedder.clone(),
            llm: self.llm.clone(),
        };
        ChatService::new(components, ServiceSettings::default())
    }

    /// Storage keys persisted on disk. No service may be alive.
    pub fn persisted_indexes(&self) -> Vec<String> {
        SledVectorStore::open(&self.index_dir())
            .unwrap()
            .list()
            .unwrap()
    }
}
