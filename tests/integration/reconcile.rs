use super::support::Workspace;
use docdesk::agent::RegistryIssue;
use docdesk::error::ApiError;
use docdesk::service::{ProcessOutcome, Reply};
use std::sync::Arc;

#[test]
fn duplicate_names_create_no_agents() {
    let ws = Workspace::new();
    ws.add_document("Syllabus.txt", "Week one covers reading.");
    ws.add_document("Syllabus .txt", "Week one covers writing.");

    let service = ws.service();
    let report = service.create_agents().unwrap();

    assert_eq!(report.agent_count, 0);
    let duplicates: Vec<_> = report.duplicates().collect();
    assert_eq!(duplicates.len(), 1);
    match duplicates[0] {
        RegistryIssue::DuplicateAgentName { name, paths } => {
            assert_eq!(name, "Syllabus");
            assert_eq!(paths.len(), 2);
        }
        other => panic!("unexpected issue: {:?}", other),
    }
    assert!(service.list_agents().unwrap().is_empty());
}

#[test]
fn resolving_a_duplicate_creates_the_agent() {
    let ws = Workspace::new();
    ws.add_document("Syllabus.txt", "Week one covers reading.");
    ws.add_document("Syllabus .txt", "Week one covers writing.");
    let service = ws.service();
    assert_eq!(service.create_agents().unwrap().agent_count, 0);

    ws.remove_document("Syllabus .txt");
    let report = service.create_agents().unwrap();
    assert_eq!(report.agent_count, 1);
    assert_eq!(report.created, vec!["Syllabus".to_string()]);
    assert!(report.issues.is_empty());
}

#[tokio::test]
async fn orphaned_index_is_reported_and_kept() {
    let ws = Workspace::new();
    ws.add_document("Notes.txt", "Lecture notes on thermodynamics.");
    {
        let service = ws.service();
        let report = service.process_all_documents().await.unwrap();
        assert!(matches!(
            report.outcomes["Notes"],
            ProcessOutcome::Built { .. }
        ));
    }
    ws.remove_document("Notes.txt");

    {
        let service = ws.service();
        let report = service.create_agents().unwrap();
        assert_eq!(report.agent_count, 0);
        let orphans: Vec<_> = report.orphans().collect();
        assert_eq!(
            orphans,
            vec![&RegistryIssue::OrphanedIndex {
                name: "Notes".to_string()
            }]
        );
        assert!(matches!(
            service.get_agent_status("Notes"),
            Err(ApiError::AgentNotFound { .. })
        ));
    }
    assert_eq!(ws.persisted_indexes(), vec!["Notes".to_string()]);
}

#[tokio::test]
async fn restart_restores_agents_from_persisted_indexes() {
    let ws = Workspace::new();
    ws.add_document("Notes.txt", "Lecture notes on thermodynamics.");
    {
        let service = ws.service();
        service.process_all_documents().await.unwrap();
    }
    let embed_calls = ws.embedder.calls();

    let service = ws.service();
    let report = service.create_agents().unwrap();
    assert_eq!(report.restored, vec!["Notes".to_string()]);
    assert!(report.created.is_empty());

    let status = service.get_agent_status("Notes").unwrap();
    assert!(status.has_persisted_index);
    assert!(!status.is_initialized);
    assert_eq!(
        status.index_location,
        format!("{}#Notes", ws.index_dir().display())
    );

    let report = service.process_all_documents().await.unwrap();
    assert_eq!(report.outcomes["Notes"], ProcessOutcome::Loaded);
    assert_eq!(ws.embedder.calls(), embed_calls);
    assert!(service.get_agent_status("Notes").unwrap().is_initialized);
}

#[tokio::test]
async fn reconciling_again_keeps_live_sessions() {
    let ws = Workspace::new();
    ws.add_document("Notes.txt", "The essay is due in week five.");
    let service = ws.service();
    service.process_all_documents().await.unwrap();
    service
        .chat_with_agent("Notes", "When is the essay due?")
        .await
        .unwrap();

    let report = service.create_agents().unwrap();
    assert!(report.created.is_empty());
    assert!(report.retired.is_empty());

    let status = service.get_agent_status("Notes").unwrap();
    assert_eq!(status.turns, 1);
    assert!(status.is_initialized);
}

#[test]
fn removed_document_retires_its_agent() {
    let ws = Workspace::new();
    ws.add_document("Notes.txt", "Lecture notes.");
    ws.add_document("Reading List.txt", "Chapter one.");
    let service = ws.service();
    assert_eq!(service.create_agents().unwrap().agent_count, 2);

    ws.remove_document("Notes.txt");
    let report = service.create_agents().unwrap();
    assert_eq!(report.agent_count, 1);
    assert_eq!(report.retired, vec!["Notes".to_string()]);
    let names: Vec<_> = service.list_agents().unwrap().into_keys().collect();
    assert_eq!(names, vec!["Reading_List".to_string()]);
}

#[test]
fn first_use_reconciles_lazily() {
    let ws = Workspace::new();
    ws.add_document("Notes.txt", "Lecture notes.");
    let service = ws.service();
    let statuses = service.list_agents().unwrap();
    assert_eq!(statuses.len(), 1);
    assert!(!statuses["Notes"].has_persisted_index);
}

#[tokio::test]
async fn separator_only_file_name_gets_no_agent() {
    let ws = Workspace::new();
    ws.add_document("Course Notes.txt", "The exam is in week ten.");
    ws.add_document("-.txt", "Stray scan.");
    ws.add_document("_ .txt", "Another stray scan.");
    let service = ws.service();

    let report = service.create_agents().unwrap();
    assert_eq!(report.agent_count, 1);
    assert_eq!(report.created, vec!["Course_Notes".to_string()]);
    assert_eq!(report.unnamed().count(), 2);
    assert!(report.unnamed().all(|issue| matches!(
        issue,
        RegistryIssue::UnnamedDocument { path } if path.starts_with(ws.documents_dir())
    )));

    let reply = service.chat("When is the exam?").await.unwrap();
    match reply {
        Reply::Disambiguation { agents } => assert_eq!(agents, vec!["Course_Notes".to_string()]),
        other => panic!("expected disambiguation, got {:?}", other),
    }
    assert_eq!(ws.llm.calls(), 0);
}

#[tokio::test]
async fn lazy_reconcile_from_async_paths() {
    let ws = Workspace::new();
    ws.add_document("Notes.txt", "Lecture notes.");
    let service = Arc::new(ws.service());
    assert!(!service.registry().is_reconciled());

    let report = service.process_all_documents().await.unwrap();
    assert!(service.registry().is_reconciled());
    assert!(matches!(report.outcomes["Notes"], ProcessOutcome::Built { .. }));

    let caller = std::thread::current().id();
    let (worker, statuses) = service
        .run_blocking(|service| Ok((std::thread::current().id(), service.list_agents()?)))
        .await
        .unwrap();
    assert_ne!(worker, caller);
    assert!(statuses["Notes"].is_initialized);
}
