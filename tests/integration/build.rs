use super::support::Workspace;
use docdesk::index::BuildOutcome;
use docdesk::service::ProcessOutcome;

#[tokio::test]
async fn building_twice_persists_one_index() {
    let ws = Workspace::new();
    ws.add_document("Notes.txt", "Lecture notes on thermodynamics.\n\nEntropy always rises.");
    {
        let service = ws.service();
        let first = service.process_agent("Notes").await.unwrap();
        assert!(matches!(first, BuildOutcome::Built { chunks } if chunks >= 1));
        let embedded = ws.embedder.texts_embedded();

        let second = service.process_agent("Notes").await.unwrap();
        assert_eq!(second, BuildOutcome::Loaded);
        assert_eq!(ws.embedder.texts_embedded(), embedded);
    }
    assert_eq!(ws.persisted_indexes(), vec!["Notes".to_string()]);
}

#[tokio::test]
async fn one_failing_document_does_not_stop_the_rest() {
    let ws = Workspace::new();
    ws.add_document("Blank.txt", "   \n\n  ");
    ws.add_document("Notes.txt", "Lecture notes on thermodynamics.");
    ws.add_document("Reading List.txt", "Chapter one of the course reader.");

    let service = ws.service();
    let report = service.process_all_documents().await.unwrap();

    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.built(), 2);
    match &report.outcomes["Blank"] {
        ProcessOutcome::Failed { reason } => assert!(reason.contains("no extractable text")),
        other => panic!("unexpected outcome: {:?}", other),
    }

    let statuses = service.list_agents().unwrap();
    assert!(!statuses["Blank"].has_persisted_index);
    assert!(statuses["Notes"].has_persisted_index);
}

#[tokio::test]
async fn concurrent_processing_embeds_once() {
    let ws = Workspace::new();
    ws.add_document("Notes.txt", "Lecture notes on thermodynamics.");
    let service = ws.service();

    let (a, b) = tokio::join!(service.process_agent("Notes"), service.process_agent("Notes"));
    let mut outcomes = vec![a.unwrap(), b.unwrap()];
    outcomes.sort_by_key(|o| matches!(o, BuildOutcome::Loaded));

    assert!(matches!(outcomes[0], BuildOutcome::Built { .. }));
    assert_eq!(outcomes[1], BuildOutcome::Loaded);
    assert_eq!(ws.embedder.calls(), 1);
}

#[tokio::test]
async fn processing_by_display_name_resolves_derived_name() {
    let ws = Workspace::new();
    ws.add_document("Reading List.txt", "Chapter one of the course reader.");
    let service = ws.service();

    let outcome = service.process_agent("Reading List").await.unwrap();
    assert!(matches!(outcome, BuildOutcome::Built { .. }));
    assert!(service.get_agent_status("Reading_List").unwrap().is_initialized);
}
