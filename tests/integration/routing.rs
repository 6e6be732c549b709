use super::support::{Workspace, LLM_REPLY};
use docdesk::error::{ApiError, IndexError, ProviderError};
use docdesk::service::Reply;

#[tokio::test]
async fn fresh_agent_answers_rules_without_touching_the_index() {
    let ws = Workspace::new();
    ws.add_document("Notes.txt", "Lecture notes on thermodynamics.");
    let service = ws.service();

    let report = service.create_agents().unwrap();
    assert_eq!(report.agent_count, 1);
    assert!(!service.list_agents().unwrap()["Notes"].has_persisted_index);

    let reply = service.chat_with_agent("Notes", "hi").await.unwrap();
    match reply {
        Reply::Rule { text } => assert_eq!(text, "Hi there! What can I do for you?"),
        other => panic!("unexpected reply: {:?}", other),
    }
    assert_eq!(ws.embedder.calls(), 0);
    assert_eq!(ws.llm.calls(), 0);
    assert!(!service.get_agent_status("Notes").unwrap().is_initialized);
}

#[tokio::test]
async fn cold_agent_reports_not_initialized_without_side_effects() {
    let ws = Workspace::new();
    ws.add_document("Notes.txt", "Lecture notes on thermodynamics.");
    let service = ws.service();

    let reply = service
        .chat_with_agent("Notes", "What does entropy measure?")
        .await
        .unwrap();
    assert!(matches!(
        reply,
        Reply::Failed {
            error: IndexError::NotInitialized { .. },
            ..
        }
    ));
    assert!(reply.render().contains("has not been initialized"));
    assert_eq!(ws.embedder.calls(), 0);
    assert_eq!(ws.llm.calls(), 0);
}

#[tokio::test]
async fn rules_match_exactly_then_by_substring() {
    let ws = Workspace::new();
    let service = ws.service();

    let reply = service.chat("  HELLO ").await.unwrap();
    assert_eq!(reply.render(), "Hello! How can I help you today?");

    let reply = service.chat("ok, bye for now").await.unwrap();
    assert_eq!(reply.render(), "Goodbye! Have a great day!");

    let reply = service.chat("What does entropy measure?").await.unwrap();
    assert!(matches!(reply, Reply::NoAgents));
}

#[tokio::test]
async fn rules_take_precedence_over_a_named_agent() {
    let ws = Workspace::new();
    ws.add_document("Notes.txt", "Lecture notes on thermodynamics.");
    let service = ws.service();
    service.process_all_documents().await.unwrap();

    let reply = service
        .chat_with_agent("Notes", "thanks for the summary")
        .await
        .unwrap();
    assert_eq!(reply.render(), "You're welcome!");
    assert_eq!(ws.llm.calls(), 0);
}

#[tokio::test]
async fn query_naming_an_agent_is_routed_to_it() {
    let ws = Workspace::new();
    ws.add_document("Course Notes.txt", "The essay is due in week five.");
    ws.add_document("Reading List.txt", "Chapter one of the course reader.");
    let service = ws.service();
    service.process_all_documents().await.unwrap();

    let reply = service
        .chat("What do the course notes say about the essay?")
        .await
        .unwrap();
    match &reply {
        Reply::Answer { agent, text } => {
            assert_eq!(agent, "Course_Notes");
            assert_eq!(text, LLM_REPLY);
        }
        other => panic!("unexpected reply: {:?}", other),
    }

    let request = ws.llm.requests().pop().unwrap();
    assert!(request[0].content.contains("Course_Notes"));
    assert!(request[1].content.contains("The essay is due in week five."));
}

#[tokio::test]
async fn query_naming_no_agent_lists_them() {
    let ws = Workspace::new();
    ws.add_document("Course Notes.txt", "The essay is due in week five.");
    ws.add_document("Reading List.txt", "Chapter one of the course reader.");
    let service = ws.service();

    let reply = service.chat("When is the exam?").await.unwrap();
    match &reply {
        Reply::Disambiguation { agents } => {
            assert_eq!(agents, &vec!["Course_Notes".to_string(), "Reading_List".to_string()]);
        }
        other => panic!("unexpected reply: {:?}", other),
    }
    assert!(reply
        .render()
        .contains("Available agents: Course_Notes, Reading_List"));
}

#[tokio::test]
async fn unknown_agent_is_an_error() {
    let ws = Workspace::new();
    ws.add_document("Notes.txt", "Lecture notes.");
    let service = ws.service();

    match service.chat_with_agent("Minutes", "What was decided?").await {
        Err(ApiError::AgentNotFound { name, available }) => {
            assert_eq!(name, "Minutes");
            assert_eq!(available, vec!["Notes".to_string()]);
        }
        other => panic!("unexpected result: {:?}", other.map(|r| r.render())),
    }
}

#[tokio::test]
async fn provider_failure_renders_an_apology() {
    let ws = Workspace::new();
    ws.add_document("Notes.txt", "Lecture notes on thermodynamics.");
    let service = ws.service();
    service.process_all_documents().await.unwrap();

    ws.llm
        .push_failure(ProviderError::InvalidResponse("empty choices".to_string()));
    let reply = service
        .chat_with_agent("Notes", "What does entropy measure?")
        .await
        .unwrap();
    assert!(reply.is_failure());
    assert!(reply
        .render()
        .starts_with("I apologize, but I encountered an error:"));
    assert_eq!(service.get_agent_status("Notes").unwrap().turns, 0);
}

#[tokio::test]
async fn follow_up_questions_are_condensed_with_history() {
    let ws = Workspace::new();
    ws.add_document("Notes.txt", "The essay is due in week five.");
    let service = ws.service();
    service.process_all_documents().await.unwrap();

    service
        .chat_with_agent("Notes", "When is the essay due?")
        .await
        .unwrap();
    service
        .chat_with_agent("Notes", "And how long should it be?")
        .await
        .unwrap();

    // answer, condense, answer
    assert_eq!(ws.llm.calls(), 3);
    let condense = &ws.llm.requests()[1];
    let prompt: String = condense.iter().map(|m| m.content.as_str()).collect();
    assert!(prompt.contains("When is the essay due?"));
    assert!(prompt.contains("And how long should it be?"));
    assert_eq!(service.get_agent_status("Notes").unwrap().turns, 2);
}
