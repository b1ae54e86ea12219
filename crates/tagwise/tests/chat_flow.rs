mod common;

use common::{client_for, ScriptedProvider};
use tagwise_chat::ChatService;
use tagwise_core::Role;
use tagwise_telemetry::{read_jsonl, CallOutcome, CallRecord};
use tagwise_upstream::CancellationToken;

#[tokio::test]
async fn test_chat_turns_and_summary_are_logged() {
    let temp = tempfile::TempDir::new().unwrap();
    let log = temp.path().join("logs").join("calls.jsonl");

    let provider = ScriptedProvider::new(vec![
        Ok("Mornings work best for deep work.".to_string()),
        Ok("  Prefers deep work in the morning.  ".to_string()),
        Ok("Block 8-10am for the report.".to_string()),
    ]);
    let service = ChatService::new(client_for(&provider).with_call_log(Some(log.clone())));
    let cancel = CancellationToken::new();

    service
        .respond("u1", "When should I write the report?", Some("r1"), &cancel)
        .await
        .unwrap();
    let summary = service.summarize("u1", &cancel).await.unwrap();
    assert_eq!(summary, "Prefers deep work in the morning.");

    let reply = service
        .respond("u1", "Plan tomorrow", Some("r2"), &cancel)
        .await
        .unwrap();
    assert_eq!(reply, "Block 8-10am for the report.");

    // Third request carries the summary in its system prompt
    {
        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests[2][0].role, Role::System);
        assert!(requests[2][0].content.contains("Prefers deep work in the morning."));
        assert_eq!(requests[2].len(), 4);
    }

    let session = service.store().get("u1").unwrap();
    assert_eq!(session.message_count(), 4);
    assert!(session.needs_summary_update());

    let records: Vec<CallRecord> = read_jsonl(&log).unwrap();
    let operations: Vec<&str> = records.iter().map(|r| r.operation.as_str()).collect();
    assert_eq!(operations, vec!["chat", "summarize", "chat"]);
    assert!(records.iter().all(|r| r.outcome == CallOutcome::Success));
    assert_eq!(records[2].correlation.request_id.as_deref(), Some("r2"));
    assert_eq!(records[1].correlation.user_id.as_deref(), Some("u1"));
}

#[tokio::test]
async fn test_failed_turn_is_logged_but_not_recorded() {
    let temp = tempfile::TempDir::new().unwrap();
    let log = temp.path().join("calls.jsonl");

    let provider = ScriptedProvider::new(vec![]);
    let service = ChatService::new(client_for(&provider).with_call_log(Some(log.clone())));

    let result = service
        .respond("u2", "hello", None, &CancellationToken::new())
        .await;
    assert!(result.is_err());
    assert_eq!(service.store().get("u2").unwrap().message_count(), 0);

    let records: Vec<CallRecord> = read_jsonl(&log).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].outcome, CallOutcome::Failure);
    assert_eq!(records[0].error_kind.as_deref(), Some("other"));
}
