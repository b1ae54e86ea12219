//! Chat turns against the upstream model over per-user sessions

use crate::store::ChatSessionStore;
use std::sync::Arc;
use tagwise_core::ChatMessage;
use tagwise_telemetry::Correlation;
use tagwise_upstream::{CancellationToken, UpstreamClient, UpstreamError};

/// Runs chat turns against the upstream model, keeping per-user history
#[derive(Debug, Clone)]
pub struct ChatService {
    store: Arc<ChatSessionStore>,
    client: UpstreamClient,
}

impl ChatService {
    pub fn new(client: UpstreamClient) -> Self {
        Self::with_store(Arc::new(ChatSessionStore::new()), client)
    }

    pub fn with_store(store: Arc<ChatSessionStore>, client: UpstreamClient) -> Self {
        Self { store, client }
    }

    pub fn store(&self) -> &Arc<ChatSessionStore> {
        &self.store
    }

    /// Send `message` for `user_id` and return the assistant's reply.
    ///
    /// The user message and the reply are only recorded once the call succeeds,
    /// so a failed turn can be retried without duplicating history.
    pub async fn respond(
        &self,
        user_id: &str,
        message: &str,
        request_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<String, UpstreamError> {
        let session = self.store.get_or_create(user_id);
        let state = session.snapshot();

        let mut history = state.messages;
        history.push(ChatMessage::user(message));
        let context = Some(state.context_summary.as_str()).filter(|c| !c.is_empty());

        let mut correlation = Correlation::for_user(user_id);
        if let Some(id) = request_id {
            correlation = correlation.with_request(id);
        }

        let reply = self.client.chat(&history, context, &correlation, cancel).await?;

        session.append_turn(message, reply.as_str());
        Ok(reply)
    }

    /// Refresh the user's context summary. Users without a session get an empty summary.
    pub async fn summarize(
        &self,
        user_id: &str,
        cancel: &CancellationToken,
    ) -> Result<String, UpstreamError> {
        match self.store.get(user_id) {
            Some(session) => self.store.summarize(&session, &self.client, cancel).await,
            None => Ok(String::new()),
        }
    }

    pub fn close(&self, user_id: &str) -> bool {
        self.store.close(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tagwise_core::{ProviderConfig, Role};
    use tokio::sync::Notify;
    use tagwise_upstream::{ApiError, Provider};

    /// Replies from a queue; an empty queue fails with a rate limit
    struct QueueProvider {
        replies: Mutex<Vec<String>>,
        calls: AtomicUsize,
        seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl QueueProvider {
        fn new(replies: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.iter().rev().map(|r| r.to_string()).collect()),
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Provider for QueueProvider {
        fn name(&self) -> &str {
            "queue"
        }

        fn model(&self) -> &str {
            "queue-1"
        }

        async fn complete(&self, messages: &[ChatMessage]) -> Result<String, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(messages.to_vec());
            self.replies
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| ApiError::new(429, "Rate limit reached").into())
        }
    }

    /// Signals `entered` once called, then holds the reply until `release` fires
    struct GatedProvider {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl Provider for GatedProvider {
        fn name(&self) -> &str {
            "gated"
        }

        fn model(&self) -> &str {
            "gated-1"
        }

        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, UpstreamError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok("Works early.".to_string())
        }
    }

    fn service(provider: &Arc<QueueProvider>) -> ChatService {
        let provider: Arc<dyn Provider> = provider.clone();
        ChatService::new(UpstreamClient::new(provider, &ProviderConfig::default()))
    }

    #[tokio::test]
    async fn test_respond_records_turn() {
        let provider = QueueProvider::new(&["Happy to help."]);
        let service = service(&provider);
        let cancel = CancellationToken::new();

        let reply = service
            .respond("u1", "Plan my Monday", Some("req-1"), &cancel)
            .await
            .unwrap();
        assert_eq!(reply, "Happy to help.");

        let session = service.store().get("u1").unwrap();
        assert_eq!(
            session.messages(),
            vec![
                ChatMessage::user("Plan my Monday"),
                ChatMessage::assistant("Happy to help.")
            ]
        );
        assert!(session.needs_summary_update());
    }

    #[tokio::test]
    async fn test_failed_turn_leaves_history_untouched() {
        let provider = QueueProvider::new(&[]);
        let service = service(&provider);
        let cancel = CancellationToken::new();

        let err = service.respond("u2", "hello", None, &cancel).await.unwrap_err();
        assert_eq!(err.kind(), tagwise_upstream::ErrorKind::TransientRateLimit);

        let session = service.store().get("u2").unwrap();
        assert_eq!(session.message_count(), 0);
        assert!(!session.needs_summary_update());
    }

    #[tokio::test]
    async fn test_context_summary_reaches_system_prompt() {
        let provider = QueueProvider::new(&["Prefers mornings.", "Noted."]);
        let service = service(&provider);
        let cancel = CancellationToken::new();

        let session = service.store().get_or_create("u3");
        session.append(Role::User, "I focus best before noon");
        let summary = service.summarize("u3", &cancel).await.unwrap();
        assert_eq!(summary, "Prefers mornings.");
        assert!(!session.needs_summary_update());

        service.respond("u3", "Schedule gym", None, &cancel).await.unwrap();
        let seen = provider.seen.lock().unwrap();
        let system = &seen[1][0];
        assert_eq!(system.role, Role::System);
        assert!(system.content.contains("Prefers mornings."));
    }

    #[tokio::test]
    async fn test_summarize_without_messages_skips_upstream() {
        let provider = QueueProvider::new(&["unused"]);
        let service = service(&provider);
        let cancel = CancellationToken::new();

        assert_eq!(service.summarize("nobody", &cancel).await.unwrap(), "");
        service.store().get_or_create("empty");
        assert_eq!(service.summarize("empty", &cancel).await.unwrap(), "");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_summary_keeps_flag() {
        let provider = QueueProvider::new(&[]);
        let service = service(&provider);
        let cancel = CancellationToken::new();

        let session = service.store().get_or_create("u4");
        session.append(Role::User, "I hate late meetings");

        assert!(service.summarize("u4", &cancel).await.is_err());
        assert!(session.needs_summary_update());
        assert!(session.context_summary().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_turn_is_not_recorded() {
        let provider = QueueProvider::new(&["never seen"]);
        let service = service(&provider);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = service.respond("u5", "hi", None, &cancel).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Cancelled));
        assert_eq!(service.store().get("u5").unwrap().message_count(), 0);
    }

    #[tokio::test]
    async fn test_append_during_summary_keeps_flag() {
        let provider = Arc::new(GatedProvider {
            entered: Notify::new(),
            release: Notify::new(),
        });
        let client = UpstreamClient::new(provider.clone(), &ProviderConfig::default());
        let service = ChatService::new(client);
        let cancel = CancellationToken::new();

        let session = service.store().get_or_create("u6");
        session.append(Role::User, "I start at seven");

        let (summary, ()) = tokio::join!(service.summarize("u6", &cancel), async {
            provider.entered.notified().await;
            session.append(Role::User, "but not on Fridays");
            provider.release.notify_one();
        });

        assert_eq!(summary.unwrap(), "Works early.");
        assert_eq!(session.context_summary(), "Works early.");
        assert_eq!(session.message_count(), 2);
        assert!(session.needs_summary_update());
    }

    #[tokio::test]
    async fn test_summary_without_new_messages_clears_flag() {
        let provider = Arc::new(GatedProvider {
            entered: Notify::new(),
            release: Notify::new(),
        });
        provider.release.notify_one();
        let client = UpstreamClient::new(provider.clone(), &ProviderConfig::default());
        let service = ChatService::new(client);

        let session = service.store().get_or_create("u7");
        session.append(Role::User, "I start at seven");

        service.summarize("u7", &CancellationToken::new()).await.unwrap();
        assert!(!session.needs_summary_update());
    }
}
