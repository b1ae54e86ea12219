//! Provider trait implemented by every upstream model backend

use crate::error::UpstreamError;
use crate::extract::parse_analysis;
use async_trait::async_trait;
use tagwise_core::{AnalysisResult, ChatMessage, PromptBuilder};

/// An upstream language-model backend.
///
/// Only [`Provider::complete`] is required; analysis, chat and summarization are
/// layered on top of it and can be overridden by backends with dedicated
/// endpoints.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Registry name (unique identifier)
    fn name(&self) -> &str;

    /// Model identifier sent upstream
    fn model(&self) -> &str;

    /// Send a message list and return the text of the reply
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, UpstreamError>;

    /// Run a fully built analysis prompt and parse the tags and time horizon
    async fn analyze(&self, prompt: &str) -> Result<AnalysisResult, UpstreamError> {
        let content = self.complete(&[ChatMessage::user(prompt)]).await?;
        parse_analysis(&content)
    }

    /// Answer the last message of `history`, framed by the user's known preferences
    async fn chat(
        &self,
        history: &[ChatMessage],
        user_context: Option<&str>,
    ) -> Result<String, UpstreamError> {
        let system = PromptBuilder::default().build_chat_system_prompt(user_context);
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatMessage::system(system));
        messages.extend_from_slice(history);
        self.complete(&messages).await
    }

    /// Fold a conversation into a short preference summary
    async fn summarize(
        &self,
        history: &[ChatMessage],
        previous_summary: Option<&str>,
    ) -> Result<String, UpstreamError> {
        let prompt = PromptBuilder::default().build_summary_prompt(history, previous_summary);
        let summary = self.complete(&[ChatMessage::user(prompt)]).await?;
        Ok(summary.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tagwise_core::{Role, TimeHorizon};

    struct RecordingProvider {
        reply: String,
        seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl RecordingProvider {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Provider for RecordingProvider {
        fn name(&self) -> &str {
            "recording"
        }

        fn model(&self) -> &str {
            "test-model"
        }

        async fn complete(&self, messages: &[ChatMessage]) -> Result<String, UpstreamError> {
            self.seen.lock().unwrap().push(messages.to_vec());
            Ok(self.reply.clone())
        }
    }

    #[tokio::test]
    async fn test_default_analyze_parses_reply() {
        let provider = RecordingProvider::new(r#"{"tags":["home"],"time_horizon":"later"}"#);
        let result = provider.analyze("prompt text").await.unwrap();

        assert_eq!(result.tags, vec!["home"]);
        assert_eq!(result.time_horizon, TimeHorizon::Later);
        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen[0], vec![ChatMessage::user("prompt text")]);
    }

    #[tokio::test]
    async fn test_default_chat_prepends_system_context() {
        let provider = RecordingProvider::new("Sounds good.");
        let history = vec![ChatMessage::user("Plan my week")];
        let reply = provider.chat(&history, Some("Works weekends.")).await.unwrap();

        assert_eq!(reply, "Sounds good.");
        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen[0].len(), 2);
        assert_eq!(seen[0][0].role, Role::System);
        assert!(seen[0][0].content.contains("Works weekends."));
        assert_eq!(seen[0][1], history[0]);
    }

    #[tokio::test]
    async fn test_default_summarize_trims() {
        let provider = RecordingProvider::new("  Likes mornings.\n");
        let summary = provider
            .summarize(&[ChatMessage::user("I work best early")], None)
            .await
            .unwrap();
        assert_eq!(summary, "Likes mornings.");
    }
}
