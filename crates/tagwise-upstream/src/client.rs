//! Timeout, cancellation and logging around provider calls

use crate::error::UpstreamError;
use crate::provider::Provider;
use chrono::Utc;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tagwise_core::{AnalysisInput, AnalysisResult, ChatMessage, PromptBuilder, ProviderConfig};
use tagwise_telemetry::{append_jsonl, preview, CallOutcome, CallRecord, Correlation};
use tokio_util::sync::CancellationToken;

/// A resolved provider plus the per-call policy applied to every request.
///
/// Each call runs once: retries are the caller's decision, usually driven by
/// [`crate::BackoffPolicy`].
#[derive(Clone)]
pub struct UpstreamClient {
    provider: Arc<dyn Provider>,
    prompts: PromptBuilder,
    timeout: Duration,
    full_logging: bool,
    call_log: Option<PathBuf>,
}

struct CallContext<'a> {
    operation: &'static str,
    prompt: &'a str,
    correlation: &'a Correlation,
    cancel: &'a CancellationToken,
}

impl UpstreamClient {
    pub fn new(provider: Arc<dyn Provider>, config: &ProviderConfig) -> Self {
        Self {
            provider,
            prompts: PromptBuilder::default(),
            timeout: config.timeout(),
            full_logging: config.full_logging,
            call_log: None,
        }
    }

    pub fn with_prompt_builder(mut self, prompts: PromptBuilder) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Append a [`CallRecord`] for every attempt to this JSONL file
    pub fn with_call_log(mut self, path: Option<PathBuf>) -> Self {
        self.call_log = path;
        self
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    pub fn prompts(&self) -> &PromptBuilder {
        &self.prompts
    }

    /// Build the analysis prompt for `input` and run it
    pub async fn analyze(
        &self,
        input: &AnalysisInput<'_>,
        correlation: &Correlation,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResult, UpstreamError> {
        let prompt = self.prompts.build_analysis_prompt(input);
        let ctx = CallContext {
            operation: "analyze",
            prompt: &prompt,
            correlation,
            cancel,
        };
        self.run(ctx, self.provider.analyze(&prompt), |result: &AnalysisResult| {
            serde_json::to_string(result).unwrap_or_default()
        })
        .await
    }

    pub async fn chat(
        &self,
        history: &[ChatMessage],
        user_context: Option<&str>,
        correlation: &Correlation,
        cancel: &CancellationToken,
    ) -> Result<String, UpstreamError> {
        let last = history.last().map(|m| m.content.as_str()).unwrap_or_default();
        let ctx = CallContext {
            operation: "chat",
            prompt: last,
            correlation,
            cancel,
        };
        self.run(ctx, self.provider.chat(history, user_context), |reply: &String| {
            reply.clone()
        })
        .await
    }

    pub async fn summarize(
        &self,
        history: &[ChatMessage],
        previous_summary: Option<&str>,
        correlation: &Correlation,
        cancel: &CancellationToken,
    ) -> Result<String, UpstreamError> {
        let description = format!("summarize {} messages", history.len());
        let ctx = CallContext {
            operation: "summarize",
            prompt: &description,
            correlation,
            cancel,
        };
        self.run(
            ctx,
            self.provider.summarize(history, previous_summary),
            |summary: &String| summary.clone(),
        )
        .await
    }

    async fn run<T, F, D>(
        &self,
        ctx: CallContext<'_>,
        call: F,
        describe: D,
    ) -> Result<T, UpstreamError>
    where
        F: Future<Output = Result<T, UpstreamError>>,
        D: Fn(&T) -> String,
    {
        let prompt_preview = preview(ctx.prompt, self.full_logging);
        tracing::info!(
            operation = ctx.operation,
            provider = self.provider.name(),
            model = self.provider.model(),
            user_id = ctx.correlation.user_id.as_deref().unwrap_or("-"),
            todo_id = ctx.correlation.todo_id.as_deref().unwrap_or("-"),
            request_id = ctx.correlation.request_id.as_deref().unwrap_or("-"),
            prompt = %prompt_preview,
            "upstream call started"
        );

        let started = Instant::now();
        let result = if ctx.cancel.is_cancelled() {
            Err(UpstreamError::Cancelled)
        } else {
            tokio::select! {
                biased;
                _ = ctx.cancel.cancelled() => Err(UpstreamError::Cancelled),
                outcome = tokio::time::timeout(self.timeout, call) => {
                    outcome.unwrap_or(Err(UpstreamError::Timeout(self.timeout)))
                }
            }
        };
        let duration_ms = started.elapsed().as_millis() as u64;

        let response_preview = result
            .as_ref()
            .ok()
            .map(|value| preview(&describe(value), self.full_logging));

        match &result {
            Ok(_) => tracing::info!(
                operation = ctx.operation,
                provider = self.provider.name(),
                duration_ms,
                response = response_preview.as_deref().unwrap_or_default(),
                "upstream call succeeded"
            ),
            Err(err) => tracing::warn!(
                operation = ctx.operation,
                provider = self.provider.name(),
                duration_ms,
                error_kind = err.kind().as_str(),
                error = %err,
                "upstream call failed"
            ),
        }

        self.record(&ctx, prompt_preview, response_preview, duration_ms, &result)
            .await;
        result
    }

    /// Append the call record on the blocking pool. Awaited so the record is on
    /// disk before the caller sees the result.
    async fn record<T>(
        &self,
        ctx: &CallContext<'_>,
        prompt_preview: String,
        response_preview: Option<String>,
        duration_ms: u64,
        result: &Result<T, UpstreamError>,
    ) {
        let Some(path) = self.call_log.clone() else {
            return;
        };

        let outcome = match result {
            Ok(_) => CallOutcome::Success,
            Err(UpstreamError::Timeout(_)) => CallOutcome::Timeout,
            Err(UpstreamError::Cancelled) => CallOutcome::Cancelled,
            Err(_) => CallOutcome::Failure,
        };
        let error = result.as_ref().err();

        let record = CallRecord {
            timestamp: Utc::now(),
            operation: ctx.operation.to_string(),
            provider: self.provider.name().to_string(),
            model: self.provider.model().to_string(),
            correlation: ctx.correlation.clone(),
            prompt_preview,
            response_preview,
            duration_ms,
            outcome,
            error_kind: error.map(|e| e.kind().as_str().to_string()),
            error_message: error.map(|e| preview(&e.to_string(), self.full_logging)),
        };

        let write = tokio::task::spawn_blocking(move || {
            let written = append_jsonl(&path, &record);
            (path, written)
        });
        match write.await {
            Ok((_, Ok(()))) => {}
            Ok((path, Err(e))) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to write call log");
            }
            Err(e) => tracing::warn!(error = %e, "call log writer panicked"),
        }
    }
}

impl std::fmt::Debug for UpstreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamClient")
            .field("provider", &self.provider.name())
            .field("model", &self.provider.model())
            .field("timeout", &self.timeout)
            .field("full_logging", &self.full_logging)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, ErrorKind};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tagwise_core::{TagStatistics, TagUsageStats, TimeHorizon};
    use tagwise_telemetry::read_jsonl;

    enum Behavior {
        Reply(String),
        Fail(UpstreamError),
        Hang,
    }

    struct ScriptedProvider {
        behavior: Behavior,
        calls: AtomicUsize,
        last_prompt: std::sync::Mutex<String>,
    }

    impl ScriptedProvider {
        fn new(behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                behavior,
                calls: AtomicUsize::new(0),
                last_prompt: std::sync::Mutex::new(String::new()),
            })
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "scripted-1"
        }

        async fn complete(&self, messages: &[ChatMessage]) -> Result<String, UpstreamError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(last) = messages.last() {
                *self.last_prompt.lock().unwrap() = last.content.clone();
            }
            match &self.behavior {
                Behavior::Reply(text) => Ok(text.clone()),
                Behavior::Fail(err) => Err(err.clone()),
                Behavior::Hang => std::future::pending().await,
            }
        }
    }

    fn client(provider: Arc<ScriptedProvider>) -> UpstreamClient {
        UpstreamClient::new(provider, &ProviderConfig::default())
    }

    #[tokio::test]
    async fn test_analyze_builds_prompt_with_tags() {
        let reply = r#"{"tags":["garden"],"time_horizon":"this_month"}"#;
        let provider = ScriptedProvider::new(Behavior::Reply(reply.into()));
        let mut stats = TagStatistics::new();
        stats.tags.insert("garden".to_string(), TagUsageStats::with_total(4));
        let input = AnalysisInput {
            statistics: Some(&stats),
            ..AnalysisInput::new("plant tulips", Utc::now())
        };

        let result = client(provider.clone())
            .analyze(&input, &Correlation::for_user("u1"), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.time_horizon, TimeHorizon::ThisMonth);
        assert!(provider.last_prompt.lock().unwrap().contains("- garden (used 4 times)"));
    }

    #[tokio::test]
    async fn test_errors_pass_through_unchanged() {
        let provider = ScriptedProvider::new(Behavior::Fail(ApiError::new(429, "slow").into()));
        let err = client(provider)
            .chat(
                &[ChatMessage::user("hi")],
                None,
                &Correlation::default(),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransientRateLimit);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_other_error() {
        let provider = ScriptedProvider::new(Behavior::Hang);
        let err = client(provider)
            .with_timeout(Duration::from_secs(30))
            .chat(
                &[ChatMessage::user("hi")],
                None,
                &Correlation::default(),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, UpstreamError::Timeout(d) if d == Duration::from_secs(30)));
        assert_eq!(err.kind(), ErrorKind::Other);
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_cancel_aborts_in_flight_call() {
        let provider = ScriptedProvider::new(Behavior::Hang);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let err = client(provider)
            .summarize(&[ChatMessage::user("x")], None, &Correlation::default(), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Cancelled));
    }

    #[tokio::test]
    async fn test_already_cancelled_skips_provider() {
        let provider = ScriptedProvider::new(Behavior::Reply("unused".into()));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = client(provider.clone())
            .chat(&[ChatMessage::user("hi")], None, &Correlation::default(), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Cancelled));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_call_log_records_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("calls.jsonl");

        let ok = client(ScriptedProvider::new(Behavior::Reply("fine".into())))
            .with_call_log(Some(log.clone()));
        let failing = client(ScriptedProvider::new(Behavior::Fail(
            UpstreamError::from_message("insufficient_quota"),
        )))
        .with_call_log(Some(log.clone()));
        let correlation = Correlation::for_user("u7").with_request("req-1");

        ok.chat(&[ChatMessage::user("hello")], None, &correlation, &CancellationToken::new())
            .await
            .unwrap();
        failing
            .chat(&[ChatMessage::user("hello")], None, &correlation, &CancellationToken::new())
            .await
            .unwrap_err();

        let records: Vec<CallRecord> = read_jsonl(&log).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].outcome, CallOutcome::Success);
        assert_eq!(records[0].response_preview.as_deref(), Some("fine"));
        assert_eq!(records[1].outcome, CallOutcome::Failure);
        assert_eq!(records[1].error_kind.as_deref(), Some("quota"));
        assert_eq!(records[1].correlation.request_id.as_deref(), Some("req-1"));
    }

    #[tokio::test]
    async fn test_unwritable_call_log_does_not_fail_call() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened for appending
        let client = client(ScriptedProvider::new(Behavior::Reply("fine".into())))
            .with_call_log(Some(dir.path().to_path_buf()));

        let reply = client
            .chat(
                &[ChatMessage::user("hello")],
                None,
                &Correlation::default(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(reply, "fine");
    }
}
