use super::prompt::TodoInput;
use super::{build_client, load_config};
use crate::cli::TodoArgs;
use anyhow::Context;
use std::future::Future;
use std::path::Path;
use tagwise_core::{AnalysisResult, Metadata};
use tagwise_telemetry::{atomic_write, Correlation};
use tagwise_upstream::{BackoffPolicy, CancellationToken, ErrorKind, UpstreamError};

pub async fn run(
    config: Option<&Path>,
    args: &TodoArgs,
    metadata: Option<&Path>,
    user: Option<&str>,
    todo_id: Option<&str>,
) -> anyhow::Result<()> {
    let config = load_config(config)?;
    let todo = TodoInput::from_args(args)?;
    let client = build_client(&config)?;

    let mut correlation = Correlation::default().with_request(uuid::Uuid::new_v4().to_string());
    correlation.user_id = user.map(str::to_string);
    correlation.todo_id = todo_id.map(str::to_string);

    let cancel = cancel_on_ctrl_c();
    let input = todo.as_analysis();
    let (client, input, correlation, token) = (&client, &input, &correlation, &cancel);

    let result = with_retries(
        &BackoffPolicy::default(),
        config.provider.max_attempts,
        &cancel,
        move || client.analyze(input, correlation, token),
    )
    .await
    .context("analysis failed")?;

    println!("{}", serde_json::to_string_pretty(&result)?);

    if let Some(path) = metadata {
        let merged = merge_into_metadata(path, &result)?;
        println!(
            "Updated {} ({} tags, {} user-defined)",
            path.display(),
            merged.len(),
            merged.user_tags().len()
        );
    }
    Ok(())
}

fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupted, cancelling upstream call");
            token.cancel();
        }
    });
    cancel
}

/// Run `call` until it succeeds, sleeping between attempts as `policy` says.
///
/// Gives up on errors that cannot succeed on retry, on quota exhaustion (whose
/// delays are measured in hours) and after `max_attempts` attempts.
pub async fn with_retries<T, F, Fut>(
    policy: &BackoffPolicy,
    max_attempts: u32,
    cancel: &CancellationToken,
    mut call: F,
) -> Result<T, UpstreamError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, UpstreamError>>,
{
    let mut attempt = 0;
    loop {
        let err = match call().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        let kind = err.kind();
        if !err.is_retryable()
            || kind == ErrorKind::PermanentQuota
            || attempt + 1 >= max_attempts.max(1)
        {
            return Err(err);
        }

        let delay = policy.delay(&err, attempt);
        tracing::warn!(
            attempt,
            kind = kind.as_str(),
            delay_secs = delay.as_secs(),
            error = %err,
            "upstream call failed, retrying"
        );

        tokio::select! {
            _ = cancel.cancelled() => return Err(UpstreamError::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }
        attempt += 1;
    }
}

/// Merge suggested tags into the metadata file, keeping the user's own tags
fn merge_into_metadata(path: &Path, result: &AnalysisResult) -> anyhow::Result<Metadata> {
    let mut meta: Metadata = if path.exists() {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))?
    } else {
        Metadata::new()
    };
    if !meta.is_consistent() {
        anyhow::bail!(
            "{}: categoryTags and tagSources disagree, refusing to merge",
            path.display()
        );
    }

    let user_tags = meta.user_tags();
    meta.merge_tags(&result.tags, &user_tags);

    let json = serde_json::to_string_pretty(&meta)?;
    atomic_write(path, json.as_bytes())?;
    Ok(meta)
}
