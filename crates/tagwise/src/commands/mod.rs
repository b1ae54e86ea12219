pub mod analyze;
pub mod backoff;
pub mod calls;
pub mod chat;
pub mod classify;
pub mod curate;
pub mod prompt;
pub mod version;

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use std::path::{Path, PathBuf};
use tagwise_core::{AppConfig, Metadata, PromptBuilder, TagStatistics};
use tagwise_telemetry::Paths;
use tagwise_upstream::{ProviderRegistry, UpstreamClient};

pub fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    match path {
        Some(path) => {
            AppConfig::load(path).with_context(|| format!("loading {}", path.display()))
        }
        None => AppConfig::load_default(),
    }
}

/// Read tag statistics from either a statistics object or an array of todo metadata
pub fn load_statistics(path: &Path) -> anyhow::Result<TagStatistics> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;

    if value.is_array() {
        let records: Vec<Metadata> = serde_json::from_value(value)?;
        Ok(TagStatistics::from_metadata(&records))
    } else {
        Ok(serde_json::from_value(value)?)
    }
}

/// Accepts `YYYY-MM-DD` (midnight UTC) or an RFC 3339 timestamp
pub fn parse_time(value: &str) -> anyhow::Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| anyhow::anyhow!("invalid date: {value}"))?;
        return Ok(midnight.and_utc());
    }
    let parsed = DateTime::parse_from_rfc3339(value)
        .with_context(|| format!("expected YYYY-MM-DD or RFC 3339 timestamp, got {value:?}"))?;
    Ok(parsed.with_timezone(&Utc))
}

/// Call log location: the configured path, else the default under the tagwise home
pub fn call_log_path(config: &AppConfig) -> anyhow::Result<PathBuf> {
    match &config.call_log {
        Some(path) => Ok(path.clone()),
        None => Ok(Paths::new()?.call_log_file()),
    }
}

/// Resolve the configured provider and wrap it in a client
pub fn build_client(config: &AppConfig) -> anyhow::Result<UpstreamClient> {
    let registry = ProviderRegistry::with_defaults();
    let provider = registry
        .resolve_configured(&config.provider)
        .with_context(|| format!("available providers: {}", registry.names().join(", ")))?;

    tracing::debug!(provider = provider.name(), model = provider.model(), "resolved provider");

    Ok(UpstreamClient::new(provider, &config.provider)
        .with_prompt_builder(PromptBuilder::new(config.curation.clone()))
        .with_call_log(Some(call_log_path(config)?)))
}
