//! JSON extraction from model replies

use crate::error::UpstreamError;
use serde::Deserialize;
use tagwise_core::{AnalysisResult, TimeHorizon};
use tagwise_telemetry::preview;

/// Slice from the first `{` to the last `}`, if they appear in that order
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

#[derive(Debug, Deserialize)]
struct RawAnalysis {
    #[serde(default)]
    tags: Vec<String>,
    #[serde(alias = "timeHorizon", alias = "urgency")]
    time_horizon: String,
}

/// Parse an analysis reply.
///
/// Replies wrapped in prose or code fences get one extraction attempt of the
/// outermost JSON object before failing as malformed.
pub fn parse_analysis(content: &str) -> Result<AnalysisResult, UpstreamError> {
    let raw: RawAnalysis = match serde_json::from_str(content.trim()) {
        Ok(raw) => raw,
        Err(first) => {
            let body = extract_json_object(content).ok_or_else(|| {
                UpstreamError::malformed(first.to_string(), preview(content, false))
            })?;
            serde_json::from_str(body)
                .map_err(|e| UpstreamError::malformed(e.to_string(), preview(content, false)))?
        }
    };

    let time_horizon: TimeHorizon = raw
        .time_horizon
        .parse()
        .map_err(|e: String| UpstreamError::malformed(e, preview(content, false)))?;

    let mut tags: Vec<String> = Vec::with_capacity(raw.tags.len());
    for tag in raw.tags {
        let tag = tag.trim();
        if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }

    Ok(AnalysisResult { tags, time_horizon })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_object() {
        assert_eq!(extract_json_object("x {\"a\":{}} y"), Some("{\"a\":{}}"));
        assert_eq!(extract_json_object("no braces"), None);
        assert_eq!(extract_json_object("} backwards {"), None);
    }

    #[test]
    fn test_parse_plain_json() {
        let result =
            parse_analysis(r#"{"tags":["errands","shopping"],"time_horizon":"today"}"#).unwrap();
        assert_eq!(result.tags, vec!["errands", "shopping"]);
        assert_eq!(result.time_horizon, TimeHorizon::Today);
    }

    #[test]
    fn test_parse_fenced_reply() {
        let reply = "Sure! Here you go:\n```json\n{\"tags\": [\" work \", \"\", \"work\"], \"time_horizon\": \"this_week\"}\n```";
        let result = parse_analysis(reply).unwrap();
        assert_eq!(result.tags, vec!["work"]);
        assert_eq!(result.time_horizon, TimeHorizon::ThisWeek);
    }

    #[test]
    fn test_parse_garbage_is_malformed() {
        let err = parse_analysis("I cannot help with that.").unwrap_err();
        assert!(matches!(err, UpstreamError::MalformedResponse { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_parse_unknown_horizon_is_malformed() {
        let err = parse_analysis(r#"{"tags":[],"time_horizon":"eventually"}"#).unwrap_err();
        assert!(matches!(err, UpstreamError::MalformedResponse { .. }));
    }
}
