//! Upstream error taxonomy and classification

use crate::extract::extract_json_object;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Code the upstream uses when the account is out of credit
pub const INSUFFICIENT_QUOTA: &str = "insufficient_quota";

const RATE_LIMIT_TYPE: &str = "rate_limit_error";
const TRANSIENT_MARKERS: &[&str] = &["429", "rate limit", "too many requests"];
const PERMANENT_MARKERS: &[&str] = &[INSUFFICIENT_QUOTA, "quota", "billing"];

/// How an upstream failure should be retried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Throttled; retry after a short backoff
    TransientRateLimit,
    /// Quota or billing exhausted; retry only after a long delay
    PermanentQuota,
    /// Network, timeout, server error or anything unrecognized
    Other,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::TransientRateLimit => "rate_limit",
            ErrorKind::PermanentQuota => "quota",
            ErrorKind::Other => "other",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error reported by the upstream API
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("upstream API error (status {status}): {message}")]
pub struct ApiError {
    pub message: String,
    pub error_type: Option<String>,
    pub code: Option<String>,
    pub status: u16,
    /// Delay the upstream asked for before retrying
    pub retry_after: Option<Duration>,
    /// Quota exhaustion rather than throttling
    pub is_permanent: bool,
}

impl ApiError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_type: None,
            code: None,
            status,
            retry_after: None,
            is_permanent: false,
        }
    }

    pub fn with_type(mut self, error_type: impl Into<String>) -> Self {
        self.error_type = Some(error_type.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        let code = code.into();
        self.is_permanent = self.is_permanent || code == INSUFFICIENT_QUOTA;
        self.code = Some(code);
        self
    }

    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }

    pub fn permanent(mut self) -> Self {
        self.is_permanent = true;
        self
    }

    /// Recover a structured error from an upstream message that mentions 429.
    ///
    /// The JSON object embedded in the message (first `{` to last `}`) is read for
    /// `message`, `type` and `code`. When no object can be read, the raw message
    /// is kept with type `rate_limit_error`. Messages without `429` yield `None`.
    pub fn from_rate_limit_message(message: &str) -> Option<Self> {
        if !message.contains("429") {
            return None;
        }

        let parsed = extract_json_object(message).and_then(|body| parse_error_body(429, body));
        Some(parsed.unwrap_or_else(|| {
            ApiError::new(429, message.trim()).with_type(RATE_LIMIT_TYPE)
        }))
    }

    /// Build from a non-success HTTP response
    pub fn from_response(status: u16, body: &str, retry_after: Option<Duration>) -> Self {
        let mut err = parse_error_body(status, body).unwrap_or_else(|| {
            let message = if body.trim().is_empty() {
                format!("HTTP {}", status)
            } else {
                body.trim().to_string()
            };
            let err = ApiError::new(status, message);
            if status == 429 {
                err.with_type(RATE_LIMIT_TYPE)
            } else {
                err
            }
        });
        err.retry_after = retry_after;
        err
    }
}

/// Parse `{message, type, code}`, also accepting it wrapped as `{"error": {...}}`
fn parse_error_body(status: u16, body: &str) -> Option<ApiError> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let object = match value.get("error") {
        Some(inner) if inner.is_object() => inner,
        _ => &value,
    };
    if !object.is_object() {
        return None;
    }

    let message = object
        .get("message")
        .and_then(|m| m.as_str())
        .unwrap_or(body)
        .to_string();
    let mut err = ApiError::new(status, message);
    if let Some(error_type) = object.get("type").and_then(|t| t.as_str()) {
        err = err.with_type(error_type);
    }
    match object.get("code") {
        Some(serde_json::Value::String(code)) => err = err.with_code(code.as_str()),
        Some(serde_json::Value::Number(code)) => err = err.with_code(code.to_string()),
        _ => {}
    }
    Some(err)
}

/// Failure of an upstream call
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Unstructured error text from the upstream
    #[error("upstream error: {0}")]
    Message(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("upstream call timed out after {0:?}")]
    Timeout(Duration),

    #[error("upstream call cancelled")]
    Cancelled,

    /// The call succeeded but produced no result to use
    #[error("upstream returned no choices")]
    NoChoicesReturned,

    /// The reply could not be read as the expected JSON
    #[error("malformed upstream response: {detail}")]
    MalformedResponse { detail: String, content: String },
}

impl UpstreamError {
    /// Convert raw upstream error text, recovering structure where possible
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        match ApiError::from_rate_limit_message(&message) {
            Some(api) => UpstreamError::Api(api),
            None => UpstreamError::Message(message),
        }
    }

    pub fn malformed(detail: impl Into<String>, content: impl Into<String>) -> Self {
        UpstreamError::MalformedResponse {
            detail: detail.into(),
            content: content.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        classify(self)
    }

    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            UpstreamError::Api(api) => Some(api),
            _ => None,
        }
    }

    /// Retry delay suggested by the upstream, if any
    pub fn retry_after(&self) -> Option<Duration> {
        self.api_error().and_then(|api| api.retry_after)
    }

    /// Whether a caller-owned retry loop should try again
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            UpstreamError::Cancelled
                | UpstreamError::NoChoicesReturned
                | UpstreamError::MalformedResponse { .. }
        )
    }
}

/// Classify an upstream error
pub fn classify(err: &UpstreamError) -> ErrorKind {
    match err {
        UpstreamError::Api(api) => classify_api(api),
        UpstreamError::Message(message) | UpstreamError::Transport(message) => {
            classify_message(message)
        }
        UpstreamError::Timeout(_)
        | UpstreamError::Cancelled
        | UpstreamError::NoChoicesReturned
        | UpstreamError::MalformedResponse { .. } => ErrorKind::Other,
    }
}

fn classify_api(api: &ApiError) -> ErrorKind {
    if api.is_permanent || api.code.as_deref() == Some(INSUFFICIENT_QUOTA) {
        ErrorKind::PermanentQuota
    } else if api.status == 429 {
        ErrorKind::TransientRateLimit
    } else {
        ErrorKind::Other
    }
}

/// Classify unstructured error text by case-insensitive markers.
///
/// Quota markers are checked first: quota exhaustion is often reported with a
/// 429 status as well.
pub fn classify_message(message: &str) -> ErrorKind {
    let lower = message.to_lowercase();
    if PERMANENT_MARKERS.iter().any(|m| lower.contains(m)) {
        ErrorKind::PermanentQuota
    } else if TRANSIENT_MARKERS.iter().any(|m| lower.contains(m)) {
        ErrorKind::TransientRateLimit
    } else {
        ErrorKind::Other
    }
}

/// Classify any error, looking through its source chain for upstream errors first
pub fn classify_dyn(err: &(dyn std::error::Error + 'static)) -> ErrorKind {
    let mut current = Some(err);
    let mut text = Vec::new();
    while let Some(e) = current {
        if let Some(upstream) = e.downcast_ref::<UpstreamError>() {
            return classify(upstream);
        }
        if let Some(api) = e.downcast_ref::<ApiError>() {
            return classify_api(api);
        }
        text.push(e.to_string());
        current = e.source();
    }
    classify_message(&text.join(": "))
}

pub fn classify_anyhow(err: &anyhow::Error) -> ErrorKind {
    classify_dyn(err.as_ref())
}
