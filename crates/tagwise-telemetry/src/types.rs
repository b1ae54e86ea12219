//! Upstream call records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Correlation identifiers attached to every upstream call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correlation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub todo_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl Correlation {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Self::default()
        }
    }

    pub fn with_todo(mut self, todo_id: impl Into<String>) -> Self {
        self.todo_id = Some(todo_id.into());
        self
    }

    pub fn with_request(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

/// Result of a single upstream attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOutcome {
    Success,
    Failure,
    Timeout,
    Cancelled,
}

/// One upstream call attempt, as written to the call log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRecord {
    pub timestamp: DateTime<Utc>,
    pub operation: String,
    pub provider: String,
    pub model: String,
    #[serde(default)]
    pub correlation: Correlation,
    pub prompt_preview: String,
    #[serde(default)]
    pub response_preview: Option<String>,
    pub duration_ms: u64,
    pub outcome: CallOutcome,
    #[serde(default)]
    pub error_kind: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}
