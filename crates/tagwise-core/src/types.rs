//! Core types shared by the prompt builder and upstream providers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Time horizon (urgency) classification of a todo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeHorizon {
    /// Should be handled today
    Today,
    /// Within the next seven days
    ThisWeek,
    /// Within the next month
    ThisMonth,
    /// No pressing deadline
    Later,
}

impl TimeHorizon {
    pub const ALL: [TimeHorizon; 4] = [
        TimeHorizon::Today,
        TimeHorizon::ThisWeek,
        TimeHorizon::ThisMonth,
        TimeHorizon::Later,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeHorizon::Today => "today",
            TimeHorizon::ThisWeek => "this_week",
            TimeHorizon::ThisMonth => "this_month",
            TimeHorizon::Later => "later",
        }
    }
}

impl fmt::Display for TimeHorizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeHorizon {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        TimeHorizon::ALL
            .into_iter()
            .find(|h| h.as_str() == normalized)
            .ok_or_else(|| format!("unknown time horizon: {}", s))
    }
}

/// Parsed reply of a tag analysis call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub tags: Vec<String>,
    pub time_horizon: TimeHorizon,
}

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A single chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}
