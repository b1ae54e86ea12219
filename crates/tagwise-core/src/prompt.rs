//! Prompt assembly for tag analysis, chat and preference summaries

use crate::config::CurationConfig;
use crate::curator::{format_tag_line, TagCurator};
use crate::stats::TagStatistics;
use crate::types::{ChatMessage, TimeHorizon};
use chrono::{DateTime, SecondsFormat, Timelike, Utc};

const TAG_REUSE_GUIDANCE: &str = "Prefer reusing one of these existing tags when it fits the task. \
Only suggest a new tag when none of the existing tags apply.";

/// Everything known about a todo at analysis time
#[derive(Debug, Clone, Copy)]
pub struct AnalysisInput<'a> {
    pub text: &'a str,
    pub due: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Rolling summary of the user's preferences, if any
    pub user_context: Option<&'a str>,
    pub statistics: Option<&'a TagStatistics>,
}

impl<'a> AnalysisInput<'a> {
    pub fn new(text: &'a str, created_at: DateTime<Utc>) -> Self {
        Self {
            text,
            due: None,
            created_at,
            user_context: None,
            statistics: None,
        }
    }
}

/// Builds the natural-language requests sent upstream
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    curator: TagCurator,
    fixed_now: Option<DateTime<Utc>>,
}

impl PromptBuilder {
    pub fn new(curation: CurationConfig) -> Self {
        Self {
            curator: TagCurator::new(curation),
            fixed_now: None,
        }
    }

    /// Freeze the clock used for "current time" framing
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.fixed_now = Some(now);
        self
    }

    fn now(&self) -> DateTime<Utc> {
        self.fixed_now.unwrap_or_else(Utc::now)
    }

    pub fn build_analysis_prompt(&self, input: &AnalysisInput<'_>) -> String {
        let now = self.now();
        let mut lines = vec![
            "Analyze the following todo item. Suggest categorization tags and decide how soon it should be handled.".to_string(),
            String::new(),
            format!("Todo: \"{}\"", input.text.trim()),
            String::new(),
            format!("Current time: {} ({})", format_timestamp(now), now.format("%A")),
            format!(
                "Created: {} ({})",
                format_timestamp(input.created_at),
                created_note(now, input.created_at)
            ),
        ];

        if let Some(due) = input.due {
            if is_date_only(due) {
                lines.push(format!(
                    "Due date: {} (date only, no specific time)",
                    due.format("%Y-%m-%d")
                ));
            } else {
                lines.push(format!("Due: {} (specific time)", format_timestamp(due)));
            }
            if let Some(note) = urgency_note(now, due) {
                lines.push(format!("Urgency: {}", note));
            }
        }

        lines.push(String::new());
        lines.extend(output_format_lines());

        if let Some(section) = input.statistics.and_then(|s| self.tag_section(s, input.text)) {
            lines.push(String::new());
            lines.extend(section);
        }

        if let Some(summary) = input.user_context.map(str::trim).filter(|s| !s.is_empty()) {
            lines.push(String::new());
            lines.push("User preferences:".to_string());
            lines.push(summary.to_string());
        }

        lines.join("\n")
    }

    fn tag_section(&self, stats: &TagStatistics, text: &str) -> Option<Vec<String>> {
        if stats.is_empty() {
            return None;
        }
        let selected = self.curator.select(&stats.tags, text);
        if selected.is_empty() {
            return None;
        }

        let mut lines = vec!["Existing tags for this user:".to_string()];
        lines.extend(
            selected
                .iter()
                .filter_map(|tag| stats.get(tag).map(|usage| format_tag_line(tag, usage))),
        );
        lines.push(TAG_REUSE_GUIDANCE.to_string());
        Some(lines)
    }

    /// System message framing a chat turn
    pub fn build_chat_system_prompt(&self, user_context: Option<&str>) -> String {
        let mut prompt = "You are a helpful assistant inside a todo list app. Help the user plan, \
organize and prioritize their tasks. Keep answers short and practical."
            .to_string();
        if let Some(context) = user_context.map(str::trim).filter(|c| !c.is_empty()) {
            prompt.push_str("\n\nWhat you know about this user's preferences:\n");
            prompt.push_str(context);
        }
        prompt
    }

    /// Request to fold a conversation into the user's preference summary
    pub fn build_summary_prompt(
        &self,
        messages: &[ChatMessage],
        previous_summary: Option<&str>,
    ) -> String {
        let mut lines = vec![
            "Summarize what this conversation reveals about how the user organizes and prioritizes tasks: preferred tags, working hours, recurring commitments, priorities.".to_string(),
            "Write at most 100 words of plain text. Keep facts from the previous summary unless the conversation contradicts them.".to_string(),
        ];

        if let Some(previous) = previous_summary.map(str::trim).filter(|p| !p.is_empty()) {
            lines.push(String::new());
            lines.push("Previous summary:".to_string());
            lines.push(previous.to_string());
        }

        lines.push(String::new());
        lines.push("Conversation:".to_string());
        lines.extend(
            messages
                .iter()
                .map(|m| format!("{}: {}", m.role.as_str(), m.content)),
        );
        lines.join("\n")
    }
}

fn output_format_lines() -> Vec<String> {
    let horizons: Vec<String> = TimeHorizon::ALL
        .iter()
        .map(|h| format!("\"{}\"", h.as_str()))
        .collect();
    vec![
        "Respond with a single JSON object and nothing else, in exactly this format:".to_string(),
        r#"{"tags": ["tag1", "tag2"], "time_horizon": "this_week"}"#.to_string(),
        "- \"tags\": 1 to 5 short, lowercase tags describing the task".to_string(),
        format!("- \"time_horizon\": one of {}", horizons.join(", ")),
    ]
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn is_date_only(ts: DateTime<Utc>) -> bool {
    ts.hour() == 0 && ts.minute() == 0 && ts.second() == 0
}

fn created_note(now: DateTime<Utc>, created_at: DateTime<Utc>) -> String {
    let days = (now - created_at).num_hours().div_euclid(24).max(0);
    match days {
        0 => "today".to_string(),
        1 => "yesterday".to_string(),
        n => format!("{} days ago", n),
    }
}

fn urgency_note(now: DateTime<Utc>, due: DateTime<Utc>) -> Option<&'static str> {
    // Truncating division: anything less than a full day away counts as today
    let days_until = (due - now).num_hours() / 24;
    match days_until {
        d if d < 0 => Some("This task is overdue."),
        0 => Some("This task is due today."),
        1 => Some("This task is due very soon."),
        d if d <= 7 => Some("This task is due within a week."),
        _ => None,
    }
}
