//! Per-user tag usage statistics

use crate::metadata::{Metadata, TagSource};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Usage counters for one tag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagUsageStats {
    /// Todos bearing this tag
    pub total: usize,
    /// Todos where the tag was recorded as AI-suggested
    #[serde(default)]
    pub ai_count: usize,
    /// Todos where the tag was recorded as user-defined
    #[serde(default)]
    pub user_count: usize,
}

impl TagUsageStats {
    pub fn new(total: usize, ai_count: usize, user_count: usize) -> Self {
        Self {
            total,
            ai_count,
            user_count,
        }
    }

    pub fn with_total(total: usize) -> Self {
        Self::new(total, 0, 0)
    }
}

/// Aggregate tag usage for a single user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagStatistics {
    #[serde(default)]
    pub tags: HashMap<String, TagUsageStats>,
    /// Set when the counters are stale and need recomputing
    #[serde(default)]
    pub tainted: bool,
    #[serde(default)]
    pub analysis_version: u32,
}

impl TagStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build statistics from every todo's tag metadata
    pub fn from_metadata<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a Metadata>,
    {
        let mut stats = Self::new();
        for meta in records {
            stats.record(meta);
        }
        stats
    }

    /// Count one todo's tags
    pub fn record(&mut self, meta: &Metadata) {
        for tag in meta.tags() {
            let entry = self.tags.entry(tag.clone()).or_default();
            entry.total += 1;
            match meta.source_of(tag) {
                Some(TagSource::Ai) => entry.ai_count += 1,
                Some(TagSource::User) => entry.user_count += 1,
                None => {}
            }
        }
    }

    pub fn mark_tainted(&mut self) {
        self.tainted = true;
    }

    pub fn get(&self, tag: &str) -> Option<&TagUsageStats> {
        self.tags.get(tag)
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
