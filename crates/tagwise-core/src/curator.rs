//! Selection of historical tags to offer the model as hints

use crate::config::CurationConfig;
use crate::similarity::similarity;
use crate::stats::TagUsageStats;
use std::collections::HashMap;
use tagwise_telemetry::estimate_tokens;

/// One-line display form of a tag, as rendered in the analysis prompt
pub fn format_tag_line(tag: &str, stats: &TagUsageStats) -> String {
    if stats.ai_count == 0 && stats.user_count == 0 {
        format!("- {} (used {} times)", tag, stats.total)
    } else {
        format!(
            "- {} (used {} times, {} AI-generated, {} user-defined)",
            tag, stats.total, stats.ai_count, stats.user_count
        )
    }
}

/// Select tags with the default weights. See [`TagCurator::select`].
pub fn select_tags(
    usage_by_tag: &HashMap<String, TagUsageStats>,
    todo_text: &str,
    max_tags: usize,
    max_token_budget: usize,
) -> Vec<String> {
    TagCurator::new(CurationConfig {
        max_tags,
        token_budget: max_token_budget,
        ..CurationConfig::default()
    })
    .select(usage_by_tag, todo_text)
}

#[derive(Debug)]
struct Candidate<'a> {
    tag: &'a str,
    stats: &'a TagUsageStats,
    score: f64,
}

/// Ranks a user's tags by usage and relevance to a todo
#[derive(Debug, Clone, Default)]
pub struct TagCurator {
    config: CurationConfig,
}

impl TagCurator {
    pub fn new(config: CurationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CurationConfig {
        &self.config
    }

    /// Score of a tag for the given todo text
    pub fn score(&self, tag: &str, stats: &TagUsageStats, todo_text: &str) -> f64 {
        self.config.frequency_weight * stats.total as f64
            + self.config.similarity_weight
                * self.config.similarity_scale
                * similarity(tag, todo_text)
    }

    /// Pick the highest scoring tags that fit both the count limit and the token
    /// budget.
    ///
    /// Ties are ordered by tag name. Selection is a strict prefix of the ranking:
    /// it stops at the first tag that does not fit instead of skipping ahead.
    pub fn select(
        &self,
        usage_by_tag: &HashMap<String, TagUsageStats>,
        todo_text: &str,
    ) -> Vec<String> {
        let max_tags = self.config.max_tags;
        let budget = self.config.token_budget;
        if usage_by_tag.is_empty() || max_tags == 0 || budget == 0 {
            return Vec::new();
        }

        let mut candidates: Vec<Candidate<'_>> = usage_by_tag
            .iter()
            .map(|(tag, stats)| Candidate {
                tag: tag.as_str(),
                stats,
                score: self.score(tag, stats, todo_text),
            })
            .collect();

        candidates.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.tag.cmp(b.tag)));

        let mut selected = Vec::new();
        let mut tokens_used = 0;
        for candidate in candidates {
            if selected.len() >= max_tags {
                break;
            }
            let cost = estimate_tokens(&format_tag_line(candidate.tag, candidate.stats));
            if tokens_used + cost > budget {
                break;
            }
            tokens_used += cost;
            selected.push(candidate.tag.to_string());
        }

        tracing::debug!(
            candidates = usage_by_tag.len(),
            selected = selected.len(),
            tokens_used,
            "curated tag hints"
        );
        selected
    }
}
