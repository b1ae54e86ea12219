//! Tag curation, tag provenance and prompt assembly

mod config;
mod curator;
mod metadata;
mod prompt;
mod similarity;
mod stats;
mod types;

pub use config::{AppConfig, ConfigError, CurationConfig, ProviderConfig, API_KEY_ENV};
pub use curator::{format_tag_line, select_tags, TagCurator};
pub use metadata::{Metadata, TagSource};
pub use prompt::{AnalysisInput, PromptBuilder};
pub use similarity::similarity;
pub use stats::{TagStatistics, TagUsageStats};
pub use types::{AnalysisResult, ChatMessage, Role, TimeHorizon};
