use super::{load_config, load_statistics, parse_time};
use crate::cli::TodoArgs;
use chrono::{DateTime, Utc};
use std::path::Path;
use tagwise_core::{AnalysisInput, PromptBuilder, TagStatistics};

/// Parsed form of the todo arguments shared by `prompt` and `analyze`
pub struct TodoInput {
    pub text: String,
    pub due: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub context: Option<String>,
    pub statistics: Option<TagStatistics>,
}

impl TodoInput {
    pub fn from_args(args: &TodoArgs) -> anyhow::Result<Self> {
        Ok(Self {
            text: args.text.clone(),
            due: args.due.as_deref().map(parse_time).transpose()?,
            created_at: match args.created.as_deref() {
                Some(created) => parse_time(created)?,
                None => Utc::now(),
            },
            context: args.context.clone(),
            statistics: args.stats.as_deref().map(load_statistics).transpose()?,
        })
    }

    pub fn as_analysis(&self) -> AnalysisInput<'_> {
        AnalysisInput {
            text: &self.text,
            due: self.due,
            created_at: self.created_at,
            user_context: self.context.as_deref(),
            statistics: self.statistics.as_ref(),
        }
    }
}

pub fn run(config: Option<&Path>, args: &TodoArgs) -> anyhow::Result<()> {
    let config = load_config(config)?;
    let todo = TodoInput::from_args(args)?;
    let prompt = PromptBuilder::new(config.curation).build_analysis_prompt(&todo.as_analysis());
    println!("{prompt}");
    Ok(())
}
