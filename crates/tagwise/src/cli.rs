use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tagwise")]
#[command(version)]
#[command(about = "Tag curation and AI request handling for todo lists")]
pub struct Cli {
    /// Path to config.json (defaults to ~/.tagwise/config.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print version information
    Version,

    /// Rank a user's existing tags for a todo
    Curate {
        /// Tag statistics JSON, or a JSON array of todo metadata
        #[arg(short, long)]
        stats: PathBuf,

        /// Todo text
        #[arg(short, long)]
        text: String,

        #[arg(long)]
        max_tags: Option<usize>,

        /// Token budget for the tag listing
        #[arg(long)]
        budget: Option<usize>,
    },

    /// Print the analysis prompt for a todo
    Prompt {
        #[command(flatten)]
        todo: TodoArgs,
    },

    /// Classify an upstream error message
    Classify {
        #[arg(short, long)]
        message: String,
    },

    /// Show the retry schedule for an error kind
    Backoff {
        #[arg(short, long, value_enum)]
        kind: KindArg,

        /// Number of attempts to show
        #[arg(short, long, default_value_t = 6)]
        attempts: u32,

        /// Suggested delay from the upstream, in seconds
        #[arg(long)]
        retry_after: Option<u64>,
    },

    /// Ask the configured provider for tags and a time horizon
    Analyze {
        #[command(flatten)]
        todo: TodoArgs,

        /// Todo metadata JSON to merge the suggested tags into
        #[arg(long)]
        metadata: Option<PathBuf>,

        #[arg(long)]
        user: Option<String>,

        #[arg(long)]
        todo_id: Option<String>,
    },

    /// Interactive chat session (/summary, /quit)
    Chat {
        #[arg(short, long, default_value = "local")]
        user: String,
    },

    /// Show recorded upstream calls
    Calls {
        /// Show statistics summary
        #[arg(long)]
        stats: bool,

        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct TodoArgs {
    /// Todo text
    #[arg(short, long)]
    pub text: String,

    /// Due date: YYYY-MM-DD or RFC 3339 timestamp
    #[arg(long)]
    pub due: Option<String>,

    /// Creation time (defaults to now)
    #[arg(long)]
    pub created: Option<String>,

    /// Tag statistics JSON, or a JSON array of todo metadata
    #[arg(short, long)]
    pub stats: Option<PathBuf>,

    /// Known user preferences
    #[arg(long)]
    pub context: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindArg {
    RateLimit,
    Quota,
    Other,
}
