use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use jarvis_telemetry::{Action, Source};

#[derive(Parser)]
#[command(name = "jarvis")]
#[command(version)]
#[command(about = "Preference learning and recommendations for the Jarvis assistant")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record an interaction with a recommended item
    Record {
        /// Item identifier (video id, book id, article url)
        #[arg(long)]
        item: String,

        /// Category the item belongs to
        #[arg(short, long)]
        category: String,

        /// view, like, skip or complete
        #[arg(short, long)]
        action: Action,

        /// When it happened (RFC 3339, defaults to now)
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// Rebuild preference scores from the interaction log
    Recompute,

    /// Rank the content pool against current preferences
    Recommend {
        /// Number of recommendations (defaults to config)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Only recommend from this source
        #[arg(short, long)]
        source: Option<Source>,
    },

    /// Ingest candidate items from a JSONL file
    Ingest {
        /// Source the items were fetched from
        #[arg(short, long)]
        source: Source,

        /// Path to items JSONL (defaults to the source's drop file)
        #[arg(short, long)]
        file: Option<String>,
    },

    /// Show store health and counts
    Status,

    /// Summarize engagement patterns
    Insights {
        /// How many top categories to list
        #[arg(long, default_value_t = 5)]
        top: usize,
    },

    /// View interaction history
    History {
        /// Show statistics summary
        #[arg(long)]
        stats: bool,

        /// Number of interactions to list
        #[arg(short, long, default_value_t = 20)]
        limit: usize,

        /// Only show this category
        #[arg(short, long)]
        category: Option<String>,

        /// Only show the last N hours
        #[arg(long)]
        hours: Option<u64>,
    },

    /// Apply retention to the log and evict stale pool items
    Prune,

    /// Archive the interaction history and restore default preferences
    Reset,

    /// Run the scheduler until interrupted
    Run {
        /// Directory holding <source>.jsonl drop files
        #[arg(long)]
        drop_dir: Option<String>,
    },

    /// Print version information
    Version,
}
