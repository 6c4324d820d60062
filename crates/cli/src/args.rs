//! CLI argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// tweet-archive: browse and search an archive of tweets and toots
#[derive(Parser, Debug)]
#[command(name = "tweet-archive")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show a single post
    Show(ShowArgs),

    /// Keyword search over the archive
    Search(SearchArgs),

    /// Show the newest posts
    Latest(LatestArgs),

    /// List post ids in timestamp order
    Ids(IdsArgs),

    /// Show post counts per author and partition
    Stats(StatsArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Validate configuration and show status
    Doctor(DoctorArgs),
}

/// Output format for posts
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain-text summary
    #[default]
    Txt,
    /// Stored record as JSON
    Json,
    /// Rendered markup
    Html,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Post id
    pub id: String,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Txt)]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Whitespace-separated keywords, all of which must match (`*` matches all)
    pub keyword: String,

    /// Only posts by this author (`user@instance` selects a Mastodon account)
    #[arg(short, long)]
    pub user: Option<String>,

    /// Only posts in this partition
    #[arg(short, long)]
    pub index: Option<String>,

    /// Maximum number of results
    #[arg(long, default_value_t = 100)]
    pub limit: usize,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Txt)]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct LatestArgs {
    /// Number of posts
    #[arg(long, default_value_t = 10)]
    pub limit: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct IdsArgs {
    /// Newest first
    #[arg(long)]
    pub desc: bool,

    /// Stop after this many ids
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Init {
        /// Path to write config file
        #[arg(long, default_value = "./config.toml")]
        path: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
