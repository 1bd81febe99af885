use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;

use crate::models::PostId;
use crate::mutator::LikeMode;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Community API URL ("/api" is appended when missing)
    #[arg(long, env = "FEEDSYNC_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Bearer token of the signed in user
    #[arg(long, env = "FEEDSYNC_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// How likes are shown before the server confirms them
    #[arg(long, value_enum, global = true)]
    pub like_mode: Option<LikeMode>,

    /// HTTP timeout in seconds
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Log verbosity
    #[arg(short, long, value_name = "LEVEL", default_value = "info", global = true)]
    pub log_level: LogLevel,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show community stats and the latest posts
    List {
        /// Only show the newest N posts
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Publish a post
    Post {
        /// Post content
        content: String,
    },
    /// Like or unlike a post
    Like {
        /// Post id
        post_id: PostId,
    },
    /// Delete one of your posts
    Delete {
        /// Post id
        post_id: PostId,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show the signed in user
    Whoami,
}

/// Verbosity of the log output on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    pub fn filter(self) -> LevelFilter {
        match self {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Off => LevelFilter::Off,
        }
    }
}
