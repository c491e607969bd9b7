//! CLI module for Tubechat.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Tubechat - chat with YouTube videos
///
/// Fetches a video's transcript, indexes it, and answers questions about it.
#[derive(Parser, Debug)]
#[command(name = "tubechat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Fetch, chunk, and index a video's transcript
    Process {
        /// YouTube URL or 11-character video ID
        input: String,
    },

    /// Ask a question about a video, processing it first if needed
    Ask {
        /// YouTube URL or video ID
        video: String,

        /// The question to ask
        question: String,
    },

    /// Show whether a video has been processed
    Status {
        /// YouTube URL or video ID
        video: String,
    },
}
