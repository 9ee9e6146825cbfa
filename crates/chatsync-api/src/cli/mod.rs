//! CLI command definitions for the `chatsync` binary.
//!
//! Uses clap derive macros; every command acts on one owner's conversations.

pub mod conversation;
pub mod stdin_stream;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Keep chat transcripts in sync with a local conversation store.
#[derive(Parser)]
#[command(name = "chatsync", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    /// Owner whose conversations to act on.
    #[arg(long, env = "CHATSYNC_OWNER", global = true)]
    pub owner: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List conversations, newest first.
    #[command(alias = "ls")]
    List,

    /// Open an empty conversation, reusing one if it exists.
    New,

    /// Show a conversation's transcript.
    Show {
        /// Conversation id.
        id: String,
    },

    /// Append a user message.
    Send {
        /// Conversation to send to (defaults to the newest).
        #[arg(long, short)]
        conversation: Option<String>,

        /// Message text.
        text: String,
    },

    /// Stream an assistant reply from standard input, one line per delta.
    Reply {
        /// Conversation to reply in (defaults to the newest).
        #[arg(long, short)]
        conversation: Option<String>,
    },

    /// Rename a conversation.
    Rename {
        /// Conversation id.
        id: String,

        /// New title.
        title: String,
    },

    /// Delete a conversation and its messages.
    #[command(alias = "rm")]
    Delete {
        /// Conversation id.
        id: String,

        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
