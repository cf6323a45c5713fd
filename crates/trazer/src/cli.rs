//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Read, filter and sync the SMS inbox.
#[derive(Parser)]
#[command(name = "trazer")]
#[command(version, about = "Read, filter and sync the SMS inbox", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Settings file to use instead of the one in the config directory
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List inbox messages passing the current filters
    Messages(MessagesArgs),
    /// Message counts per sender
    Overview {
        /// Path to the message database
        #[arg(long)]
        inbox: PathBuf,
    },
    /// Show or change saved settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Sign in with email and password
    Login {
        /// Account email
        #[arg(long)]
        email: String,
        /// Account password
        #[arg(long)]
        password: String,
    },
    /// Sign in with a Google ID token
    LoginGoogle {
        /// ID token obtained from Google sign-in
        #[arg(long)]
        id_token: String,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show sign-in and inbox access state
    Status,
}

#[derive(Args)]
pub struct MessagesArgs {
    /// Path to the message database
    #[arg(long)]
    pub inbox: PathBuf,

    /// Text message bodies must contain, ignoring case
    #[arg(long, short, default_value = "")]
    pub query: String,

    /// Sender filter for this run instead of the saved one
    #[arg(long, short)]
    pub sender: Option<String>,

    /// Show every field of each message
    #[arg(long)]
    pub details: bool,

    /// Upload the messages to Firestore (requires sign-in)
    #[arg(long)]
    pub sync: bool,

    /// Upload the messages to the local SQLite mirror
    #[arg(long, conflicts_with = "sync")]
    pub local_mirror: bool,
}

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print the saved settings
    Show,
    /// Save the sender filter (empty string clears it)
    Sender {
        /// Substring sender addresses must contain
        value: String,
    },
    /// Save the body pattern (empty string clears it)
    Pattern {
        /// Regular expression message bodies must match
        value: String,
    },
    /// Allow reading the SMS inbox
    Grant,
    /// Revoke access to the SMS inbox
    Revoke,
}
