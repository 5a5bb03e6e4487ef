use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tabsync_core::export::ExportFormat;

use crate::config_profiles::RemoteKind;

#[derive(Parser)]
#[command(name = "tabsync")]
#[command(about = "Save, restore and sync browser window sessions")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// CLI profile name for remote sync configuration
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Save every open window as a new session
    Save {
        /// Session name
        name: Vec<String>,
    },
    /// List saved sessions
    #[command(alias = "ls")]
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the windows and tabs of a session
    Show {
        /// Session ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replace the open windows with a saved session
    Restore {
        /// Session ID
        id: String,
    },
    /// Delete a saved session
    #[command(alias = "rm")]
    Delete {
        /// Session ID
        id: String,
    },
    /// Export all sessions
    Export {
        /// Export format (inferred from the output extension when omitted)
        #[arg(long, value_enum)]
        format: Option<ExportFormatArg>,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Import sessions from a previous export
    Import {
        /// File to import
        path: PathBuf,
        /// Import format (inferred from the file extension when omitted)
        #[arg(long, value_enum)]
        format: Option<ExportFormatArg>,
    },
    /// Sync sessions with the configured remote now
    Sync,
    /// Sync periodically until interrupted, then sync one final time
    Daemon {
        /// Minutes between syncs (defaults to the saved preference)
        #[arg(long, value_name = "MINUTES")]
        interval: Option<u64>,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Manage the Drive access token of a profile
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormatArg {
    Json,
    Txt,
    Html,
}

impl From<ExportFormatArg> for ExportFormat {
    fn from(value: ExportFormatArg) -> Self {
        match value {
            ExportFormatArg::Json => Self::Json,
            ExportFormatArg::Txt => Self::Txt,
            ExportFormatArg::Html => Self::Html,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update profile config
    Init {
        /// Profile name to initialize
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// Remote backend for the sync document
        #[arg(long, value_enum)]
        remote: Option<RemoteKind>,
        /// Folder holding the sync document (folder remote)
        #[arg(long, value_name = "PATH")]
        folder: Option<PathBuf>,
        /// Drive API base URL override
        #[arg(long, value_name = "URL")]
        drive_api_base_url: Option<String>,
        /// Drive upload base URL override
        #[arg(long, value_name = "URL")]
        drive_upload_base_url: Option<String>,
        /// File describing the open browser windows
        #[arg(long, value_name = "PATH")]
        window_state: Option<PathBuf>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
    /// Show the resolved profile config
    Show,
    /// Set the minutes between periodic syncs
    SetInterval {
        /// Minutes between syncs
        minutes: u32,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Store a Drive access token in the keychain
    Login {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// Access token (read from stdin when omitted)
        #[arg(long, value_name = "TOKEN")]
        token: Option<String>,
    },
    /// Show auth status for profile
    Status {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
    },
    /// Remove the stored access token
    Logout {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
    },
}
