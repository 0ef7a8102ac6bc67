//! Command-line arguments.

use clap::{Args, Parser, Subcommand};
use spamslam_core::SortMode;

#[derive(Parser, Debug)]
#[command(
    name = "spamslam",
    about = "Find the companies that email you, then unsubscribe or ask them to delete your data",
    version,
    long_about = None
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Override the AI proxy URL
    #[arg(long, global = true, env = "SPAMSLAM_AI_URL")]
    pub ai_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect a Gmail account with an OAuth access token
    Connect {
        /// Access token with Gmail read/compose and profile scopes
        #[arg(long, env = "SPAMSLAM_TOKEN", hide_env_values = true)]
        token: String,
    },

    /// Forget the connected account and its inventory
    Disconnect,

    /// Show the connected account
    Whoami,

    /// Scan the mailbox and rebuild the company inventory
    Scan,

    /// List companies
    List(ViewArgs),

    /// Show everything known about one company
    Show {
        /// Company domain
        domain: String,
    },

    /// Select companies
    Select {
        /// Company domains
        #[arg(required = true)]
        domains: Vec<String>,
    },

    /// Deselect companies
    Deselect {
        /// Company domains
        #[arg(required = true)]
        domains: Vec<String>,
    },

    /// Select (or clear) every company on a page
    SelectPage {
        #[command(flatten)]
        view: ViewArgs,

        /// Deselect instead of select
        #[arg(long)]
        clear: bool,
    },

    /// Generate unsubscribe steps (defaults to the selected companies)
    Unsubscribe {
        /// Company domains
        domains: Vec<String>,
    },

    /// Generate data deletion requests (defaults to the selected companies)
    RequestDeletion {
        /// Company domains
        domains: Vec<String>,
    },

    /// Create a Gmail draft from a company's deletion request
    Draft {
        /// Company domain
        domain: String,
    },

    /// Manage the settings file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Filter, sort and page selection for the company grid.
#[derive(Args, Debug, Default)]
pub struct ViewArgs {
    /// Search domains, senders and subjects
    #[arg(short, long)]
    pub query: Option<String>,

    /// Sort order: frequency, recency or alphabetical
    #[arg(short, long)]
    pub sort: Option<SortMode>,

    /// Page number
    #[arg(short, long)]
    pub page: Option<usize>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum ConfigAction {
    /// Print the current settings
    Show,
    /// Print the settings file location
    Path,
    /// Write the settings file with defaults if it does not exist
    Init,
}
