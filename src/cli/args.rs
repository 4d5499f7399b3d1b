use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use crate::core::PackageStatus;

#[derive(Parser, Debug)]
#[command(
    name = "unipkg",
    about = "Resolve, download, install and launch packages from many sources",
    long_about = "One front-end over app stores, manifest repositories and source hosts. \
                  Packages are addressed by URN (urn:<namespace>:<parts>), web URL or unipkg:// link.",
    version,
    next_line_help = false,
    term_width = 80
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalFlags,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug)]
pub struct GlobalFlags {
    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Quiet mode
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print results as JSON on stdout
    #[arg(long, global = true)]
    pub json: bool,
}

/// Depth `resolve` should reach before returning.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusArg {
    Basic,
    Details,
}

impl From<StatusArg> for PackageStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Basic => PackageStatus::BasicDetails,
            StatusArg::Details => PackageStatus::Details,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show a package from a URN, web URL or unipkg:// link
    Resolve {
        /// URN, URL or deep link
        target: String,

        /// How much detail to fetch
        #[arg(long, value_enum, default_value = "details")]
        status: StatusArg,
    },

    /// Search every enabled handler
    Search {
        query: String,

        /// Keep at most this many results
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Quick search suggestions
    Suggest { query: String },

    /// Featured packages from every handler
    Featured,

    /// Collections from every handler
    Collections,

    /// Download the package's installer or archive
    Download { target: String },

    /// Download (if needed) and install a package
    Install { target: String },

    /// Launch an installed package
    Launch { target: String },

    /// List handlers, or enable/disable one
    Handlers {
        #[command(subcommand)]
        action: Option<HandlersAction>,
    },

    /// Sign in to an account handler with a token
    SignIn {
        /// Account handler id (e.g. gh-user)
        account: String,

        /// Access token; without it the browser sign-in URL is printed
        #[arg(long)]
        token: Option<String>,
    },

    /// Sign out of an account handler
    SignOut { account: String },

    /// Complete a sign-in from a unipkg://auth/... redirect
    Activate { url: String },

    /// Generate shell completions
    #[command(hide = true)]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum HandlersAction {
    /// Enable a handler
    Enable { id: String },
    /// Disable a handler
    Disable { id: String },
}
