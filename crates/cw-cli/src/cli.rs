//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Twitch chat presence tracker.
///
/// Polls a channel's chatter list, keeps per-viewer visit counts and watch
/// time, and rebuilds statistics from event logs.
#[derive(Debug, Parser)]
#[command(name = "cw", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Poll the channel and track watch time until interrupted.
    Watch {
        /// Channel login to watch (overrides config).
        #[arg(long)]
        channel: Option<String>,
    },

    /// Show the viewers with the most watch time.
    Top {
        /// Number of viewers to show (defaults to `top_n` from config).
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Write the per-viewer report sorted by last visit.
    Report,

    /// Rebuild the session table from an event log.
    Reconstruct {
        /// Log file to read (defaults to the all-time log).
        log: Option<PathBuf>,

        /// Close sessions still open at the end of the log at the current time.
        #[arg(long)]
        force_close: bool,
    },

    /// Merge run logs into the all-time log, then rebuild the session table.
    Archive,

    /// Regenerate the aggregate by replaying an event log.
    Rebuild {
        /// Log file to replay (defaults to the all-time log).
        log: Option<PathBuf>,

        /// Close sessions still open at the end of the log at the current time.
        #[arg(long)]
        force_close: bool,
    },

    /// Manage ignored accounts.
    #[command(subcommand)]
    Ignore(IgnoreAction),

    /// Show data directory, configuration, and aggregate summary.
    Status,

    /// Look up a channel's broadcaster id.
    Channel {
        /// Channel login.
        login: String,
    },
}

/// Ignore-list operations.
#[derive(Debug, Subcommand)]
pub enum IgnoreAction {
    /// Add an account to the ignore list.
    Add { name: String },
    /// Remove an account from the ignore list.
    Remove { name: String },
    /// List ignored accounts.
    List,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["cw", "top", "-n", "5", "--verbose"]);
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Some(Commands::Top {
                limit: Some(5),
                json: false
            })
        ));
    }

    #[test]
    fn parses_ignore_subcommands() {
        let cli = Cli::parse_from(["cw", "ignore", "add", "SomeBot"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Ignore(IgnoreAction::Add { name })) if name == "SomeBot"
        ));
    }
}
