//! Command-line interface for strictly_scores.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Strictly Scores - time-ranked 2048 leaderboard service
#[derive(Parser, Debug)]
#[command(name = "strictly_scores")]
#[command(about = "Validates, stores and ranks finished 2048 runs", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the SQLite database (overrides config and environment)
    #[arg(long, global = true)]
    pub db_path: Option<String>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP leaderboard server
    Serve {
        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
    },

    /// Apply pending database migrations and exit
    Migrate,

    /// Register an account nickname
    AddAccount {
        /// Nickname shown on the leaderboard
        nickname: String,
    },

    /// Print the leaderboard
    Leaderboard {
        /// Number of rows (1-100)
        #[arg(short, long)]
        limit: Option<i64>,
    },

    /// Print an account's recent scores
    History {
        /// Account nickname
        nickname: String,

        /// Number of rows (1-50)
        #[arg(short, long)]
        limit: Option<i64>,
    },
}
