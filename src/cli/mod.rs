//! Command-line interface for clubdesk.

mod commands;

use clap::{Parser, Subcommand};

/// clubdesk - club membership and roster backend
#[derive(Parser)]
#[command(name = "clubdesk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API and the OTP purge job (default)
    #[command(alias = "daemon")]
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Manage role ranks used to order the roster
    Role {
        #[command(subcommand)]
        command: RoleCommands,
    },

    /// Print stored year ranges, newest first, and the default selection
    Years,
}

#[derive(Subcommand)]
pub enum RoleCommands {
    /// Add a role with its rank (lower ranks are listed first)
    Add {
        /// Role name as it appears on roster members
        name: String,
        /// Sort key; 1 is shown first
        rank: i32,
    },
    /// List role ranks
    #[command(alias = "ls")]
    List,
}

pub use commands::*;
