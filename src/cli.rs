//! Command-line interface definition for Parley
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for account management and the conversation list.

use clap::{Parser, Subcommand};

use crate::config::CredentialBackend;

/// Parley - terminal client for the conversation backend
///
/// Log in, list your conversations and delete the ones you no longer need.
#[derive(Parser, Debug, Clone)]
#[command(name = "parley")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/parley.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the backend base URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Override where credentials are stored
    #[arg(long, value_enum, global = true)]
    pub credentials: Option<CredentialBackend>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Parley
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Log in and store the bearer token
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password; prompted for when omitted
        #[arg(short, long, env = "PARLEY_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Create an account, then log in with it
    Register {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        username: String,

        /// Date of birth, e.g. 1990-04-12
        #[arg(short, long)]
        birthday: String,

        /// Education level
        #[arg(long)]
        education: String,

        /// Account password; prompted for when omitted
        #[arg(short, long, env = "PARLEY_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Forget the stored token
    Logout,

    /// Show who is logged in
    Whoami,

    /// List conversations
    List {
        /// Output as JSON instead of a table
        #[arg(short, long)]
        json: bool,
    },

    /// Delete a conversation after confirmation
    Delete {
        /// Conversation id
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Start a new, unsaved conversation
    New,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/parley.yaml".to_string()),
            verbose: false,
            base_url: None,
            credentials: None,
            command: Commands::Whoami,
        }
    }
}
