//! Parley - terminal client for the conversation backend
//!
#![doc = "Main entry point for the Parley command-line client."]

use std::process::ExitCode;

use anyhow::Result;
use colored::Colorize;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use parley::auth::RegisterRequest;
use parley::cli::{Cli, Commands};
use parley::commands::{self, App};
use parley::config::Config;
use parley::gateway::SessionEvent;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/parley.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    let app = App::from_config(&config)?;
    let mut session_events = app.session_events();

    // A 401 on the login endpoint means bad credentials, not an expired session.
    let expects_session = !matches!(
        cli.command,
        Commands::Login { .. } | Commands::Register { .. }
    );

    let succeeded = match cli.command {
        Commands::Login { email, password } => {
            tracing::debug!("Logging in as {}", email);
            commands::account::login(&app, email, password).await?
        }
        Commands::Register {
            email,
            username,
            birthday,
            education,
            password,
        } => {
            let request = RegisterRequest {
                email,
                username,
                birthday,
                education,
                password: password.unwrap_or_default(),
            };
            commands::account::register(&app, request).await?
        }
        Commands::Logout => commands::account::logout(&app)?,
        Commands::Whoami => commands::account::whoami(&app)?,
        Commands::List { json } => commands::conversations::list(&app, json).await?,
        Commands::Delete { id, yes } => commands::conversations::delete(&app, id, yes).await?,
        Commands::New => commands::conversations::new(&app)?,
    };

    if expects_session && session_expired(&mut session_events) {
        eprintln!(
            "{} Run {} to sign in again.",
            "Your session has expired.".yellow(),
            "parley login --email <EMAIL>".cyan()
        );
    }

    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Drains the session bus and reports whether an expiry was published.
fn session_expired(rx: &mut broadcast::Receiver<SessionEvent>) -> bool {
    let mut expired = false;
    loop {
        match rx.try_recv() {
            Ok(SessionEvent::Expired) => expired = true,
            Err(broadcast::error::TryRecvError::Lagged(_)) => expired = true,
            Err(_) => return expired,
        }
    }
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "parley=debug" } else { "parley=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
