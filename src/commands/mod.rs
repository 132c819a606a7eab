/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

- `account`       -- login, register, logout, whoami
- `conversations` -- list, delete, new

Handlers share one [`App`], built from a [`Config`]. A handler returns
`Ok(false)` when it has already reported a failure to the user.
*/

use std::sync::Arc;

use rustyline::DefaultEditor;
use tokio::sync::broadcast;

use crate::auth::AuthClient;
use crate::config::Config;
use crate::conversations::ConversationStore;
use crate::credentials::CredentialStore;
use crate::error::Result;
use crate::gateway::http::HttpTransport;
use crate::gateway::{RequestGateway, SessionEvent, SessionEvents, Transport};
use crate::notify::{ConsoleNotifier, Notifier};

pub mod account;
pub mod conversations;

/// Everything a command needs, built once per invocation.
#[derive(Debug)]
pub struct App {
    pub store: ConversationStore,
    pub auth: AuthClient,
    events: SessionEvents,
}

impl App {
    /// Wires the real HTTP transport and the configured credential backend.
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = HttpTransport::from_config(&config.api)?;
        let credentials = CredentialStore::from_config(&config.credentials)?;
        Ok(Self::with_parts(
            config,
            Arc::new(transport),
            credentials,
            Arc::new(ConsoleNotifier),
        ))
    }

    /// Wires explicit collaborators.
    pub fn with_parts(
        config: &Config,
        transport: Arc<dyn Transport>,
        credentials: CredentialStore,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let events = SessionEvents::new();
        let gateway = RequestGateway::new(transport, credentials, events.clone());
        let store = ConversationStore::new(gateway.clone(), notifier)
            .with_fetch_policy(config.store.fetch_policy);
        Self {
            store,
            auth: AuthClient::new(gateway),
            events,
        }
    }

    /// Subscribes to session events published from now on.
    pub fn session_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

/// Reads one line from the terminal, without history.
pub(crate) fn prompt_line(prompt: &str) -> Result<Option<String>> {
    use rustyline::error::ReadlineError;

    let mut rl = DefaultEditor::new()?;
    match rl.readline(prompt) {
        Ok(line) => Ok(Some(line.trim().to_string())),
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
