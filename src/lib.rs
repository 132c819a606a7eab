//! Parley - chat client core library
//!
//! This library provides the client-side core of a conversational assistant:
//! an authenticated request gateway and the conversation list state manager
//! built on top of it.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `gateway`: Authenticated request pipeline and session-expired bus
//! - `credentials`: Bearer token persistence (file, keyring, memory)
//! - `conversations`: Conversation list state and the `/chats` service
//! - `auth`: Registration and login
//! - `notify`: User-facing notification sink
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli` / `commands`: Command-line interface
//!
//! # Example
//!
//! ```no_run
//! use parley::commands::App;
//! use parley::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/parley.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let app = App::from_config(&config)?;
//!     app.store.fetch_conversations().await;
//!     for conversation in app.store.conversations() {
//!         println!("{} {}", conversation.id, conversation.title);
//!     }
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod conversations;
pub mod credentials;
pub mod error;
pub mod gateway;
pub mod notify;

// Re-export commonly used types
pub use auth::AuthClient;
pub use config::Config;
pub use conversations::{Conversation, ConversationStore};
pub use error::{ParleyError, Result};
pub use gateway::{RequestGateway, SessionEvent, SessionEvents};
pub use notify::{Notifier, Severity};

#[cfg(test)]
pub mod test_utils;
