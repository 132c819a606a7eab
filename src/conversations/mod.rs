//! Conversation list management
//!
//! # Module Layout
//!
//! - [`types`]   -- conversation, wire record and list state types
//! - [`service`] -- typed calls to the `/chats` endpoints
//! - [`store`]   -- [`ConversationStore`], the only writer of list state

pub mod service;
pub mod store;
pub mod types;

pub use service::ChatService;
pub use store::{
    ConversationStore, DeleteOutcome, FetchOutcome, DELETE_FAILED_MESSAGE,
    DELETE_SUCCEEDED_MESSAGE, FETCH_FAILED_MESSAGE,
};
pub use types::{
    ChatId, ChatRecord, Conversation, ConversationListState, DeleteTarget, DeleteWorkflow,
};
