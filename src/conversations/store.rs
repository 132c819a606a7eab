//! Conversation list state manager
//!
//! [`ConversationStore`] owns the [`ConversationListState`] and is the only
//! thing that mutates it. Every operation takes `&self`: the state sits behind
//! a mutex that is released before any network call, so operations driven
//! concurrently on one task interleave only at their `.await` points.
//!
//! # Failure handling
//!
//! No operation returns an error. Network failures are logged and turned into
//! exactly one [`Notifier`] message, and the state is left as it was before
//! the call (except for the delete workflow, which always ends `Idle`).
//!
//! # Fetch/delete race
//!
//! A fetch that was sent before a delete completed can land afterwards and
//! still contain the deleted item. With [`FetchPolicy::Replace`] the item
//! comes back; with [`FetchPolicy::SkipDeleted`] ids deleted while the fetch
//! was in flight are filtered out of its result.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use ulid::{Generator, Ulid};

use crate::config::FetchPolicy;
use crate::conversations::service::ChatService;
use crate::conversations::types::{
    Conversation, ConversationListState, DeleteTarget, DeleteWorkflow, LOCAL_ID_PREFIX,
};
use crate::gateway::RequestGateway;
use crate::notify::{Notifier, Severity};

pub const FETCH_FAILED_MESSAGE: &str = "Could not load conversations.";
pub const DELETE_SUCCEEDED_MESSAGE: &str = "Conversation deleted successfully!";
pub const DELETE_FAILED_MESSAGE: &str = "Could not delete conversation.";

/// What [`ConversationStore::fetch_conversations`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The list was replaced with this many conversations
    Replaced(usize),
    /// The backend returned no data; state untouched
    NoData,
    /// The call failed and a notification was sent; state untouched
    Failed,
}

/// What [`ConversationStore::confirm_delete`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Nothing was pending; no call was made
    NothingPending,
    /// The backend deleted the target and it was removed locally
    Deleted(DeleteTarget),
    /// The backend call failed; the list is unchanged
    Failed(DeleteTarget),
}

struct Inner {
    state: ConversationListState,
    ids: Generator,
    fetches_in_flight: usize,
    // Ids deleted while at least one fetch was in flight. Only kept under
    // `FetchPolicy::SkipDeleted`; cleared once no fetch is in flight.
    deleted_during_fetch: Vec<(u64, String)>,
    delete_seq: u64,
}

impl Inner {
    fn next_local_id(&mut self) -> String {
        loop {
            let ulid = self.ids.generate().unwrap_or_else(|_| Ulid::new());
            let id = format!("{}{}", LOCAL_ID_PREFIX, ulid);
            if !self.state.contains(&id) {
                return id;
            }
        }
    }
}

/// Marks one fetch as in flight until dropped.
///
/// Dropping also covers a fetch future cancelled at its `.await`, so the
/// count always returns to zero and the deletion log is released.
struct FetchInFlight<'a> {
    inner: &'a Mutex<Inner>,
}

impl<'a> FetchInFlight<'a> {
    /// Registers a fetch and returns the delete sequence it started at.
    fn begin(inner: &'a Mutex<Inner>) -> (Self, u64) {
        let started_at = {
            let mut guard = inner.lock();
            guard.fetches_in_flight += 1;
            guard.delete_seq
        };
        (Self { inner }, started_at)
    }
}

impl Drop for FetchInFlight<'_> {
    fn drop(&mut self) {
        let mut inner = self.inner.lock();
        inner.fetches_in_flight = inner.fetches_in_flight.saturating_sub(1);
        if inner.fetches_in_flight == 0 {
            inner.deleted_during_fetch.clear();
        }
    }
}

/// Authoritative in-memory view of the conversation list.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use parley::conversations::ConversationStore;
/// use parley::credentials::{CredentialStore, MemoryStore};
/// use parley::gateway::http::HttpTransport;
/// use parley::gateway::{RequestGateway, SessionEvents};
/// use parley::notify::TracingNotifier;
///
/// # async fn example() -> parley::error::Result<()> {
/// let transport = HttpTransport::new(
///     url::Url::parse("http://localhost:3000")?,
///     std::time::Duration::from_secs(30),
///     "parley",
/// )?;
/// let gateway = RequestGateway::new(
///     Arc::new(transport),
///     CredentialStore::new(Arc::new(MemoryStore::new())),
///     SessionEvents::new(),
/// );
/// let store = ConversationStore::new(gateway, Arc::new(TracingNotifier));
///
/// store.fetch_conversations().await;
/// if let Some(first) = store.conversations().first() {
///     store.request_delete(first.id.clone(), first.title.clone());
///     store.confirm_delete().await;
/// }
/// # Ok(())
/// # }
/// ```
pub struct ConversationStore {
    service: ChatService,
    notifier: Arc<dyn Notifier>,
    policy: FetchPolicy,
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for ConversationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationStore")
            .field("policy", &self.policy)
            .field("state", &self.inner.lock().state)
            .finish_non_exhaustive()
    }
}

impl ConversationStore {
    /// Creates an empty store using [`FetchPolicy::Replace`].
    pub fn new(gateway: RequestGateway, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            service: ChatService::new(gateway),
            notifier,
            policy: FetchPolicy::default(),
            inner: Mutex::new(Inner {
                state: ConversationListState::default(),
                ids: Generator::new(),
                fetches_in_flight: 0,
                deleted_during_fetch: Vec::new(),
                delete_seq: 0,
            }),
        }
    }

    /// Sets how fetch results are reconciled with concurrent deletes.
    pub fn with_fetch_policy(mut self, policy: FetchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn fetch_policy(&self) -> FetchPolicy {
        self.policy
    }

    /// Loads the conversation list from the backend and replaces the local
    /// list with it.
    ///
    /// Unsaved local conversations are dropped unless the server already
    /// knows them. When nothing is active the first item becomes active.
    pub async fn fetch_conversations(&self) -> FetchOutcome {
        let (in_flight, fetch_started_at) = FetchInFlight::begin(&self.inner);

        let result = self.service.list_chats().await;

        let outcome = {
            let mut inner = self.inner.lock();

            let outcome = match result {
                Ok(Some(records)) => {
                    let mut conversations: Vec<Conversation> =
                        records.into_iter().map(Conversation::from).collect();

                    if self.policy == FetchPolicy::SkipDeleted {
                        let deleted: HashSet<&str> = inner
                            .deleted_during_fetch
                            .iter()
                            .filter(|(seq, _)| *seq > fetch_started_at)
                            .map(|(_, id)| id.as_str())
                            .collect();
                        if !deleted.is_empty() {
                            tracing::debug!(
                                "Skipping {} conversation(s) deleted during fetch",
                                deleted.len()
                            );
                            conversations.retain(|c| !deleted.contains(c.id.as_str()));
                        }
                    }

                    let count = conversations.len();
                    inner.state.replace_conversations(conversations);
                    tracing::debug!("Loaded {} conversation(s)", count);
                    FetchOutcome::Replaced(count)
                }
                Ok(None) => {
                    tracing::debug!("Conversation list response carried no data");
                    FetchOutcome::NoData
                }
                Err(e) => {
                    tracing::error!("Failed to fetch conversations: {:#}", e);
                    FetchOutcome::Failed
                }
            };
            outcome
        };
        drop(in_flight);

        if outcome == FetchOutcome::Failed {
            self.notifier.notify(FETCH_FAILED_MESSAGE, Severity::Error);
        }
        outcome
    }

    /// Opens the delete confirmation for `id`. The last call wins.
    pub fn request_delete(&self, id: impl Into<String>, title: impl Into<String>) {
        let target = DeleteTarget {
            id: id.into(),
            title: title.into(),
        };
        self.inner.lock().state.delete = DeleteWorkflow::AwaitingConfirmation(target);
    }

    /// Closes the delete confirmation without deleting anything.
    pub fn cancel_delete(&self) {
        self.inner.lock().state.delete = DeleteWorkflow::Idle;
    }

    /// Deletes the pending target on the backend.
    ///
    /// The confirmation is closed whether or not the call succeeds.
    pub async fn confirm_delete(&self) -> DeleteOutcome {
        let target = match self.inner.lock().state.pending_delete().cloned() {
            Some(target) => target,
            None => return DeleteOutcome::NothingPending,
        };

        let result = self.service.delete_chat(&target.id).await;

        {
            let mut inner = self.inner.lock();
            if result.is_ok() {
                inner.state.remove_conversation(&target.id);
                if self.policy == FetchPolicy::SkipDeleted && inner.fetches_in_flight > 0 {
                    inner.delete_seq += 1;
                    let seq = inner.delete_seq;
                    inner.deleted_during_fetch.push((seq, target.id.clone()));
                }
            }
            inner.state.delete = DeleteWorkflow::Idle;
        }

        match result {
            Ok(()) => {
                tracing::info!("Deleted conversation {}", target.id);
                self.notifier
                    .notify(DELETE_SUCCEEDED_MESSAGE, Severity::Success);
                DeleteOutcome::Deleted(target)
            }
            Err(e) => {
                tracing::error!("Failed to delete conversation {}: {:#}", target.id, e);
                self.notifier.notify(DELETE_FAILED_MESSAGE, Severity::Error);
                DeleteOutcome::Failed(target)
            }
        }
    }

    /// Adds an unsaved conversation at the top of the list and selects it.
    ///
    /// Nothing is sent to the backend.
    pub fn create_local_conversation(&self) -> Conversation {
        let mut inner = self.inner.lock();
        let id = inner.next_local_id();
        let conversation = Conversation::local(id, Utc::now());
        inner.state.prepend_and_activate(conversation.clone());
        conversation
    }

    /// Selects `id` without checking that it is in the list.
    pub fn set_active_conversation_id(&self, id: Option<String>) {
        self.inner.lock().state.active_conversation_id = id;
    }

    /// Copy of the whole state.
    pub fn snapshot(&self) -> ConversationListState {
        self.inner.lock().state.clone()
    }

    pub fn conversations(&self) -> Vec<Conversation> {
        self.inner.lock().state.conversations.clone()
    }

    pub fn active_conversation_id(&self) -> Option<String> {
        self.inner.lock().state.active_conversation_id.clone()
    }

    pub fn active_conversation(&self) -> Option<Conversation> {
        self.inner.lock().state.active_conversation().cloned()
    }

    pub fn pending_delete(&self) -> Option<DeleteTarget> {
        self.inner.lock().state.pending_delete().cloned()
    }

    pub fn is_delete_confirmation_open(&self) -> bool {
        self.inner.lock().state.is_delete_confirmation_open()
    }

    /// Gateway used for backend calls.
    pub fn gateway(&self) -> &RequestGateway {
        self.service.gateway()
    }
}
