use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Status value meaning the conversation's generated document is ready.
pub const DONE_STATUS: &str = "done";

/// Title given to conversations created locally.
pub const NEW_CONVERSATION_TITLE: &str = "New Conversation";

/// Prefix of ids generated for unsaved local conversations.
pub const LOCAL_ID_PREFIX: &str = "new-chat-";

/// One chat thread as shown in the conversation list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Server-assigned id, or `new-chat-<ULID>` for unsaved items
    pub id: String,
    /// Display title, never empty
    pub title: String,
    /// Whether the attached generated document is ready
    pub has_completed_artifact: bool,
    /// Last update as an ISO-8601 string, passed through from the server
    pub updated_at: Option<String>,
}

impl Conversation {
    /// Title used when the server sends none.
    pub fn default_title(id: &str) -> String {
        format!("Conversation {}", id)
    }

    /// An unsaved conversation created on this client at `now`.
    pub fn local(id: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: NEW_CONVERSATION_TITLE.to_string(),
            has_completed_artifact: false,
            updated_at: Some(now.to_rfc3339_opts(SecondsFormat::Millis, true)),
        }
    }

    /// `true` for conversations that only exist on this client.
    pub fn is_local(&self) -> bool {
        self.id.starts_with(LOCAL_ID_PREFIX)
    }
}

/// Chat ids arrive as strings or numbers depending on the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ChatId {
    /// String id
    Text(String),
    /// Numeric id
    Number(i64),
}

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatId::Text(s) => f.write_str(s),
            ChatId::Number(n) => write!(f, "{}", n),
        }
    }
}

/// One element of the `GET /chats` response.
///
/// Only `id` is strict. The other fields tolerate any JSON type so one odd
/// record cannot fail the whole list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatRecord {
    pub id: ChatId,
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub status: Option<String>,
    #[serde(
        default,
        rename = "updatedAt",
        alias = "updated_at",
        deserialize_with = "lenient_text"
    )]
    pub updated_at: Option<String>,
}

/// Reads any JSON value as optional text.
///
/// Strings are kept, non-zero numbers and `true` are rendered, everything
/// else (`null`, `0`, `false`, arrays, objects) is absent.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Some(serde_json::Value::Bool(true)) => Some("true".to_string()),
        _ => None,
    })
}

impl From<ChatRecord> for Conversation {
    fn from(record: ChatRecord) -> Self {
        let id = record.id.to_string();
        let title = record
            .title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| Conversation::default_title(&id));
        Self {
            has_completed_artifact: record.status.as_deref() == Some(DONE_STATUS),
            title,
            updated_at: record.updated_at,
            id,
        }
    }
}

/// The conversation a delete confirmation is pending for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteTarget {
    pub id: String,
    pub title: String,
}

/// Two-step delete confirmation workflow.
///
/// A pending target exists exactly when confirmation is open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DeleteWorkflow {
    /// No confirmation open
    #[default]
    Idle,
    /// Waiting for the user to confirm or cancel
    AwaitingConfirmation(DeleteTarget),
}

/// Everything the conversation list view renders from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationListState {
    /// Server order, with local items prepended
    pub conversations: Vec<Conversation>,
    /// Currently selected conversation
    pub active_conversation_id: Option<String>,
    /// Delete confirmation state
    pub delete: DeleteWorkflow,
}

impl ConversationListState {
    /// Target of the open delete confirmation.
    pub fn pending_delete(&self) -> Option<&DeleteTarget> {
        match &self.delete {
            DeleteWorkflow::Idle => None,
            DeleteWorkflow::AwaitingConfirmation(target) => Some(target),
        }
    }

    /// Whether a delete confirmation is open.
    pub fn is_delete_confirmation_open(&self) -> bool {
        matches!(self.delete, DeleteWorkflow::AwaitingConfirmation(_))
    }

    /// Whether a conversation with `id` is in the list.
    pub fn contains(&self, id: &str) -> bool {
        self.conversations.iter().any(|c| c.id == id)
    }

    /// The selected conversation, if it is in the list.
    pub fn active_conversation(&self) -> Option<&Conversation> {
        let active = self.active_conversation_id.as_deref()?;
        self.conversations.iter().find(|c| c.id == active)
    }

    /// Replaces the list with `conversations`.
    ///
    /// Selects the first item when nothing is active, and reselects when the
    /// active id did not survive the replacement.
    pub fn replace_conversations(&mut self, conversations: Vec<Conversation>) {
        self.conversations = conversations;

        let active_survived = self
            .active_conversation_id
            .as_deref()
            .map_or(false, |id| self.contains(id));

        if !active_survived {
            self.active_conversation_id = self.first_id();
        }
    }

    /// Removes the first conversation with `id`.
    ///
    /// When it was the active one, the first remaining item (or nothing)
    /// becomes active.
    pub fn remove_conversation(&mut self, id: &str) -> Option<Conversation> {
        let index = self.conversations.iter().position(|c| c.id == id)?;
        let removed = self.conversations.remove(index);

        if self.active_conversation_id.as_deref() == Some(id) {
            self.active_conversation_id = self.first_id();
        }

        Some(removed)
    }

    /// Puts `conversation` at the top of the list and selects it.
    pub fn prepend_and_activate(&mut self, conversation: Conversation) {
        self.active_conversation_id = Some(conversation.id.clone());
        self.conversations.insert(0, conversation);
    }

    fn first_id(&self) -> Option<String> {
        self.conversations.first().map(|c| c.id.clone())
    }
}
