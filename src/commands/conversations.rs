//! Conversation list command handlers

use colored::Colorize;
use prettytable::{format, Table};

use crate::commands::{prompt_line, App};
use crate::conversations::{Conversation, DeleteOutcome, FetchOutcome};
use crate::error::Result;

const MAX_TITLE_CHARS: usize = 40;

/// `parley list`
///
/// Returns `false` when the list could not be loaded.
pub async fn list(app: &App, json: bool) -> Result<bool> {
    let outcome = app.store.fetch_conversations().await;
    if outcome == FetchOutcome::Failed {
        return Ok(false);
    }

    let conversations = app.store.conversations();

    if json {
        println!("{}", serde_json::to_string_pretty(&conversations)?);
        return Ok(true);
    }

    if conversations.is_empty() {
        println!("{}", "No conversations yet.".yellow());
        println!("Use {} to start one.", "parley new".cyan());
        return Ok(true);
    }

    let active = app.store.active_conversation_id();
    let table = conversation_table(&conversations, active.as_deref());
    println!("\nConversations:");
    table.printstd();
    println!();
    Ok(true)
}

/// `parley delete <id>`
///
/// Loads the list so the confirmation can show the title, then runs the
/// two-step delete.
pub async fn delete(app: &App, id: String, yes: bool) -> Result<bool> {
    if app.store.fetch_conversations().await == FetchOutcome::Failed {
        return Ok(false);
    }

    let title = app
        .store
        .conversations()
        .into_iter()
        .find(|c| c.id == id)
        .map(|c| c.title)
        .ok_or_else(|| anyhow::anyhow!("no conversation with id {}", id))?;

    app.store.request_delete(id, title.clone());

    if !yes && !confirm(&title)? {
        app.store.cancel_delete();
        println!("{}", "Cancelled.".yellow());
        return Ok(true);
    }

    let outcome = app.store.confirm_delete().await;
    Ok(matches!(outcome, DeleteOutcome::Deleted(_)))
}

/// `parley new`
///
/// The conversation only lives in this process until its first message is
/// sent, so this mostly previews what would be created.
pub fn new(app: &App) -> Result<bool> {
    let conversation = app.store.create_local_conversation();
    println!(
        "{} {} ({})",
        "Started".green(),
        conversation.title.bold(),
        conversation.id.cyan()
    );
    println!("{}", "Unsaved until the first message is sent.".dimmed());
    Ok(true)
}

fn confirm(title: &str) -> Result<bool> {
    let prompt = format!("Delete \"{}\"? This cannot be undone. [y/N] ", title);
    let answer = prompt_line(&prompt)?.unwrap_or_default();
    Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
}

fn conversation_table(conversations: &[Conversation], active: Option<&str>) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "".bold(),
        "ID".bold(),
        "Title".bold(),
        "Document".bold(),
        "Last Updated".bold()
    ]);

    for conversation in conversations {
        let marker = if Some(conversation.id.as_str()) == active {
            "*".green().to_string()
        } else {
            String::new()
        };
        let document = if conversation.has_completed_artifact {
            "ready".green().to_string()
        } else {
            "-".to_string()
        };
        let updated = conversation
            .updated_at
            .as_deref()
            .map(format_timestamp)
            .unwrap_or_else(|| "-".to_string());

        table.add_row(prettytable::row![
            marker,
            conversation.id.cyan(),
            truncate_title(&conversation.title),
            document,
            updated
        ]);
    }

    table
}

fn truncate_title(title: &str) -> String {
    if title.chars().count() > MAX_TITLE_CHARS {
        let head: String = title.chars().take(MAX_TITLE_CHARS - 3).collect();
        format!("{}...", head)
    } else {
        title.to_string()
    }
}

// Server timestamps are passed through untouched; only reformat what parses.
fn format_timestamp(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|t| {
            t.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        })
        .unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use crate::config::Config;
    use crate::credentials::{CredentialStore, MemoryStore};
    use crate::test_utils::{chats_json, RecordingNotifier, Reply, ScriptedTransport};

    fn app(replies: Vec<Reply>) -> (App, Arc<ScriptedTransport>, Arc<RecordingNotifier>) {
        let transport = Arc::new(ScriptedTransport::new(replies));
        let notifier = Arc::new(RecordingNotifier::default());
        let app = App::with_parts(
            &Config::default(),
            transport.clone(),
            CredentialStore::new(Arc::new(MemoryStore::new())),
            notifier.clone(),
        );
        (app, transport, notifier)
    }

    #[test]
    fn test_truncate_title_counts_chars() {
        assert_eq!(truncate_title("short"), "short");
        let long = "é".repeat(50);
        let truncated = truncate_title(&long);
        assert_eq!(truncated.chars().count(), MAX_TITLE_CHARS);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_format_timestamp_passes_through_unparseable() {
        assert_eq!(format_timestamp("yesterday"), "yesterday");
        assert_ne!(format_timestamp("2024-05-01T10:00:00.000Z"), "2024-05-01T10:00:00.000Z");
    }

    #[test]
    fn test_table_has_row_per_conversation() {
        let conversations = vec![
            Conversation::local("new-chat-1".into(), chrono::Utc::now()),
            Conversation::local("new-chat-2".into(), chrono::Utc::now()),
        ];
        let table = conversation_table(&conversations, Some("new-chat-1"));
        assert_eq!(table.len(), 3);
    }

    #[tokio::test]
    async fn test_delete_with_yes_skips_prompt() {
        let (app, transport, notifier) = app(vec![
            Reply::status(200, &chats_json(&["a", "b"])),
            Reply::status(204, ""),
        ]);

        assert!(delete(&app, "a".into(), true).await.unwrap());

        assert_eq!(transport.requests()[1].path, "/chats/a");
        assert_eq!(notifier.messages().len(), 1);
        assert!(!app.store.is_delete_confirmation_open());
    }

    #[tokio::test]
    async fn test_delete_unknown_id_makes_no_delete_call() {
        let (app, transport, _) = app(vec![Reply::status(200, &chats_json(&["a"]))]);

        let err = delete(&app, "zzz".into(), true).await.unwrap_err();

        assert!(err.to_string().contains("no conversation with id zzz"));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_list_failure_reports_false() {
        let (app, _, notifier) = app(vec![Reply::fail("down")]);

        assert!(!list(&app, true).await.unwrap());

        assert_eq!(notifier.messages().len(), 1);
    }
}
