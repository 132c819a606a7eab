//! Backend calls for the `/chats` resource

use crate::conversations::types::ChatRecord;
use crate::error::{ParleyError, Result};
use crate::gateway::{ApiRequest, RequestGateway};

/// Collection path of the chats resource.
pub const CHATS_PATH: &str = "/chats";

/// Thin typed wrapper over the gateway for chat endpoints.
#[derive(Debug, Clone)]
pub struct ChatService {
    gateway: RequestGateway,
}

impl ChatService {
    pub fn new(gateway: RequestGateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &RequestGateway {
        &self.gateway
    }

    /// `GET /chats`
    ///
    /// Returns `Ok(None)` when the backend answers with an empty or `null`
    /// body.
    ///
    /// # Errors
    ///
    /// Gateway errors, or [`ParleyError::MalformedResponse`] when the body is
    /// not an array of chat records.
    pub async fn list_chats(&self) -> Result<Option<Vec<ChatRecord>>> {
        let response = self.gateway.send(ApiRequest::get(CHATS_PATH)).await?;

        if response.body.trim().is_empty() {
            return Ok(None);
        }

        let records: Option<Vec<ChatRecord>> = response.json()?;
        Ok(records)
    }

    /// `DELETE /chats/{id}`. Any 2xx counts as success; the body is ignored.
    pub async fn delete_chat(&self, id: &str) -> Result<()> {
        self.gateway.send(ApiRequest::delete(chat_path(id)?)).await?;
        Ok(())
    }
}

/// Path of a single chat, with `id` percent-encoded as one segment.
pub fn chat_path(id: &str) -> Result<String> {
    let mut url = url::Url::parse("http://localhost/")
        .map_err(|e| ParleyError::Transport(format!("invalid chat path: {}", e)))?;
    url.path_segments_mut()
        .map_err(|_| ParleyError::Transport("chat path cannot have segments".into()))?
        .pop_if_empty()
        .push(CHATS_PATH.trim_start_matches('/'))
        .push(id);
    Ok(url.path().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use crate::credentials::{CredentialStore, MemoryStore};
    use crate::gateway::SessionEvents;
    use crate::test_utils::{Reply, ScriptedTransport};

    fn service(replies: Vec<Reply>) -> (ChatService, Arc<ScriptedTransport>) {
        let transport = Arc::new(ScriptedTransport::new(replies));
        let gateway = RequestGateway::new(
            transport.clone(),
            CredentialStore::new(Arc::new(MemoryStore::new())),
            SessionEvents::new(),
        );
        (ChatService::new(gateway), transport)
    }

    #[test]
    fn test_chat_path_plain_id() {
        assert_eq!(chat_path("abc123").unwrap(), "/chats/abc123");
    }

    #[test]
    fn test_chat_path_encodes_reserved_characters() {
        assert_eq!(chat_path("a/b c").unwrap(), "/chats/a%2Fb%20c");
    }

    #[tokio::test]
    async fn test_list_chats_parses_records() {
        let (service, transport) = service(vec![Reply::status(
            200,
            r#"[{"id":"1","title":"One","status":"done","updatedAt":"t"}]"#,
        )]);

        let records = service.list_chats().await.unwrap().unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title.as_deref(), Some("One"));
        let sent = transport.requests();
        assert_eq!(sent[0].method, reqwest::Method::GET);
        assert_eq!(sent[0].path, "/chats");
    }

    #[tokio::test]
    async fn test_list_chats_null_body_is_none() {
        let (service, _) = service(vec![Reply::status(200, "null")]);
        assert!(service.list_chats().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_chats_empty_body_is_none() {
        let (service, _) = service(vec![Reply::status(204, "")]);
        assert!(service.list_chats().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_chats_keeps_records_with_odd_field_types() {
        let (service, _) = service(vec![Reply::status(
            200,
            r#"[{"id":"1","title":"One"},{"id":2,"title":7,"status":null,"updatedAt":3}]"#,
        )]);

        let records = service.list_chats().await.unwrap().unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].title.as_deref(), Some("7"));
        assert_eq!(records[1].updated_at.as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn test_list_chats_object_body_is_malformed() {
        let (service, _) = service(vec![Reply::status(200, r#"{"chats":[]}"#)]);
        let err = service.list_chats().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ParleyError>(),
            Some(ParleyError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_chat_sends_delete() {
        let (service, transport) = service(vec![Reply::status(204, "")]);
        service.delete_chat("42").await.unwrap();

        let sent = transport.requests();
        assert_eq!(sent[0].method, reqwest::Method::DELETE);
        assert_eq!(sent[0].path, "/chats/42");
    }
}
