//! Test utilities for Parley
//!
//! Scripted transport and notifier doubles shared by the unit tests, plus a
//! few assertion helpers.

use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::error::{ParleyError, Result};
use crate::gateway::{ApiRequest, ApiResponse, Transport};
use crate::notify::{Notifier, Severity};

/// One scripted answer of a [`ScriptedTransport`].
#[derive(Debug)]
pub enum Reply {
    /// Answer immediately with this response
    Respond(ApiResponse),
    /// Fail with a transport error carrying this message
    Fail(String),
    /// Wait until the paired sender delivers a response
    Gated(oneshot::Receiver<ApiResponse>),
}

impl Reply {
    /// Immediate response with `status` and `body`.
    pub fn status(status: u16, body: &str) -> Self {
        Reply::Respond(ApiResponse {
            status,
            body: body.to_string(),
        })
    }

    /// Immediate transport failure.
    pub fn fail(message: &str) -> Self {
        Reply::Fail(message.to_string())
    }

    /// A reply that blocks until the returned sender fires.
    ///
    /// Dropping the sender turns the reply into a transport failure.
    pub fn gated() -> (Self, oneshot::Sender<ApiResponse>) {
        let (tx, rx) = oneshot::channel();
        (Reply::Gated(rx), tx)
    }
}

/// [`Transport`] that answers from a queue and records every request.
///
/// Replies are taken in request order at the moment `execute` is first
/// polled. An exhausted queue answers with a transport error.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait::async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.requests.lock().push(request);
        let reply = self.replies.lock().pop_front();

        match reply {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Fail(message)) => Err(ParleyError::Transport(message).into()),
            Some(Reply::Gated(rx)) => rx
                .await
                .map_err(|_| ParleyError::Transport("gate dropped".into()).into()),
            None => Err(ParleyError::Transport("no scripted reply left".into()).into()),
        }
    }
}

/// [`Notifier`] that keeps every message for later assertions.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(String, Severity)>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<(String, Severity)> {
        self.messages.lock().clone()
    }

    /// Number of messages recorded at `severity`.
    pub fn count(&self, severity: Severity) -> usize {
        self.messages
            .lock()
            .iter()
            .filter(|(_, s)| *s == severity)
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        self.messages.lock().push((message.to_string(), severity));
    }
}

/// JSON body of a `GET /chats` response listing `ids` in order.
pub fn chats_json(ids: &[&str]) -> String {
    let records: Vec<serde_json::Value> = ids
        .iter()
        .map(|id| {
            serde_json::json!({
                "id": id,
                "title": format!("Chat {}", id),
                "status": "processing",
                "updatedAt": "2024-05-01T10:00:00.000Z",
            })
        })
        .collect();
    serde_json::Value::Array(records).to_string()
}

/// Assert that an error contains the expected message
///
/// # Panics
///
/// Panics if the result is Ok or if the error doesn't contain the expected message
pub fn assert_error_contains<T>(result: Result<T>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}' but got Ok", expected),
        Err(e) => {
            let error_msg = format!("{:#}", e);
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_transport_answers_in_order() {
        let transport = ScriptedTransport::new(vec![Reply::status(200, "a"), Reply::fail("down")]);

        let first = transport.execute(ApiRequest::get("/one")).await.unwrap();
        assert_eq!(first.body, "a");
        assert_error_contains(transport.execute(ApiRequest::get("/two")).await, "down");
        assert_error_contains(
            transport.execute(ApiRequest::get("/three")).await,
            "no scripted reply left",
        );

        let paths: Vec<String> = transport.requests().into_iter().map(|r| r.path).collect();
        assert_eq!(paths, vec!["/one", "/two", "/three"]);
    }

    #[tokio::test]
    async fn test_gated_reply_waits_for_sender() {
        let (gated, tx) = Reply::gated();
        let transport = ScriptedTransport::new(vec![gated]);

        tx.send(ApiResponse {
            status: 204,
            body: String::new(),
        })
        .unwrap();

        let response = transport.execute(ApiRequest::get("/x")).await.unwrap();
        assert_eq!(response.status, 204);
    }

    #[test]
    fn test_recording_notifier_counts_by_severity() {
        let notifier = RecordingNotifier::default();
        notifier.notify("a", Severity::Error);
        notifier.notify("b", Severity::Success);
        notifier.notify("c", Severity::Error);
        assert_eq!(notifier.count(Severity::Error), 2);
        assert_eq!(notifier.messages().len(), 3);
    }

    #[test]
    fn test_chats_json_preserves_order() {
        let parsed: Vec<serde_json::Value> =
            serde_json::from_str(&chats_json(&["b", "a"])).unwrap();
        assert_eq!(parsed[0]["id"], "b");
        assert_eq!(parsed[1]["id"], "a");
    }
}
