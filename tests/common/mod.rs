use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tempfile::TempDir;

use parley::credentials::{CredentialStore, FileStore, MemoryStore};
use parley::gateway::http::HttpTransport;
use parley::gateway::{RequestGateway, SessionEvents};
use parley::notify::{Notifier, Severity};

/// Notifier that keeps every message for assertions.
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct Collected {
    messages: Mutex<Vec<(String, Severity)>>,
}

#[allow(dead_code)]
impl Collected {
    pub fn messages(&self) -> Vec<(String, Severity)> {
        self.messages.lock().clone()
    }
}

impl Notifier for Collected {
    fn notify(&self, message: &str, severity: Severity) {
        self.messages.lock().push((message.to_string(), severity));
    }
}

/// Real HTTP transport pointed at a wiremock server.
#[allow(dead_code)]
pub fn transport(base_url: &str) -> HttpTransport {
    HttpTransport::new(
        url::Url::parse(base_url).expect("valid url"),
        Duration::from_secs(5),
        "parley-tests",
    )
    .expect("failed to build transport")
}

/// Gateway over an in-memory credential store.
#[allow(dead_code)]
pub fn memory_gateway(base_url: &str) -> RequestGateway {
    RequestGateway::new(
        Arc::new(transport(base_url)),
        CredentialStore::new(Arc::new(MemoryStore::new())),
        SessionEvents::new(),
    )
}

/// Gateway over a credential file inside a fresh temp dir.
#[allow(dead_code)]
pub fn file_gateway(base_url: &str) -> (RequestGateway, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let store = FileStore::new_with_path(tmp.path().join("credentials.json"))
        .expect("failed to create file store");
    let gateway = RequestGateway::new(
        Arc::new(transport(base_url)),
        CredentialStore::new(Arc::new(store)),
        SessionEvents::new(),
    );
    (gateway, tmp)
}

/// `GET /chats` body listing `ids` in order.
#[allow(dead_code)]
pub fn chats(ids: &[&str]) -> serde_json::Value {
    serde_json::Value::Array(
        ids.iter()
            .map(|id| {
                serde_json::json!({
                    "id": id,
                    "title": format!("Chat {}", id),
                    "status": "processing",
                    "updatedAt": "2024-05-01T10:00:00.000Z",
                })
            })
            .collect(),
    )
}
