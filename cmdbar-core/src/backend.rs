//! Command backend: the request/response service that lists and executes commands.
//!
//! The console never talks to a transport directly. It is handed an
//! `Arc<dyn CommandBackend>`, so tests can inject [`MockBackend`] with a fixed
//! registry while the binary uses [`HttpBackend`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tokio::sync::oneshot;
use tracing::debug;

use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::registry::{CommandListing, CommandRegistry};

/// Body of `POST /commands`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub command: String,
}

/// Reply to `POST /commands`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecuteResponse {
    /// The backend's authoritative command history.
    #[serde(default)]
    pub history: Vec<String>,
    /// Opaque result, only serialized for display.
    #[serde(default)]
    pub result: Value,
}

impl ExecuteResponse {
    /// The result as compact JSON text.
    pub fn serialized_result(&self) -> String {
        self.result.to_string()
    }
}

/// Capability for reaching the command service.
#[async_trait]
pub trait CommandBackend: Send + Sync {
    /// Fetch the full command registry.
    async fn list_commands(&self) -> Result<CommandRegistry, BackendError>;

    /// Execute one command line.
    async fn execute(&self, command: &str) -> Result<ExecuteResponse, BackendError>;
}

// ---------------------------------------------------------------------------
// HttpBackend
// ---------------------------------------------------------------------------

/// Backend reached over HTTP: `GET` and `POST` on `{base_url}/commands`.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| BackendError::Connection {
                message: format!("Failed to create HTTP client: {}", e),
            })?;
        Ok(Self {
            client,
            endpoint: format!("{}/commands", config.base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        &self,
        label: &str,
        response: reqwest::Response,
    ) -> Result<T, BackendError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                endpoint: label.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| BackendError::ResponseParse {
                message: format!("{}: {}", label, e),
            })
    }

    fn request_error(label: &str, e: reqwest::Error) -> BackendError {
        if e.is_connect() {
            BackendError::Connection {
                message: format!("{}: {}", label, e),
            }
        } else {
            BackendError::Request {
                endpoint: label.to_string(),
                message: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl CommandBackend for HttpBackend {
    async fn list_commands(&self) -> Result<CommandRegistry, BackendError> {
        let label = "GET /commands";
        debug!(endpoint = %self.endpoint, "Fetching command registry");
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| Self::request_error(label, e))?;
        let listing: CommandListing = self.read_json(label, response).await?;
        Ok(listing.commands)
    }

    async fn execute(&self, command: &str) -> Result<ExecuteResponse, BackendError> {
        let label = "POST /commands";
        debug!(endpoint = %self.endpoint, command, "Executing command");
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ExecuteRequest {
                command: command.to_string(),
            })
            .send()
            .await
            .map_err(|e| Self::request_error(label, e))?;
        self.read_json(label, response).await
    }
}

// ---------------------------------------------------------------------------
// MockBackend
// ---------------------------------------------------------------------------

/// In-process backend for tests and demos.
///
/// Keeps its own history, echoes each command back as the result, and can be
/// told to fail a command or to hold its reply until released, which lets
/// tests control the order in which responses arrive.
#[derive(Debug, Default)]
pub struct MockBackend {
    registry: CommandRegistry,
    history: Mutex<Vec<String>>,
    gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    failing: Mutex<HashSet<String>>,
    listing_fails: Mutex<bool>,
    calls: Mutex<Vec<String>>,
}

impl MockBackend {
    pub fn new(registry: CommandRegistry) -> Self {
        Self {
            registry,
            ..Default::default()
        }
    }

    /// Hold the reply to `command` until the returned sender fires (or is dropped).
    pub fn hold(&self, command: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(command.to_string(), rx);
        tx
    }

    /// Make every execution of `command` fail with a connection error.
    pub fn fail_on(&self, command: &str) {
        self.failing.lock().unwrap().insert(command.to_string());
    }

    /// Make `list_commands` fail.
    pub fn fail_listing(&self) {
        *self.listing_fails.lock().unwrap() = true;
    }

    /// Commands received so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// The history the backend would report right now.
    pub fn history(&self) -> Vec<String> {
        self.history.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandBackend for MockBackend {
    async fn list_commands(&self) -> Result<CommandRegistry, BackendError> {
        if *self.listing_fails.lock().unwrap() {
            return Err(BackendError::Connection {
                message: "mock listing failure".into(),
            });
        }
        Ok(self.registry.clone())
    }

    async fn execute(&self, command: &str) -> Result<ExecuteResponse, BackendError> {
        self.calls.lock().unwrap().push(command.to_string());

        let gate = self.gates.lock().unwrap().remove(command);
        if let Some(gate) = gate {
            // A dropped sender releases the reply as well.
            let _ = gate.await;
        }

        if self.failing.lock().unwrap().contains(command) {
            return Err(BackendError::Connection {
                message: format!("mock failure for '{}'", command),
            });
        }

        let history = {
            let mut history = self.history.lock().unwrap();
            history.push(command.to_string());
            history.clone()
        };
        Ok(ExecuteResponse {
            history,
            result: Value::String(format!("executed: {}", command)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CommandSpec;
    use serde_json::json;

    #[test]
    fn test_execute_response_defaults() {
        let resp: ExecuteResponse = serde_json::from_value(json!({})).unwrap();
        assert!(resp.history.is_empty());
        assert_eq!(resp.serialized_result(), "null");
    }

    #[test]
    fn test_execute_response_serializes_result() {
        let resp: ExecuteResponse = serde_json::from_value(json!({
            "history": ["help"],
            "result": {"ok": true, "n": 3}
        }))
        .unwrap();
        assert_eq!(resp.history, vec!["help"]);
        let text = resp.serialized_result();
        assert!(!text.contains('\n'));
        let back: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(back, json!({"ok": true, "n": 3}));
    }

    #[test]
    fn test_execute_request_wire_shape() {
        let body = serde_json::to_value(ExecuteRequest {
            command: "set x y".into(),
        })
        .unwrap();
        assert_eq!(body, json!({"command": "set x y"}));
    }

    #[test]
    fn test_http_backend_endpoint_trims_slash() {
        let config = BackendConfig {
            base_url: "http://localhost:8081/".into(),
            timeout_secs: 5,
        };
        let backend = HttpBackend::new(&config).unwrap();
        assert_eq!(backend.endpoint(), "http://localhost:8081/commands");
    }

    #[tokio::test]
    async fn test_http_backend_unreachable_is_error() {
        let config = BackendConfig {
            base_url: "http://127.0.0.1:1".into(),
            timeout_secs: 2,
        };
        let backend = HttpBackend::new(&config).unwrap();
        assert!(backend.list_commands().await.is_err());
        assert!(backend.execute("help").await.is_err());
    }

    /// Accept one connection, answer it with `status` and `body`, and hand
    /// back the raw request text.
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = stream.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(end) = text.find("\r\n\r\n") {
                    let content_length = text[..end]
                        .lines()
                        .filter_map(|line| line.split_once(':'))
                        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if request.len() >= end + 4 + content_length {
                        break;
                    }
                }
            }
            let reply = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(reply.as_bytes()).await.unwrap();
            let _ = stream.shutdown().await;
            String::from_utf8(request).unwrap()
        });
        (base_url, handle)
    }

    fn http_backend(base_url: String) -> HttpBackend {
        HttpBackend::new(&BackendConfig {
            base_url,
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_http_list_commands_keeps_server_order() {
        let (base_url, server) = serve_once(
            "200 OK",
            r#"{"commands":{"zeta":{"args":[]},"alpha":{"args":["x"],"description":"first"}}}"#,
        )
        .await;
        let registry = http_backend(base_url).list_commands().await.unwrap();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
        assert_eq!(
            registry.spec("alpha").unwrap().description.as_deref(),
            Some("first")
        );

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /commands HTTP/1.1\r\n"));
    }

    #[tokio::test]
    async fn test_http_execute_posts_command_body() {
        let (base_url, server) = serve_once(
            "200 OK",
            r#"{"history":["help","set a b"],"result":{"ok":true}}"#,
        )
        .await;
        let response = http_backend(base_url).execute("set a b").await.unwrap();
        assert_eq!(response.history, vec!["help", "set a b"]);
        assert_eq!(response.result, json!({"ok": true}));

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /commands HTTP/1.1\r\n"));
        let (_, body) = request.split_once("\r\n\r\n").unwrap();
        let body: Value = serde_json::from_str(body).unwrap();
        assert_eq!(body, json!({"command": "set a b"}));
    }

    #[tokio::test]
    async fn test_http_error_status_is_reported() {
        let (base_url, server) = serve_once("500 Internal Server Error", "boom").await;
        let err = http_backend(base_url).execute("help").await.unwrap_err();
        assert_eq!(
            err,
            BackendError::Status {
                endpoint: "POST /commands".into(),
                status: 500,
                body: "boom".into(),
            }
        );
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_http_malformed_body_is_parse_error() {
        let (base_url, server) = serve_once("200 OK", "not json").await;
        let err = http_backend(base_url).list_commands().await.unwrap_err();
        assert!(matches!(err, BackendError::ResponseParse { .. }));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_mock_lists_registry() {
        let registry = CommandRegistry::from_specs([CommandSpec::new("help")]);
        let backend = MockBackend::new(registry.clone());
        assert_eq!(backend.list_commands().await.unwrap(), registry);
    }

    #[tokio::test]
    async fn test_mock_execute_grows_history() {
        let backend = MockBackend::default();
        backend.execute("a").await.unwrap();
        let resp = backend.execute("b").await.unwrap();
        assert_eq!(resp.history, vec!["a", "b"]);
        assert_eq!(resp.result, json!("executed: b"));
        assert_eq!(backend.calls(), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_mock_failures() {
        let backend = MockBackend::default();
        backend.fail_on("boom");
        backend.fail_listing();
        assert!(matches!(
            backend.execute("boom").await,
            Err(BackendError::Connection { .. })
        ));
        assert!(backend.list_commands().await.is_err());
        assert!(backend.history().is_empty());
    }
}
