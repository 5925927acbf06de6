//! W3C WebDriver client implementing the [`Driver`] port.
//!
//! Speaks plain JSON over HTTP to chromedriver, geckodriver or a Selenium
//! grid. Element references are carried in [`NodeHandle`] as the remote
//! element id.

use action_primitives::{Driver, DriverError};
use async_trait::async_trait;
use reqwest::{Client, Method};
use rosterbot_core_types::{Locator, NodeHandle};
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::WebDriverConfig;

/// Key of an element reference in W3C responses.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

#[derive(Debug, Error)]
pub enum WebDriverError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("request to {path} failed: {source}")]
    Http {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{error}: {message}")]
    Protocol { error: String, message: String },

    #[error("unexpected response: {0}")]
    Malformed(String),
}

impl From<WebDriverError> for DriverError {
    fn from(err: WebDriverError) -> Self {
        match err {
            WebDriverError::Protocol { error, message } => match error.as_str() {
                "stale element reference" | "no such element" => {
                    DriverError::Stale(NodeHandle(message))
                }
                "element not interactable" | "element click intercepted" => {
                    DriverError::NotInteractable(message)
                }
                "invalid selector" => DriverError::InvalidSelector(message),
                _ => DriverError::Transport(format!("{error}: {message}")),
            },
            other => DriverError::Transport(other.to_string()),
        }
    }
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    value: JsonValue,
}

#[derive(Deserialize)]
struct ProtocolFailure {
    error: String,
    #[serde(default)]
    message: String,
}

/// One live browser session.
pub struct WebDriverClient {
    client: Client,
    base: String,
    session_id: String,
}

impl WebDriverClient {
    /// Open a new session on the remote end.
    pub async fn connect(config: &WebDriverConfig) -> Result<Self, WebDriverError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|err| WebDriverError::Client(err.to_string()))?;
        let base = config.url.trim_end_matches('/').to_string();

        let mut always_match = json!({ "browserName": config.browser_name });
        if config.headless {
            always_match["goog:chromeOptions"] = json!({ "args": ["--headless=new"] });
            always_match["moz:firefoxOptions"] = json!({ "args": ["-headless"] });
        }
        let body = json!({ "capabilities": { "alwaysMatch": always_match } });

        let value = send(&client, &base, Method::POST, "/session", Some(body)).await?;
        let session_id = value
            .get("sessionId")
            .and_then(JsonValue::as_str)
            .ok_or_else(|| WebDriverError::Malformed("session id missing".to_string()))?
            .to_string();
        info!(url = %base, session = %session_id, "webdriver session opened");
        Ok(Self {
            client,
            base,
            session_id,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub async fn navigate(&self, url: &str) -> Result<(), WebDriverError> {
        self.command(Method::POST, "url", Some(json!({ "url": url })))
            .await
            .map(|_| ())
    }

    /// Delete the remote session. Errors are logged, not returned.
    pub async fn close(self) {
        let path = format!("/session/{}", self.session_id);
        match send(&self.client, &self.base, Method::DELETE, &path, None).await {
            Ok(_) => info!(session = %self.session_id, "webdriver session closed"),
            Err(err) => warn!(session = %self.session_id, error = %err, "failed to close session"),
        }
    }

    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<JsonValue>,
    ) -> Result<JsonValue, WebDriverError> {
        let path = format!("/session/{}/{}", self.session_id, path);
        send(&self.client, &self.base, method, &path, body).await
    }

    async fn element_command(
        &self,
        method: Method,
        node: &NodeHandle,
        command: &str,
        body: Option<JsonValue>,
    ) -> Result<JsonValue, DriverError> {
        let path = if command.is_empty() {
            format!("element/{}", node.0)
        } else {
            format!("element/{}/{}", node.0, command)
        };
        self.command(method, &path, body)
            .await
            .map_err(|err| element_error(node, err))
    }

    async fn execute(&self, script: &str, node: &NodeHandle) -> Result<JsonValue, DriverError> {
        let body = json!({ "script": script, "args": [element_ref(node)] });
        self.command(Method::POST, "execute/sync", Some(body))
            .await
            .map_err(|err| element_error(node, err))
    }
}

async fn send(
    client: &Client,
    base: &str,
    method: Method,
    path: &str,
    body: Option<JsonValue>,
) -> Result<JsonValue, WebDriverError> {
    let url = format!("{base}{path}");
    let mut request = client.request(method.clone(), &url);
    if let Some(body) = body {
        request = request.json(&body);
    } else if method == Method::POST {
        request = request.json(&json!({}));
    }
    let response = request.send().await.map_err(|source| WebDriverError::Http {
        path: path.to_string(),
        source,
    })?;

    let status = response.status();
    let envelope: Envelope = response.json().await.map_err(|source| WebDriverError::Http {
        path: path.to_string(),
        source,
    })?;
    if !status.is_success() {
        let failure: ProtocolFailure = serde_json::from_value(envelope.value)
            .map_err(|_| WebDriverError::Malformed(format!("{status} without error body")))?;
        debug!(path, error = %failure.error, "webdriver command failed");
        return Err(WebDriverError::Protocol {
            error: failure.error,
            message: failure.message,
        });
    }
    Ok(envelope.value)
}

fn element_ref(node: &NodeHandle) -> JsonValue {
    json!({ ELEMENT_KEY: node.0 })
}

fn element_id(value: &JsonValue) -> Option<NodeHandle> {
    value
        .get(ELEMENT_KEY)
        .and_then(JsonValue::as_str)
        .map(|id| NodeHandle(id.to_string()))
}

/// Stale errors name the handle rather than the server message.
fn element_error(node: &NodeHandle, err: WebDriverError) -> DriverError {
    match DriverError::from(err) {
        DriverError::Stale(_) => DriverError::Stale(node.clone()),
        other => other,
    }
}

fn as_bool(value: JsonValue) -> Result<bool, DriverError> {
    value
        .as_bool()
        .ok_or_else(|| DriverError::Transport(format!("expected boolean, got {value}")))
}

#[async_trait]
impl Driver for WebDriverClient {
    async fn locate(&self, locator: &Locator) -> Result<Option<NodeHandle>, DriverError> {
        Ok(self.locate_all(locator).await?.into_iter().next())
    }

    async fn locate_all(&self, locator: &Locator) -> Result<Vec<NodeHandle>, DriverError> {
        let body = json!({ "using": "css selector", "value": locator.to_css() });
        let value = match &locator.scope {
            Some(scope) => {
                self.element_command(Method::POST, scope, "elements", Some(body))
                    .await?
            }
            None => self
                .command(Method::POST, "elements", Some(body))
                .await
                .map_err(DriverError::from)?,
        };
        let entries = value
            .as_array()
            .ok_or_else(|| DriverError::Transport("elements response is not a list".to_string()))?;
        Ok(entries.iter().filter_map(element_id).collect())
    }

    async fn is_actionable(&self, node: &NodeHandle) -> Result<bool, DriverError> {
        if !self.is_visible(node).await? {
            return Ok(false);
        }
        as_bool(self.element_command(Method::GET, node, "enabled", None).await?)
    }

    async fn is_visible(&self, node: &NodeHandle) -> Result<bool, DriverError> {
        as_bool(self.element_command(Method::GET, node, "displayed", None).await?)
    }

    async fn scroll_into_view(&self, node: &NodeHandle) -> Result<(), DriverError> {
        self.execute("arguments[0].scrollIntoView({block: 'center'});", node)
            .await
            .map(|_| ())
    }

    async fn invoke(&self, node: &NodeHandle) -> Result<(), DriverError> {
        self.element_command(Method::POST, node, "click", None)
            .await
            .map(|_| ())
    }

    async fn force_invoke(&self, node: &NodeHandle) -> Result<(), DriverError> {
        self.execute("arguments[0].click();", node).await.map(|_| ())
    }

    async fn read_text(&self, node: &NodeHandle) -> Result<String, DriverError> {
        let value = self.element_command(Method::GET, node, "text", None).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn read_attribute(
        &self,
        node: &NodeHandle,
        key: &str,
    ) -> Result<Option<String>, DriverError> {
        let command = format!("attribute/{key}");
        let value = self
            .element_command(Method::GET, node, &command, None)
            .await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn type_text(&self, node: &NodeHandle, text: &str) -> Result<(), DriverError> {
        self.element_command(Method::POST, node, "value", Some(json!({ "text": text })))
            .await
            .map(|_| ())
    }

    async fn clear(&self, node: &NodeHandle) -> Result<(), DriverError> {
        self.element_command(Method::POST, node, "clear", None)
            .await
            .map(|_| ())
    }

    async fn document_root(&self) -> Result<NodeHandle, DriverError> {
        let body = json!({ "script": "return document.documentElement;", "args": [] });
        let value = self
            .command(Method::POST, "execute/sync", Some(body))
            .await
            .map_err(DriverError::from)?;
        element_id(&value)
            .ok_or_else(|| DriverError::Transport("document root is not an element".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_errors_map_onto_driver_errors() {
        let stale = WebDriverError::Protocol {
            error: "stale element reference".into(),
            message: "gone".into(),
        };
        let node = NodeHandle("abc".into());
        assert_eq!(element_error(&node, stale), DriverError::Stale(node.clone()));

        let intercepted = WebDriverError::Protocol {
            error: "element click intercepted".into(),
            message: "overlay".into(),
        };
        assert!(DriverError::from(intercepted).is_transient());

        let other = WebDriverError::Protocol {
            error: "unknown error".into(),
            message: "boom".into(),
        };
        assert!(matches!(DriverError::from(other), DriverError::Transport(_)));
    }

    #[test]
    fn element_references_use_the_w3c_key() {
        let node = NodeHandle("e-1".into());
        let reference = element_ref(&node);
        assert_eq!(element_id(&reference), Some(node));
        assert_eq!(element_id(&json!({ "ELEMENT": "legacy" })), None);
    }
}
