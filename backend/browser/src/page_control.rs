//! Page Control Actions
//!
//! Navigation and script evaluation inside the attached tab.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use crate::cdp_client::CdpClient;
use crate::error::CdpError;

/// Something that can evaluate an expression in a page and hand back its
/// JSON value.
#[async_trait]
pub trait PageEvaluator: Send + Sync {
    async fn evaluate(&self, expression: &str) -> Result<Value, CdpError>;
}

pub struct PageControl {
    client: CdpClient,
}

impl PageControl {
    pub fn new(client: CdpClient) -> Self {
        Self { client }
    }

    /// Navigate the tab and wait for the navigation to be committed.
    pub async fn navigate(&self, url: &str) -> Result<(), CdpError> {
        info!("Navigating browser tab to {}", url);
        let response = self.client.send_command("Page.navigate", json!({ "url": url })).await?;
        match response.get("errorText").and_then(Value::as_str) {
            Some(error) if !error.is_empty() => Err(CdpError::Navigation(error.to_string())),
            _ => Ok(()),
        }
    }

    /// Evaluate `script` in the page's main world. Promises are awaited and
    /// the result is returned by value.
    pub async fn evaluate_js(&self, script: &str) -> Result<Value, CdpError> {
        let response = self
            .client
            .send_command(
                "Runtime.evaluate",
                json!({
                    "expression": script,
                    "returnByValue": true,
                    "awaitPromise": true,
                    "userGesture": false,
                }),
            )
            .await?;
        evaluation_value(&response)
    }

    pub async fn close(&self) {
        self.client.close().await;
    }
}

#[async_trait]
impl PageEvaluator for PageControl {
    async fn evaluate(&self, expression: &str) -> Result<Value, CdpError> {
        self.evaluate_js(expression).await
    }
}

/// `result.value` of a `Runtime.evaluate` response, or the thrown exception.
pub(crate) fn evaluation_value(response: &Value) -> Result<Value, CdpError> {
    if let Some(details) = response.get("exceptionDetails") {
        let description = details
            .pointer("/exception/description")
            .and_then(Value::as_str)
            .or_else(|| details.get("text").and_then(Value::as_str))
            .unwrap_or("uncaught exception");
        return Err(CdpError::Script(description.to_string()));
    }
    Ok(response
        .pointer("/result/value")
        .cloned()
        .unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_value() {
        let response = json!({"result": {"type": "object", "value": {"ts": 5}}});
        assert_eq!(evaluation_value(&response).unwrap(), json!({"ts": 5}));
    }

    #[test]
    fn undefined_is_null() {
        let response = json!({"result": {"type": "undefined"}});
        assert_eq!(evaluation_value(&response).unwrap(), Value::Null);
    }

    #[test]
    fn exceptions_become_script_errors() {
        let response = json!({
            "result": {"type": "object", "subtype": "error"},
            "exceptionDetails": {"text": "Uncaught", "exception": {"description": "ReferenceError: x is not defined"}}
        });
        match evaluation_value(&response) {
            Err(CdpError::Script(msg)) => assert!(msg.starts_with("ReferenceError")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
