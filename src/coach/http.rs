//! Text completion over a Gemini-style `generateContent` HTTP API.

use super::TextCompletion;
use crate::{Error, Result};
use serde_json::{Value, json};
use std::time::Duration;

/// Header carrying the API key. Kept out of the URL so transport errors,
/// which quote the URL, never contain it.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Request timeout for a single completion.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking client for `POST {endpoint}/models/{model}:generateContent`.
#[derive(Debug, Clone)]
pub struct HttpCompletion {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    agent: ureq::Agent,
}

impl HttpCompletion {
    /// Build a client. A missing key is not an error until a call is made,
    /// so coach features can still fall back.
    pub fn new(endpoint: &str, model: &str, api_key: Option<String>) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build();
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
            agent,
        }
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

/// Pull `candidates[0].content.parts[0].text` out of a response body.
fn response_text(body: &Value) -> Result<String> {
    body.pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::Http("completion response has no text".to_string()))
}

impl TextCompletion for HttpCompletion {
    fn complete(&self, prompt: &str) -> Result<String> {
        let key = self.api_key.as_deref().ok_or_else(|| {
            Error::Config(format!(
                "no API key; set {} to enable the coach",
                crate::config::API_KEY_ENV
            ))
        })?;

        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "requesting completion");
        let response = self
            .agent
            .post(&self.url())
            .set("Content-Type", "application/json")
            .set(API_KEY_HEADER, key)
            .send_json(body);

        match response {
            Ok(resp) => {
                let body: Value = resp
                    .into_json()
                    .map_err(|e| Error::Http(format!("invalid completion response: {}", e)))?;
                response_text(&body)
            }
            Err(ureq::Error::Status(code, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                Err(Error::Http(format!("HTTP {}: {}", code, body)))
            }
            Err(e) => Err(Error::Http(e.to_string())),
        }
    }
}
