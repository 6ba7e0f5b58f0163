//! [`CompletionClient`] – OpenAI-compatible chat-completions client.
//!
//! Sends one directive per call to a remote completion endpoint and returns
//! the raw response body.  Exactly one attempt per directive — there is no
//! retry or backoff here; the caller decides what a failure means.
//!
//! # Example
//!
//! ```rust,no_run
//! use navmind_runtime::completion::{CompletionClient, CompletionOptions};
//!
//! let client = CompletionClient::new(CompletionOptions {
//!     endpoint: "https://api.example.com/v1/chat/completions".into(),
//!     ..CompletionOptions::default()
//! });
//!
//! // Requires a reachable endpoint – skipped in unit tests.
//! // let raw = client.complete("move forward slowly").await?;
//! ```

use std::time::Duration;

use navmind_types::VelocityPayload;
use reqwest::StatusCode;
use schemars::schema_for;
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

// ─────────────────────────────────────────────────────────────────────────────
// System prompt
// ─────────────────────────────────────────────────────────────────────────────

/// Instructs the remote model to answer with the strict velocity JSON schema
/// and nothing else.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You control a mobile robot. Given an instruction, \
reply with JSON using the schema {\"linear\": {\"x\": <float>, \"y\": <float>, \"z\": 0.0}, \
\"angular\": {\"x\": 0.0, \"y\": 0.0, \"z\": <float>}, \"comment\": \"<optional short remark>\"}. \
Values represent velocities in m/s and rad/s. Stay within the requested speed limits and do \
not return any non-JSON text.";

// ─────────────────────────────────────────────────────────────────────────────
// Error type
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can arise from one completion attempt.
#[derive(Error, Debug)]
pub enum CompletionError {
    /// The endpoint was unreachable, the request timed out, or the response
    /// body could not be decoded.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The service answered with a non-success status code.
    #[error("remote service returned {status}: {body}")]
    Remote { status: StatusCode, body: String },
    /// The response carried no parseable JSON payload.
    #[error("completion does not contain a JSON object: {0}")]
    Malformed(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Message types (OpenAI-compatible)
// ─────────────────────────────────────────────────────────────────────────────

/// The role of a participant in a chat conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// A single message in a chat conversation.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Options
// ─────────────────────────────────────────────────────────────────────────────

/// Construction-time knobs for [`CompletionClient`].
///
/// No `Debug` impl: `api_key` must not reach log output.
#[derive(Clone)]
pub struct CompletionOptions {
    /// Fully-resolved completions URL.
    pub endpoint: String,
    /// Model identifier sent with every request.
    pub model: String,
    pub temperature: f64,
    /// System-role message; empty selects [`DEFAULT_SYSTEM_PROMPT`].
    pub system_prompt: String,
    /// Structured-output hint: `"json_object"` requests a JSON reply,
    /// `"json_schema"` additionally injects the [`VelocityPayload`] schema,
    /// empty sends no hint.
    pub response_format: String,
    /// Per-request deadline covering connect, send, and read.
    pub timeout: Duration,
    /// Bearer credential; empty means unauthenticated requests.
    pub api_key: String,
    /// Header the credential is sent under.
    pub api_key_header: String,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            model: "gpt-4.1-mini".to_string(),
            temperature: 0.1,
            system_prompt: String::new(),
            response_format: "json_object".to_string(),
            timeout: Duration::from_secs(20),
            api_key: String::new(),
            api_key_header: "Authorization".to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// CompletionClient
// ─────────────────────────────────────────────────────────────────────────────

/// An async client for an OpenAI-compatible chat-completions endpoint.
///
/// Construct once and reuse across directives; the underlying
/// [`reqwest::Client`] pools connections.
#[derive(Clone)]
pub struct CompletionClient {
    opts: CompletionOptions,
    client: reqwest::Client,
}

impl CompletionClient {
    pub fn new(opts: CompletionOptions) -> Self {
        Self {
            opts,
            client: reqwest::Client::new(),
        }
    }

    /// Send `directive` to the model and return the raw response body.
    ///
    /// # Errors
    ///
    /// [`CompletionError::Transport`] for connect/timeout/decode failures,
    /// [`CompletionError::Remote`] for any non-2xx status (carrying status
    /// and body for diagnostics).
    pub async fn complete(&self, directive: &str) -> Result<Value, CompletionError> {
        let system_prompt = if self.opts.system_prompt.is_empty() {
            DEFAULT_SYSTEM_PROMPT
        } else {
            &self.opts.system_prompt
        };
        let messages = [
            ChatMessage {
                role: Role::System,
                content: system_prompt.to_string(),
            },
            ChatMessage {
                role: Role::User,
                content: directive.to_string(),
            },
        ];
        let body = ChatRequest {
            model: &self.opts.model,
            messages: &messages,
            temperature: self.opts.temperature,
            response_format: self.response_format_value(),
        };

        let mut request = self
            .client
            .post(&self.opts.endpoint)
            .timeout(self.opts.timeout)
            .json(&body);
        if !self.opts.api_key.is_empty() {
            request = request.header(
                self.opts.api_key_header.as_str(),
                format!("Bearer {}", self.opts.api_key),
            );
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Remote { status, body });
        }

        Ok(response.json::<Value>().await?)
    }

    /// Build the `response_format` request field from the configured hint.
    fn response_format_value(&self) -> Option<Value> {
        match self.opts.response_format.as_str() {
            "" => None,
            "json_schema" => {
                let schema = serde_json::to_value(schema_for!(VelocityPayload))
                    .unwrap_or(Value::Null);
                Some(json!({ "type": "json_schema", "json_schema": schema }))
            }
            other => Some(json!({ "type": other })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_message_serializes_role() {
        let msg = ChatMessage {
            role: Role::System,
            content: "hello".into(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"system\""));
    }

    #[test]
    fn request_omits_response_format_when_hint_empty() {
        let client = CompletionClient::new(CompletionOptions {
            response_format: String::new(),
            ..CompletionOptions::default()
        });
        assert!(client.response_format_value().is_none());
    }

    #[test]
    fn json_object_hint_passes_through() {
        let client = CompletionClient::new(CompletionOptions::default());
        let value = client.response_format_value().unwrap();
        assert_eq!(value["type"], "json_object");
    }

    #[test]
    fn json_schema_hint_injects_velocity_payload_schema() {
        let client = CompletionClient::new(CompletionOptions {
            response_format: "json_schema".to_string(),
            ..CompletionOptions::default()
        });
        let value = client.response_format_value().unwrap();
        assert_eq!(value["type"], "json_schema");
        let schema_str = value["json_schema"].to_string();
        assert!(schema_str.contains("linear"));
        assert!(schema_str.contains("angular"));
    }

    #[test]
    fn default_system_prompt_demands_json_only() {
        assert!(DEFAULT_SYSTEM_PROMPT.contains("JSON"));
        assert!(DEFAULT_SYSTEM_PROMPT.contains("angular"));
    }

    #[tokio::test]
    async fn unreachable_endpoint_surfaces_transport_error() {
        // Nothing listens on this port – complete must return Transport, not panic.
        let client = CompletionClient::new(CompletionOptions {
            endpoint: "http://127.0.0.1:9/chat/completions".to_string(),
            timeout: Duration::from_secs(2),
            ..CompletionOptions::default()
        });
        let result = client.complete("move forward").await;
        assert!(matches!(result, Err(CompletionError::Transport(_))));
    }
}
