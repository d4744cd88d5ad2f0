//! Outbound SMS sending.
//!
//! The gateway's send API takes form-encoded credentials and message
//! fields and answers with a JSON envelope of per-message statuses;
//! status `"0"` means accepted.

use serde::Deserialize;

use crate::error::{Result, TodoError};

/// Seam for sending the reply SMS. Fakes implement this in tests.
pub trait SmsSender: Send + Sync {
    fn send(&self, from: &str, to: &str, text: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Vonage REST client
// ---------------------------------------------------------------------------

const DEFAULT_BASE_URL: &str = "https://rest.nexmo.com";

pub struct VonageSms {
    http: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
    api_secret: String,
}

#[derive(Deserialize)]
struct SendResponse {
    messages: Vec<MessageStatus>,
}

#[derive(Deserialize)]
struct MessageStatus {
    status: String,
    #[serde(rename = "message-id")]
    message_id: Option<String>,
    #[serde(rename = "error-text")]
    error_text: Option<String>,
}

impl VonageSms {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// Point the client at a different API host (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl SmsSender for VonageSms {
    fn send(&self, from: &str, to: &str, text: &str) -> Result<()> {
        let url = format!("{}/sms/json", self.base_url);
        let form = [
            ("api_key", self.api_key.as_str()),
            ("api_secret", self.api_secret.as_str()),
            ("from", from),
            ("to", to),
            ("text", text),
        ];
        let response = self
            .http
            .post(&url)
            .form(&form)
            .send()
            .map_err(|e| TodoError::SmsSend(format!("request failed: {e}")))?;
        let body: SendResponse = response
            .json()
            .map_err(|e| TodoError::SmsSend(format!("unexpected response: {e}")))?;

        let Some(first) = body.messages.first() else {
            return Err(TodoError::SmsSend("empty messages array".to_string()));
        };
        if first.status != "0" {
            let detail = first.error_text.as_deref().unwrap_or("unknown error");
            return Err(TodoError::SmsSend(format!(
                "status {}: {detail}",
                first.status
            )));
        }
        tracing::info!(
            to,
            message_id = first.message_id.as_deref().unwrap_or(""),
            "sms sent"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Dry-run sender
// ---------------------------------------------------------------------------

/// Logs instead of sending. For local runs without gateway credentials.
pub struct DryRunSms;

impl SmsSender for DryRunSms {
    fn send(&self, from: &str, to: &str, text: &str) -> Result<()> {
        tracing::info!(from, to, text, "[dry run] sms send skipped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_success_on_status_zero() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/sms/json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"messages":[{"status":"0","message-id":"abc123"}]}"#)
            .create();

        let client = VonageSms::new("key", "secret").with_base_url(server.url());
        client.send("+15559876543", "+15551234567", "Added: Buy milk").unwrap();
        mock.assert();
    }

    #[test]
    fn send_fails_on_error_status() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/sms/json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"messages":[{"status":"2","error-text":"Missing api_key"}]}"#)
            .create();

        let client = VonageSms::new("key", "secret").with_base_url(server.url());
        let err = client
            .send("+15559876543", "+15551234567", "hi")
            .unwrap_err();
        assert!(err.to_string().contains("Missing api_key"));
    }

    #[test]
    fn send_fails_on_malformed_response() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/sms/json")
            .with_status(200)
            .with_body("not json")
            .create();

        let client = VonageSms::new("key", "secret").with_base_url(server.url());
        assert!(client.send("+15559876543", "+15551234567", "hi").is_err());
    }

    #[test]
    fn send_fails_on_empty_messages() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/sms/json")
            .with_status(200)
            .with_body(r#"{"messages":[]}"#)
            .create();

        let client = VonageSms::new("key", "secret").with_base_url(server.url());
        assert!(client.send("+15559876543", "+15551234567", "hi").is_err());
    }

    #[test]
    fn dry_run_always_succeeds() {
        DryRunSms.send("+15559876543", "+15551234567", "hi").unwrap();
    }
}
