//! Blocking HTTP client for the caBuddy backend.
//!
//! The backend is an opaque JSON-in, text-out service: `POST /caBuddy/`
//! answers with the raw reply body, `POST /deleteChat` drops all server
//! state for a session key. No retries; a non-success status is an error.

use reqwest::blocking::Client;
use serde::Serialize;
use tracing::debug;

use super::config::ChatConfig;
use super::error::ChatError;

/// Body for `POST /caBuddy/`.
#[derive(Serialize)]
struct SendRequest<'a> {
    message: &'a str,
    session_id: &'a str,
}

/// Body for `POST /deleteChat`.
#[derive(Serialize)]
struct DeleteRequest<'a> {
    session_id: &'a str,
}

/// Backend operations needed by the conversation store.
pub trait ChatBackend {
    /// Send a user message under the given session key and return the raw
    /// text reply.
    ///
    /// # Errors
    /// Returns an error if the request fails or the status is not a success.
    fn send_message(&self, message: &str, session_id: &str) -> Result<String, ChatError>;

    /// Ask the backend to drop all state for the given session key.
    ///
    /// # Errors
    /// Returns an error if the request fails or the status is not a success.
    fn delete_chat(&self, session_id: &str) -> Result<(), ChatError>;
}

/// Blocking HTTP implementation of [`ChatBackend`].
pub struct HttpChatBackend {
    client: Client,
    base_url: String,
}

impl HttpChatBackend {
    /// Build a client with the configured timeouts.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ChatConfig) -> Result<Self, ChatError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl ChatBackend for HttpChatBackend {
    fn send_message(&self, message: &str, session_id: &str) -> Result<String, ChatError> {
        let url = format!("{}/caBuddy/", self.base_url);
        debug!("POST {url} (session {session_id})");

        let response = self
            .client
            .post(&url)
            .json(&SendRequest {
                message,
                session_id,
            })
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::HttpStatus(status.as_u16()));
        }

        Ok(response.text()?)
    }

    fn delete_chat(&self, session_id: &str) -> Result<(), ChatError> {
        let url = format!("{}/deleteChat", self.base_url);
        debug!("POST {url} (session {session_id})");

        let response = self
            .client
            .post(&url)
            .json(&DeleteRequest { session_id })
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::HttpStatus(status.as_u16()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use serde_json::json;

    #[test]
    fn test_send_request_body_shape() {
        let body = SendRequest {
            message: "hello",
            session_id: "17000000000001",
        };
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({"message": "hello", "session_id": "17000000000001"})
        );
    }

    #[test]
    fn test_delete_request_body_shape() {
        let body = DeleteRequest {
            session_id: "17000000000001",
        };
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({"session_id": "17000000000001"})
        );
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let config = ChatConfig::default().with_base_url("http://127.0.0.1:8000/");
        let backend = HttpChatBackend::new(&config).unwrap();
        assert_eq!(backend.base_url, "http://127.0.0.1:8000");
    }
}
