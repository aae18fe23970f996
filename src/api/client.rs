use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

use super::types::*;

/// Blocking client for the `/emails` REST surface.
pub struct ApiClient {
    agent: ureq::Agent,
    base_url: String,
    session: Option<String>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Parse error: {0}")]
    Parse(String),
    /// Non-success status whose payload carried an `error` string.
    #[error("{message}")]
    Server { status: u16, message: String },
}

impl ApiClient {
    pub fn new(base_url: &str, session: Option<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(10))
            .build();
        ApiClient {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/emails{}", self.base_url, path)
    }

    fn cookie_header(&self) -> Option<String> {
        self.session.as_ref().map(|s| {
            if s.contains('=') {
                s.clone()
            } else {
                format!("sessionid={}", s)
            }
        })
    }

    fn request(&self, method: &str, url: &str) -> ureq::Request {
        let req = self
            .agent
            .request(method, url)
            .set("Accept", "application/json");
        match self.cookie_header() {
            Some(cookie) => req.set("Cookie", &cookie),
            None => req,
        }
    }

    /// Issue a request and return the raw body of a success response.
    fn execute<B: Serialize>(
        &self,
        method: &str,
        path: &str,
        body: Option<&B>,
    ) -> Result<String, ApiError> {
        let url = self.url(path);
        debug!("{} {}", method, url);

        let req = self.request(method, &url);
        let result = match body {
            Some(body) => req.send_json(body),
            None => req.call(),
        };

        match result {
            Ok(resp) => {
                let status = resp.status();
                let text = resp
                    .into_string()
                    .map_err(|e| ApiError::Parse(format!("Failed to read response: {}", e)))?;
                debug!("{} {} -> {} ({} bytes)", method, url, status, text.len());
                Ok(text)
            }
            Err(ureq::Error::Status(code, resp)) => {
                let text = resp.into_string().unwrap_or_default();
                error!("{} {} failed with HTTP {}: {}", method, url, code, truncate_str(&text, 200));
                Err(server_error(code, &text))
            }
            Err(e) => {
                error!("{} {} connection error: {}", method, url, e);
                Err(ApiError::Http(e.to_string()))
            }
        }
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let text = self.execute::<()>("GET", path, None)?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::Parse(format!(
                "Failed to parse response: {}. Response was: {}",
                e,
                truncate_str(&text, 500)
            ))
        })
    }

    /// `GET /emails/{mailbox}`, newest first as ordered by the server.
    pub fn list_mailbox(&self, mailbox: Mailbox) -> Result<Vec<Message>, ApiError> {
        info!("Fetching mailbox {}", mailbox);
        let messages: Vec<Message> = self.get_json(&format!("/{}", mailbox.as_str()))?;
        info!("Mailbox {} returned {} messages", mailbox, messages.len());
        Ok(messages)
    }

    /// `GET /emails/{id}`.
    pub fn get_message(&self, id: MessageId) -> Result<Message, ApiError> {
        info!("Fetching message {}", id);
        self.get_json(&format!("/{}", id))
    }

    /// `PUT /emails/{id}` with a partial flag update. Any response body is ignored.
    pub fn update_message(&self, id: MessageId, patch: &MessagePatch) -> Result<(), ApiError> {
        info!("Updating message {}: {:?}", id, patch);
        self.execute("PUT", &format!("/{}", id), Some(patch))?;
        Ok(())
    }

    /// `POST /emails`. Returns the server's success message.
    pub fn send_message(&self, outgoing: &OutgoingMessage) -> Result<String, ApiError> {
        info!("Sending message to '{}'", outgoing.recipients);
        let text = self.execute("POST", "", Some(outgoing))?;
        send_result(&text)
    }
}

/// Interpret a 2xx send response. A body that is not the JSON status payload
/// (e.g. a login page reached through a redirect) is an error, not a send.
fn send_result(text: &str) -> Result<String, ApiError> {
    let payload: StatusPayload = serde_json::from_str(text).map_err(|e| {
        ApiError::Parse(format!(
            "Unexpected send response: {}. Response was: {}",
            e,
            truncate_str(text, 200)
        ))
    })?;
    match (payload.message, payload.error) {
        (_, Some(error)) => Err(ApiError::Server {
            status: 200,
            message: error,
        }),
        (Some(message), None) => Ok(message),
        (None, None) => Ok("Email sent successfully.".to_string()),
    }
}

/// Build a `Server` error from a non-success body, falling back to the status
/// line when the body carries no `error` field.
fn server_error(status: u16, body: &str) -> ApiError {
    let message = serde_json::from_str::<StatusPayload>(body)
        .ok()
        .and_then(|p| p.error)
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("HTTP {} (empty response)", status)
            } else {
                format!("HTTP {}: {}", status, truncate_str(body.trim(), 200))
            }
        });
    ApiError::Server { status, message }
}

fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        s
    } else {
        let mut end = max_len;
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        &s[..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_and_cookie() {
        let client = ApiClient::new("http://localhost:8000/", Some("abc123".to_string()));
        assert_eq!(client.url("/inbox"), "http://localhost:8000/emails/inbox");
        assert_eq!(client.url(""), "http://localhost:8000/emails");
        assert_eq!(client.cookie_header().as_deref(), Some("sessionid=abc123"));

        let client = ApiClient::new("http://h", Some("sessionid=x; csrftoken=y".to_string()));
        assert_eq!(
            client.cookie_header().as_deref(),
            Some("sessionid=x; csrftoken=y")
        );
        assert!(ApiClient::new("http://h", None).cookie_header().is_none());
    }

    #[test]
    fn test_server_error_uses_error_field() {
        match server_error(400, r#"{"error": "no such mailbox"}"#) {
            ApiError::Server { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "no such mailbox");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            server_error(502, "").to_string(),
            "HTTP 502 (empty response)"
        );
        assert_eq!(
            server_error(500, "<html>oops</html>").to_string(),
            "HTTP 500: <html>oops</html>"
        );
    }

    #[test]
    fn test_send_result_requires_json_payload() {
        assert_eq!(
            send_result(r#"{"message": "Email sent successfully."}"#).unwrap(),
            "Email sent successfully."
        );
        match send_result(r#"{"error": "At least one recipient required."}"#) {
            Err(ApiError::Server { message, .. }) => {
                assert_eq!(message, "At least one recipient required.")
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            send_result("<html>Log in</html>"),
            Err(ApiError::Parse(_))
        ));
        assert!(matches!(send_result(""), Err(ApiError::Parse(_))));
    }

    #[test]
    fn test_truncate_str_char_boundary() {
        assert_eq!(truncate_str("héllo", 2), "h");
        assert_eq!(truncate_str("abc", 10), "abc");
    }
}
