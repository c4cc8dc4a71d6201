use std::io::ErrorKind;
use std::time::Duration;

use autodocs_core::ChangePayload;

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("receiver unreachable: {0}")]
    Unreachable(String),
    #[error("server responded with {0}")]
    Status(u16),
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("cannot encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<ureq::Error> for DeliveryError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => DeliveryError::Status(code),
            ureq::Error::Timeout(_) => DeliveryError::Timeout,
            ureq::Error::ConnectionFailed => {
                DeliveryError::Unreachable("connection failed".to_string())
            }
            ureq::Error::HostNotFound => DeliveryError::Unreachable("host not found".to_string()),
            ureq::Error::Io(e) => match e.kind() {
                ErrorKind::ConnectionRefused
                | ErrorKind::ConnectionReset
                | ErrorKind::ConnectionAborted
                | ErrorKind::AddrNotAvailable => DeliveryError::Unreachable(e.to_string()),
                ErrorKind::TimedOut => DeliveryError::Timeout,
                _ => DeliveryError::Transport(e.to_string()),
            },
            other => DeliveryError::Transport(other.to_string()),
        }
    }
}

/// Destination for change payloads. Returns the HTTP status on success.
pub trait Sink: Send + Sync {
    fn deliver(&self, payload: &ChangePayload) -> Result<u16, DeliveryError>;

    /// Human-readable target, for logs.
    fn target(&self) -> &str;
}

// ── Webhook (JSON POST) ──

pub struct WebhookSink {
    url: String,
    agent: ureq::Agent,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self {
            url: url.into(),
            agent,
        }
    }
}

impl Sink for WebhookSink {
    fn deliver(&self, payload: &ChangePayload) -> Result<u16, DeliveryError> {
        let body = serde_json::to_string(payload)?;
        let response = self
            .agent
            .post(&self.url)
            .header("Content-Type", "application/json")
            .send(body)?;
        Ok(response.status().as_u16())
    }

    fn target(&self) -> &str {
        &self.url
    }
}
