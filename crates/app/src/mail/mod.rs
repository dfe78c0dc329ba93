//! Outbound mail capability.

use std::{collections::BTreeMap, fmt, sync::Arc};

use async_trait::async_trait;
use mockall::automock;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

mod relay;

pub use relay::RelayMailer;

/// Errors that can occur when handing a message to the mail relay.
#[derive(Debug, Error)]
pub enum MailError {
    /// No relay is configured or the relay failed its startup health check.
    #[error("mail is not configured")]
    NotConfigured,

    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The relay returned a non-2xx response.
    #[error("unexpected response from mail relay: {0}")]
    UnexpectedResponse(String),
}

/// A templated message for a single recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub template: String,
    pub data: BTreeMap<String, String>,
}

/// Mail relay connection settings.
#[derive(Clone, Default)]
pub struct MailSettings {
    /// Relay base address, e.g. `"http://localhost:8025"`. Empty disables mail.
    pub relay_addr: String,

    /// Bearer token presented to the relay.
    pub relay_token: String,

    /// Display name used in outgoing subjects.
    pub from_name: String,
}

impl fmt::Debug for MailSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailSettings")
            .field("relay_addr", &self.relay_addr)
            .field("relay_token", &"**redacted**")
            .field("from_name", &self.from_name)
            .finish()
    }
}

#[automock]
#[async_trait]
/// Something that can deliver templated mail.
pub trait Mailer: Send + Sync {
    /// Whether messages can currently be sent.
    fn is_operational(&self) -> bool;

    /// Display name of the sender.
    fn from_name(&self) -> String;

    /// Deliver one message.
    async fn send(&self, message: MailMessage) -> Result<(), MailError>;
}

/// Mailer used when no relay is available. Every send fails.
#[derive(Debug, Clone, Default)]
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    fn is_operational(&self) -> bool {
        false
    }

    fn from_name(&self) -> String {
        String::new()
    }

    async fn send(&self, _message: MailMessage) -> Result<(), MailError> {
        Err(MailError::NotConfigured)
    }
}

/// Build the process mailer from settings.
///
/// Falls back to [`DisabledMailer`] when no relay address is set or the relay
/// does not answer its health check.
pub async fn connect(settings: MailSettings) -> Arc<dyn Mailer> {
    if settings.relay_addr.trim().is_empty() {
        warn!("mail relay is not configured, magic-code login is disabled");

        return Arc::new(DisabledMailer);
    }

    let mailer = RelayMailer::new(settings);

    match mailer.health_check().await {
        Ok(()) => Arc::new(mailer),
        Err(error) => {
            warn!("mail relay health check failed, magic-code login is disabled: {error}");

            Arc::new(DisabledMailer)
        }
    }
}
