//! HTTP mail relay client.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use crate::mail::{MailError, MailMessage, MailSettings, Mailer};

/// Client for a JSON-over-HTTP mail relay.
#[derive(Debug, Clone)]
pub struct RelayMailer {
    settings: MailSettings,
    http: Client,
}

impl RelayMailer {
    #[must_use]
    pub fn new(settings: MailSettings) -> Self {
        Self {
            settings,
            http: Client::new(),
        }
    }

    /// Check the relay answers its health endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error on HTTP failure or a non-2xx status.
    pub async fn health_check(&self) -> Result<(), MailError> {
        let url = self.url("/v1/health");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.settings.relay_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MailError::UnexpectedResponse(format!(
                "health check failed with status {}",
                response.status()
            )));
        }

        info!(relay = %self.settings.relay_addr, "mail relay is reachable");

        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.settings.relay_addr.trim_end_matches('/'))
    }
}

#[async_trait]
impl Mailer for RelayMailer {
    fn is_operational(&self) -> bool {
        true
    }

    fn from_name(&self) -> String {
        self.settings.from_name.clone()
    }

    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        let url = self.url("/v1/messages");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.settings.relay_token)
            .json(&message)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(MailError::UnexpectedResponse(format!(
                "send request failed with status {status}: {text}"
            )));
        }

        debug!(template = %message.template, "mail handed to relay");

        Ok(())
    }
}
