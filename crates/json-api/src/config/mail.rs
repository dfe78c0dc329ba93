//! Mail Config

use clap::Args;
use gatehouse_app::mail::MailSettings;

/// Mail relay settings. Login mail is disabled when no relay is set.
#[derive(Debug, Args)]
pub struct MailConfig {
    /// Mail relay base URL
    #[arg(long, env = "MAIL_RELAY_ADDR", default_value = "")]
    pub relay_addr: String,

    /// Mail relay bearer token
    #[arg(long, env = "MAIL_RELAY_TOKEN", default_value = "", hide_env_values = true)]
    pub relay_token: String,

    /// Sender name used in mail subjects
    #[arg(long, env = "MAIL_FROM_NAME", default_value = "Gatehouse")]
    pub from_name: String,
}

impl MailConfig {
    pub fn settings(&self) -> MailSettings {
        MailSettings {
            relay_addr: self.relay_addr.clone(),
            relay_token: self.relay_token.clone(),
            from_name: self.from_name.clone(),
        }
    }
}
