//! Server configuration module

use clap::Parser;
use gatehouse_app::settings::AppSettings;

use crate::config::{
    auth::AuthConfig, db::DatabaseConfig, mail::MailConfig, observability::LoggingConfig,
    server::ServerRuntimeConfig,
};

pub(crate) mod auth;
pub(crate) mod db;
pub(crate) mod mail;
pub(crate) mod observability;
pub(crate) mod server;

/// Gatehouse JSON API Server configuration
#[derive(Debug, Parser)]
#[command(name = "gatehouse-json", about = "Gatehouse JSON API Server", long_about = None)]
pub struct ServerConfig {
    /// Server network settings.
    #[command(flatten)]
    pub server: ServerRuntimeConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Database connection and identity settings.
    #[command(flatten)]
    pub database: DatabaseConfig,

    /// Session and login settings.
    #[command(flatten)]
    pub auth: AuthConfig,

    /// Mail relay settings.
    #[command(flatten)]
    pub mail: MailConfig,
}

impl ServerConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    /// Get the socket address for binding
    #[must_use]
    pub fn socket_addr(&self) -> String {
        self.server.socket_addr()
    }

    /// Settings handed to the application context.
    #[must_use]
    pub fn app_settings(&self) -> AppSettings {
        AppSettings {
            database: self.database.settings(),
            auth: self.auth.settings(),
            mail: self.mail.settings(),
        }
    }
}
