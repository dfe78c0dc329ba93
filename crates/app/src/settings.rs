//! Application settings snapshot.
//!
//! Resolved once at startup by the binary that owns configuration parsing and
//! handed to [`crate::context::AppContext::bootstrap`].

use std::fmt;

use jiff::SignedDuration;

use crate::{auth::RoleName, mail::MailSettings};

/// Default session token lifetime.
pub const DEFAULT_SESSION_TTL: SignedDuration = SignedDuration::from_hours(24);

/// Default magic code lifetime.
pub const DEFAULT_MAGIC_CODE_TTL: SignedDuration = SignedDuration::from_secs(300);

/// Settings for every component built by the app context.
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub mail: MailSettings,
}

/// Shared connection parameters plus the two database identities.
#[derive(Clone)]
pub struct DatabaseSettings {
    /// Database server host.
    pub host: String,

    /// Database server port.
    pub port: u16,

    /// Database name.
    pub name: String,

    /// Append `sslmode=disable` to connection strings.
    pub disable_tls: bool,

    /// Administrative role used only during bootstrap.
    pub admin_user: String,

    /// Administrative role password. May be empty for trust authentication.
    pub admin_password: String,

    /// Constrained role used for all request traffic.
    pub server_role: String,
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("disable_tls", &self.disable_tls)
            .field("admin_user", &self.admin_user)
            .field("admin_password", &"**redacted**")
            .field("server_role", &self.server_role)
            .finish()
    }
}

/// Session and login settings.
#[derive(Clone)]
pub struct AuthSettings {
    /// Process-wide session signing secret. Must not be empty.
    pub signing_secret: String,

    /// Lifetime of issued session tokens.
    pub session_ttl: SignedDuration,

    /// Lifetime of magic codes.
    pub magic_code_ttl: SignedDuration,

    /// Role given to requests without a bearer token.
    pub public_role: RoleName,
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("signing_secret", &"**redacted**")
            .field("session_ttl", &self.session_ttl)
            .field("magic_code_ttl", &self.magic_code_ttl)
            .field("public_role", &self.public_role)
            .finish()
    }
}
