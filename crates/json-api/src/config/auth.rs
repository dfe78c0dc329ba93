//! Auth Config

use clap::Args;
use gatehouse_app::{
    auth::RoleName,
    settings::{AuthSettings, DEFAULT_MAGIC_CODE_TTL, DEFAULT_SESSION_TTL},
};
use jiff::SignedDuration;

/// Session and login settings.
#[derive(Debug, Args)]
pub struct AuthConfig {
    /// Secret used to sign session tokens
    #[arg(long, env = "SIGNING_SECRET", hide_env_values = true)]
    pub signing_secret: String,

    /// Session token lifetime in seconds
    #[arg(
        long,
        env = "SESSION_TTL_SECS",
        default_value_t = DEFAULT_SESSION_TTL.as_secs(),
        value_parser = clap::value_parser!(i64).range(1..)
    )]
    pub session_ttl_secs: i64,

    /// Magic code lifetime in seconds
    #[arg(
        long,
        env = "MAGIC_CODE_TTL_SECS",
        default_value_t = DEFAULT_MAGIC_CODE_TTL.as_secs(),
        value_parser = clap::value_parser!(i64).range(1..)
    )]
    pub magic_code_ttl_secs: i64,

    /// Role for requests without a session token
    #[arg(long, env = "PUBLIC_ROLE", default_value = "anonymous")]
    pub public_role: RoleName,
}

impl AuthConfig {
    pub fn settings(&self) -> AuthSettings {
        AuthSettings {
            signing_secret: self.signing_secret.clone(),
            session_ttl: SignedDuration::from_secs(self.session_ttl_secs),
            magic_code_ttl: SignedDuration::from_secs(self.magic_code_ttl_secs),
            public_role: self.public_role.clone(),
        }
    }
}
