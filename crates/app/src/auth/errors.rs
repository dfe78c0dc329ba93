//! Auth errors.

use thiserror::Error;

use crate::{mail::MailError, users::UsersServiceError};

/// Startup configuration that cannot be used.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("session signing secret is not configured")]
    MissingSigningSecret,
}

/// Reasons a session token is refused.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,

    #[error("token signature is invalid")]
    SignatureInvalid,

    #[error("token algorithm is not accepted")]
    AlgorithmMismatch,

    #[error("token has expired")]
    Expired,

    #[error("failed to sign token")]
    Encoding(#[source] jsonwebtoken::errors::Error),
}

/// Magic-code login failures.
#[derive(Debug, Error)]
pub enum LoginError {
    #[error("mail delivery is not configured")]
    MailNotConfigured,

    #[error("no user with that email")]
    UserNotFound,

    #[error("magic code is invalid or expired")]
    CodeInvalidOrExpired,

    #[error("failed to deliver magic code")]
    MailDelivery(#[source] MailError),

    #[error("user lookup failed")]
    Users(#[from] UsersServiceError),

    #[error("failed to issue session")]
    Session(#[from] TokenError),
}

impl From<MailError> for LoginError {
    fn from(error: MailError) -> Self {
        match error {
            MailError::NotConfigured => Self::MailNotConfigured,
            other => Self::MailDelivery(other),
        }
    }
}
