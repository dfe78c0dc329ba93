//! Session token issuance and verification.

use std::fmt;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jiff::{SignedDuration, Timestamp};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    auth::{ConfigurationError, RoleName, TokenError},
    users::records::UserUuid,
};

/// `iss` claim stamped on every session token.
pub const SESSION_ISSUER: &str = "gatehouse";

/// The only signing algorithm issued or accepted.
pub const SESSION_ALGORITHM: Algorithm = Algorithm::HS256;

const SESSION_ALGORITHM_NAME: &str = "HS256";

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User the session belongs to.
    pub sub: UserUuid,

    /// Role the user acts as.
    pub role: RoleName,

    pub iss: String,

    /// Issued at, seconds since the Unix epoch.
    pub iat: i64,

    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

impl SessionClaims {
    #[must_use]
    pub fn new(user: UserUuid, role: RoleName, issued_at: Timestamp, ttl: SignedDuration) -> Self {
        let expires_at = issued_at.saturating_add(ttl).unwrap_or(Timestamp::MAX);

        Self {
            sub: user,
            role,
            iss: SESSION_ISSUER.to_string(),
            iat: issued_at.as_second(),
            exp: expires_at.as_second(),
        }
    }

    #[must_use]
    pub fn expires_at(&self) -> Timestamp {
        Timestamp::from_second(self.exp).unwrap_or(Timestamp::MAX)
    }
}

/// A freshly signed token and the claims inside it.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub claims: SessionClaims,
}

#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

/// Signs and verifies session tokens with one process-wide secret.
#[derive(Clone)]
pub struct SessionIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: SignedDuration,
}

impl SessionIssuer {
    /// Build an issuer from the configured signing secret.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::MissingSigningSecret`] when the secret is
    /// empty or whitespace.
    pub fn new(secret: &str, ttl: SignedDuration) -> Result<Self, ConfigurationError> {
        if secret.trim().is_empty() {
            return Err(ConfigurationError::MissingSigningSecret);
        }

        let mut validation = Validation::new(SESSION_ALGORITHM);

        validation.leeway = 0;
        validation.set_issuer(&[SESSION_ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        })
    }

    #[must_use]
    pub fn ttl(&self) -> SignedDuration {
        self.ttl
    }

    /// Issue a token for `user` acting as `role`, valid for the configured TTL.
    pub fn issue(&self, user: UserUuid, role: RoleName) -> Result<IssuedSession, TokenError> {
        let claims = SessionClaims::new(user, role, Timestamp::now(), self.ttl);
        let token = self.issue_claims(&claims)?;

        Ok(IssuedSession { token, claims })
    }

    /// Sign an explicit claim set.
    pub fn issue_claims(&self, claims: &SessionClaims) -> Result<String, TokenError> {
        encode(&Header::new(SESSION_ALGORITHM), claims, &self.encoding).map_err(TokenError::Encoding)
    }

    /// Verify a token's algorithm, signature, issuer and expiry.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        check_algorithm(token)?;

        decode::<SessionClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|error| {
                debug!("session token rejected: {error}");

                match error.kind() {
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
                    ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                        TokenError::AlgorithmMismatch
                    }
                    _ => TokenError::Malformed,
                }
            })
    }
}

impl fmt::Debug for SessionIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionIssuer")
            .field("algorithm", &SESSION_ALGORITHM)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

/// Reject any token whose header names an algorithm other than HS256.
///
/// Runs on the raw header so that algorithms the JWT library cannot represent
/// (`none`, unknown names) are reported as a mismatch rather than as garbage.
fn check_algorithm(token: &str) -> Result<(), TokenError> {
    let mut segments = token.split('.');

    let (Some(header), Some(_payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(TokenError::Malformed);
    };

    let header = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|_ignored| TokenError::Malformed)?;

    let header: RawHeader =
        serde_json::from_slice(&header).map_err(|_ignored| TokenError::Malformed)?;

    if header.alg != SESSION_ALGORITHM_NAME {
        debug!(alg = %header.alg, "session token uses unexpected algorithm");

        return Err(TokenError::AlgorithmMismatch);
    }

    Ok(())
}
