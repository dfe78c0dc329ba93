//! Role labels.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role assigned to requests that present no session token.
pub const DEFAULT_PUBLIC_ROLE: &str = "anonymous";

const MAX_ROLE_NAME_LEN: usize = 63;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoleNameError {
    #[error("role name cannot be empty")]
    Empty,

    #[error("role name exceeds {MAX_ROLE_NAME_LEN} characters")]
    TooLong,

    #[error("role name must match [a-z_][a-z0-9_]*")]
    InvalidCharacters,
}

/// Database role label carried by sessions and request contexts.
///
/// Restricted to lowercase identifiers so it can be used verbatim as a quoted
/// PostgreSQL role name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoleName(String);

impl RoleName {
    pub fn parse(value: &str) -> Result<Self, RoleNameError> {
        let mut chars = value.chars();

        let Some(first) = chars.next() else {
            return Err(RoleNameError::Empty);
        };

        if value.len() > MAX_ROLE_NAME_LEN {
            return Err(RoleNameError::TooLong);
        }

        if !(first.is_ascii_lowercase() || first == '_')
            || !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(RoleNameError::InvalidCharacters);
        }

        Ok(Self(value.to_string()))
    }

    /// The built-in public role.
    #[must_use]
    pub fn anonymous() -> Self {
        Self(DEFAULT_PUBLIC_ROLE.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RoleName {
    type Err = RoleNameError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for RoleName {
    type Error = RoleNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoleName> for String {
    fn from(value: RoleName) -> Self {
        value.0
    }
}
