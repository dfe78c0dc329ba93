//! Database identities and connection strings.

use std::{fmt, str::FromStr};

use sqlx::{
    ConnectOptions, PgPool,
    postgres::{PgConnectOptions, PgPoolOptions},
    query_scalar,
};
use thiserror::Error;
use tracing::info;
use urlencoding::encode;

use crate::{secrets::RotationSecret, settings::DatabaseSettings};

const REDACTED_PASSWORD: &str = "***";

/// Which of the two database identities a descriptor stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseIdentity {
    /// Privileged identity used only while bootstrapping.
    Administrative,

    /// Constrained identity used for all request traffic.
    Server,
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("failed to open connection pool as {user}")]
    Connect {
        user: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("connection check failed as {user}")]
    Ping {
        user: String,
        #[source]
        source: sqlx::Error,
    },
}

/// Connection parameters for one database identity.
#[derive(Clone)]
pub struct CredentialDescriptor {
    identity: DatabaseIdentity,
    user: String,
    password: String,
    host: String,
    port: u16,
    database: String,
    disable_tls: bool,
}

impl CredentialDescriptor {
    /// Populate a descriptor from the settings snapshot.
    ///
    /// Host, port, database and TLS mode are shared. The administrative
    /// identity carries its configured password; the server identity never
    /// stores one.
    #[must_use]
    pub fn configure(settings: &DatabaseSettings, identity: DatabaseIdentity) -> Self {
        let (user, password) = match identity {
            DatabaseIdentity::Administrative => {
                (settings.admin_user.clone(), settings.admin_password.clone())
            }
            DatabaseIdentity::Server => (settings.server_role.clone(), String::new()),
        };

        Self {
            identity,
            user,
            password,
            host: settings.host.clone(),
            port: settings.port,
            database: settings.name.clone(),
            disable_tls: settings.disable_tls,
        }
    }

    #[must_use]
    pub fn identity(&self) -> DatabaseIdentity {
        self.identity
    }

    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Build a `postgres://` URI for this identity.
    ///
    /// For the server identity the password comes from `supplied` only; the
    /// argument is ignored for the administrative identity.
    #[must_use]
    pub fn connection_string(&self, supplied: Option<&RotationSecret>) -> String {
        let password = self.password_for(supplied);
        let encoded = (!password.is_empty()).then(|| encode(password));

        self.build_connection_string(encoded.as_deref())
    }

    /// Same as [`Self::connection_string`] with the password masked.
    #[must_use]
    pub fn redacted_connection_string(&self, supplied: Option<&RotationSecret>) -> String {
        let password = self.password_for(supplied);

        self.build_connection_string((!password.is_empty()).then_some(REDACTED_PASSWORD))
    }

    /// Open a pool for this identity and check it answers a query.
    ///
    /// Statement logging is off for the administrative identity since it
    /// executes password-bearing DDL.
    pub async fn open_connection(
        &self,
        supplied: Option<&RotationSecret>,
    ) -> Result<PgPool, CredentialError> {
        let redacted = self.redacted_connection_string(supplied);

        info!("connecting to {redacted}");

        let connect_error = |source| CredentialError::Connect {
            user: self.user.clone(),
            source,
        };

        let mut options =
            PgConnectOptions::from_str(&self.connection_string(supplied)).map_err(connect_error)?;

        if self.identity == DatabaseIdentity::Administrative {
            options = options.disable_statement_logging();
        }

        let pool = PgPoolOptions::new()
            .connect_with(options)
            .await
            .map_err(connect_error)?;

        query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&pool)
            .await
            .map_err(|source| CredentialError::Ping {
                user: self.user.clone(),
                source,
            })?;

        info!("connected to {redacted}");

        Ok(pool)
    }

    fn password_for<'a>(&'a self, supplied: Option<&'a RotationSecret>) -> &'a str {
        match self.identity {
            DatabaseIdentity::Administrative => &self.password,
            DatabaseIdentity::Server => supplied.map_or("", RotationSecret::expose),
        }
    }

    fn build_connection_string(&self, encoded_password: Option<&str>) -> String {
        let user = encode(&self.user);

        let credentials = match encoded_password {
            Some(password) => format!("{user}:{password}"),
            None => user.into_owned(),
        };

        let mut url = format!(
            "postgres://{credentials}@{}:{}/{}",
            self.host,
            self.port,
            encode(&self.database)
        );

        if self.disable_tls {
            url.push_str("?sslmode=disable");
        }

        url
    }
}

impl fmt::Debug for CredentialDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialDescriptor")
            .field("identity", &self.identity)
            .field("user", &self.user)
            .field("password", &"**redacted**")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("disable_tls", &self.disable_tls)
            .finish()
    }
}
