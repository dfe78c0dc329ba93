//! App Context

use std::{fmt, sync::Arc};

use thiserror::Error;
use tracing::info;

use crate::{
    auth::{ConfigurationError, LoginService, MagicCodeLogin, RoleName, SessionIssuer},
    bootstrap::{BootstrapError, rotate_server_credentials},
    database::Db,
    mail::Mailer,
    settings::{AppSettings, AuthSettings},
    users::{PgUsersService, UsersService},
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("invalid configuration")]
    Configuration(#[from] ConfigurationError),

    #[error("failed to bootstrap database credentials")]
    Bootstrap(#[from] BootstrapError),
}

/// Process-wide services, built once before the listener is bound.
#[derive(Clone)]
pub struct AppContext {
    pub db: Db,
    pub sessions: Arc<SessionIssuer>,
    pub login: Arc<dyn LoginService>,
    pub users: Arc<dyn UsersService>,
    pub public_role: RoleName,
}

impl AppContext {
    /// Build the application context.
    ///
    /// The signing secret is checked before any database work. The database
    /// handle is the server-role pool produced by credential rotation.
    pub async fn bootstrap(
        settings: &AppSettings,
        mailer: Arc<dyn Mailer>,
    ) -> Result<Self, AppInitError> {
        let sessions = SessionIssuer::new(&settings.auth.signing_secret, settings.auth.session_ttl)?;

        let pool = rotate_server_credentials(&settings.database).await?;

        info!("application context ready");

        Ok(Self::from_parts(
            Db::new(pool),
            Arc::new(sessions),
            mailer,
            &settings.auth,
        ))
    }

    /// Assemble the context around an already connected database.
    #[must_use]
    pub fn from_parts(
        db: Db,
        sessions: Arc<SessionIssuer>,
        mailer: Arc<dyn Mailer>,
        auth: &AuthSettings,
    ) -> Self {
        let users: Arc<dyn UsersService> = Arc::new(PgUsersService::new(db.pool().clone()));

        let login = Arc::new(MagicCodeLogin::new(
            Arc::clone(&users),
            mailer,
            Arc::clone(&sessions),
            auth.magic_code_ttl,
        ));

        Self {
            db,
            sessions,
            login,
            users,
            public_role: auth.public_role.clone(),
        }
    }
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("db", &self.db)
            .field("sessions", &self.sessions)
            .field("public_role", &self.public_role)
            .finish_non_exhaustive()
    }
}
