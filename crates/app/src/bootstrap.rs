//! Startup rotation of the server role's database password.

use sqlx::{PgPool, query, query_scalar};
use thiserror::Error;
use tracing::info;
use zeroize::Zeroizing;

use crate::{
    credentials::{CredentialDescriptor, CredentialError, DatabaseIdentity},
    secrets::RotationSecret,
    settings::DatabaseSettings,
};

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("failed to connect with the administrative identity")]
    AdminConnection(#[source] CredentialError),

    #[error("failed to quote server role name")]
    QuoteRole(#[source] sqlx::Error),

    #[error("failed to set server role password")]
    SetPassword(#[source] sqlx::Error),

    #[error("failed to connect with the server identity")]
    ServerConnection(#[source] CredentialError),
}

/// Mint a fresh password for the server role and connect as it.
///
/// Connects as the administrative identity, installs a newly generated
/// secret as the server role's password, closes the administrative pool and
/// returns a pool authenticated as the server role. Every step is fatal.
pub async fn rotate_server_credentials(
    settings: &DatabaseSettings,
) -> Result<PgPool, BootstrapError> {
    let admin = CredentialDescriptor::configure(settings, DatabaseIdentity::Administrative);
    let server = CredentialDescriptor::configure(settings, DatabaseIdentity::Server);

    let admin_pool = admin
        .open_connection(None)
        .await
        .map_err(BootstrapError::AdminConnection)?;

    let secret = RotationSecret::generate();

    let rotated = set_role_password(&admin_pool, server.user(), &secret).await;

    admin_pool.close().await;
    rotated?;

    info!(role = server.user(), "server role password rotated");

    server
        .open_connection(Some(&secret))
        .await
        .map_err(BootstrapError::ServerConnection)
}

/// Set `role`'s login password, quoting both values server-side.
pub async fn set_role_password(
    pool: &PgPool,
    role: &str,
    secret: &RotationSecret,
) -> Result<(), BootstrapError> {
    let role_ident: String = query_scalar("SELECT quote_ident($1)")
        .bind(role)
        .fetch_one(pool)
        .await
        .map_err(BootstrapError::QuoteRole)?;

    let password_lit: Zeroizing<String> = Zeroizing::new(
        query_scalar::<_, String>("SELECT quote_literal($1)")
            .bind(secret.expose())
            .fetch_one(pool)
            .await
            .map_err(BootstrapError::SetPassword)?,
    );

    let statement = Zeroizing::new(format!(
        "ALTER ROLE {role_ident} WITH LOGIN PASSWORD {}",
        password_lit.as_str()
    ));

    query(statement.as_str())
        .execute(pool)
        .await
        .map_err(BootstrapError::SetPassword)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::test::TestDb;

    use super::*;

    #[tokio::test]
    async fn server_pool_connects_as_server_role() -> TestResult {
        let test_db = TestDb::new().await;
        let role = test_db.create_login_role("rotated").await;

        let pool = rotate_server_credentials(&test_db.settings(&role)).await?;

        let current: String = query_scalar("SELECT current_user::text")
            .fetch_one(&pool)
            .await?;

        assert_eq!(current, role);

        pool.close().await;

        Ok(())
    }

    #[tokio::test]
    async fn rotation_installs_a_new_password_each_run() -> TestResult {
        let test_db = TestDb::new().await;
        let role = test_db.create_login_role("repeat").await;

        let read_verifier = || {
            query_scalar::<_, Option<String>>(
                "SELECT rolpassword FROM pg_authid WHERE rolname = $1",
            )
            .bind(role.clone())
            .fetch_one(test_db.pool())
        };

        rotate_server_credentials(&test_db.settings(&role))
            .await?
            .close()
            .await;
        let first = read_verifier().await?;

        rotate_server_credentials(&test_db.settings(&role))
            .await?
            .close()
            .await;
        let second = read_verifier().await?;

        assert!(first.is_some());
        assert_ne!(first, second);

        Ok(())
    }

    #[tokio::test]
    async fn missing_server_role_fails_to_set_password() {
        let test_db = TestDb::new().await;

        let result = rotate_server_credentials(&test_db.settings("no_such_role")).await;

        assert!(
            matches!(result, Err(BootstrapError::SetPassword(_))),
            "expected SetPassword, got {result:?}"
        );
    }

    #[tokio::test]
    async fn unreachable_admin_database_fails_before_rotation() {
        let test_db = TestDb::new().await;
        let mut settings = test_db.settings("anything");
        settings.name = "database_that_does_not_exist".to_string();

        let result = rotate_server_credentials(&settings).await;

        assert!(matches!(result, Err(BootstrapError::AdminConnection(_))));
    }
}
