//! Database connection management

use sqlx::{PgPool, Postgres, Transaction, migrate::Migrator, query};

use crate::auth::AuthContext;

/// Schema migrations shared by the CLI and the test harness.
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// SQL used to set the acting user for row-level security.
pub const SET_USER_CONTEXT_SQL: &str = "SELECT set_config('app.current_user_uuid', $1, true)";

#[derive(Debug, Clone)]
pub struct Db {
    pool: PgPool,
}

impl Db {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Begin a transaction scoped to the request's role and user.
    ///
    /// Runs `SET LOCAL ROLE` for the context's role and sets
    /// `app.current_user_uuid` (empty for anonymous requests). Both revert
    /// when the transaction ends.
    ///
    /// # Errors
    ///
    /// Returns an error when starting the transaction or switching role fails.
    pub async fn begin_scoped_transaction(
        &self,
        context: &AuthContext,
    ) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        // `RoleName` only admits lowercase identifiers, so quoting is enough.
        query(&format!("SET LOCAL ROLE \"{}\"", context.role()))
            .execute(&mut *tx)
            .await?;

        query(SET_USER_CONTEXT_SQL)
            .bind(context.user().map(|user| user.to_string()).unwrap_or_default())
            .execute(&mut *tx)
            .await?;

        Ok(tx)
    }

    /// Wait for in-flight connections and close the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Connect to `PostgreSQL`.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPool::connect(database_url).await
}

/// Apply pending migrations.
///
/// # Errors
///
/// Returns an error if any migration fails.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}
