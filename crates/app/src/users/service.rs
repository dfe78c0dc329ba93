//! Users service.

use async_trait::async_trait;
use mockall::automock;
use sqlx::PgPool;

use crate::users::{
    data::NewUser, errors::UsersServiceError, records::UserRecord,
    repository::PgUsersRepository,
};

#[derive(Debug, Clone)]
pub struct PgUsersService {
    repository: PgUsersRepository,
}

impl PgUsersService {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: PgUsersRepository::new(pool),
        }
    }
}

#[async_trait]
impl UsersService for PgUsersService {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, UsersServiceError> {
        self.repository
            .find_user_by_email(email)
            .await
            .map_err(Into::into)
    }

    async fn create_user(&self, user: NewUser) -> Result<UserRecord, UsersServiceError> {
        self.repository.create_user(user).await.map_err(Into::into)
    }
}

#[automock]
#[async_trait]
/// User persistence operations.
pub trait UsersService: Send + Sync {
    /// Finds a live user by email, ignoring case.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, UsersServiceError>;

    /// Creates a new user.
    async fn create_user(&self, user: NewUser) -> Result<UserRecord, UsersServiceError>;
}

#[cfg(test)]
mod tests {
    use sqlx::query;
    use testresult::TestResult;

    use crate::{auth::RoleName, test::TestContext, users::records::UserUuid};

    use super::*;

    fn new_user(email: &str) -> Result<NewUser, crate::auth::RoleNameError> {
        Ok(NewUser {
            uuid: UserUuid::new(),
            email: email.to_string(),
            role: RoleName::parse("member")?,
        })
    }

    #[tokio::test]
    async fn create_user_returns_stored_record() -> TestResult {
        let ctx = TestContext::new().await;
        let user = new_user("ada@example.com")?;

        let record = ctx.users.create_user(user.clone()).await?;

        assert_eq!(record.uuid, user.uuid);
        assert_eq!(record.email, "ada@example.com");
        assert_eq!(record.role.as_str(), "member");
        assert!(record.deleted_at.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn find_by_email_ignores_case() -> TestResult {
        let ctx = TestContext::new().await;
        let created = ctx.users.create_user(new_user("Ada@Example.com")?).await?;

        let found = ctx.users.find_by_email("ada@example.COM").await?;

        assert_eq!(found.map(|user| user.uuid), Some(created.uuid));

        Ok(())
    }

    #[tokio::test]
    async fn find_by_email_returns_none_for_unknown_address() -> TestResult {
        let ctx = TestContext::new().await;

        assert!(ctx.users.find_by_email("nobody@example.com").await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn soft_deleted_users_are_invisible() -> TestResult {
        let ctx = TestContext::new().await;
        let created = ctx.users.create_user(new_user("gone@example.com")?).await?;

        query("UPDATE users SET deleted_at = now() WHERE uuid = $1")
            .bind(created.uuid.into_uuid())
            .execute(ctx.db.pool())
            .await?;

        assert!(ctx.users.find_by_email("gone@example.com").await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn duplicate_email_returns_already_exists() -> TestResult {
        let ctx = TestContext::new().await;

        ctx.users.create_user(new_user("dup@example.com")?).await?;

        let result = ctx.users.create_user(new_user("DUP@example.com")?).await;

        assert!(
            matches!(result, Err(UsersServiceError::AlreadyExists)),
            "expected AlreadyExists, got {result:?}"
        );

        Ok(())
    }
}
