//! Depot helper extensions.

use std::any::Any;

use gatehouse_app::{
    auth::{AuthContext, RoleName},
    users::records::UserUuid,
};
use salvo::prelude::{Depot, StatusError};

/// Helpers for mapping depot extraction failures to HTTP errors.
pub(crate) trait DepotExt {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError>;

    fn insert_auth_context(&mut self, context: AuthContext);

    /// The identity set by the auth middleware, if it ran.
    fn auth_context(&self) -> Option<&AuthContext>;

    /// The signed-in user and their role. Anonymous requests get a 401.
    fn authorized_or_401(&self) -> Result<(UserUuid, &RoleName), StatusError>;
}

impl DepotExt for Depot {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError> {
        self.obtain::<T>()
            .map_err(|_ignored| StatusError::internal_server_error())
    }

    fn insert_auth_context(&mut self, context: AuthContext) {
        self.inject(context);
    }

    fn auth_context(&self) -> Option<&AuthContext> {
        self.obtain::<AuthContext>().ok()
    }

    fn authorized_or_401(&self) -> Result<(UserUuid, &RoleName), StatusError> {
        match self.auth_context() {
            Some(AuthContext::Authorized { user, role }) => Ok((*user, role)),
            Some(AuthContext::Anonymous { .. }) | None => {
                Err(StatusError::unauthorized().brief("Unauthorized"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn member() -> TestResult<RoleName> {
        Ok(RoleName::parse("member")?)
    }

    #[test]
    fn missing_context_is_unauthorized() {
        let depot = Depot::new();

        assert!(depot.auth_context().is_none());
        assert!(depot.authorized_or_401().is_err());
    }

    #[test]
    fn anonymous_context_is_unauthorized() {
        let mut depot = Depot::new();

        depot.insert_auth_context(AuthContext::anonymous(RoleName::anonymous()));

        let error = depot.authorized_or_401().err();

        assert_eq!(error.map(|e| e.code), Some(salvo::http::StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn authorized_context_yields_user_and_role() -> TestResult {
        let user = UserUuid::new();
        let role = member()?;
        let mut depot = Depot::new();

        depot.insert_auth_context(AuthContext::authorized(user, role.clone()));

        let (found, found_role) = depot.authorized_or_401()?;

        assert_eq!(found, user);
        assert_eq!(found_role, &role);

        Ok(())
    }
}
