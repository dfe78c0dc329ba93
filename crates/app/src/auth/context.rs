//! Per-request authorization context.

use serde::Serialize;

use crate::{auth::RoleName, users::records::UserUuid};

/// Identity attached to a request after the authorizer has run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuthContext {
    /// No session token was presented.
    Anonymous { role: RoleName },

    /// A valid session token was presented.
    Authorized { user: UserUuid, role: RoleName },
}

impl AuthContext {
    #[must_use]
    pub fn anonymous(role: RoleName) -> Self {
        Self::Anonymous { role }
    }

    #[must_use]
    pub fn authorized(user: UserUuid, role: RoleName) -> Self {
        Self::Authorized { user, role }
    }

    #[must_use]
    pub fn role(&self) -> &RoleName {
        match self {
            Self::Anonymous { role } | Self::Authorized { role, .. } => role,
        }
    }

    #[must_use]
    pub fn user(&self) -> Option<UserUuid> {
        match self {
            Self::Anonymous { .. } => None,
            Self::Authorized { user, .. } => Some(*user),
        }
    }

    #[must_use]
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::Authorized { .. })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;
    use uuid::Uuid;

    use super::*;

    #[test]
    fn anonymous_context_has_no_user() {
        let context = AuthContext::anonymous(RoleName::anonymous());

        assert_eq!(context.user(), None);
        assert_eq!(context.role().as_str(), "anonymous");
        assert!(!context.is_authorized());
    }

    #[test]
    fn authorized_context_serializes_user_and_role() -> TestResult {
        let user = UserUuid::from_uuid(Uuid::nil());
        let role = RoleName::parse("member")?;

        let value = serde_json::to_value(AuthContext::authorized(user, role))?;

        assert_eq!(
            value,
            json!({
                "kind": "authorized",
                "user": "00000000-0000-0000-0000-000000000000",
                "role": "member",
            })
        );

        Ok(())
    }
}
