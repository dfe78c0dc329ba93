//! State

use std::{fmt, sync::Arc};

use gatehouse_app::{
    auth::{LoginService, RoleName, SessionIssuer},
    context::AppContext,
};

#[derive(Clone)]
pub(crate) struct State {
    pub(crate) sessions: Arc<SessionIssuer>,
    pub(crate) login: Arc<dyn LoginService>,
    pub(crate) public_role: RoleName,
}

impl State {
    #[must_use]
    pub(crate) fn new(
        sessions: Arc<SessionIssuer>,
        login: Arc<dyn LoginService>,
        public_role: RoleName,
    ) -> Self {
        Self {
            sessions,
            login,
            public_role,
        }
    }

    #[must_use]
    pub(crate) fn from_app_context(app: &AppContext) -> Arc<Self> {
        Arc::new(Self::new(
            Arc::clone(&app.sessions),
            Arc::clone(&app.login),
            app.public_role.clone(),
        ))
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("sessions", &self.sessions)
            .field("public_role", &self.public_role)
            .finish_non_exhaustive()
    }
}
