//! Test helpers.

use std::sync::Arc;

use gatehouse_app::auth::{MockLoginService, RoleName, SessionIssuer};
use jiff::SignedDuration;
use salvo::{affix_state::inject, prelude::*};

use crate::{auth, state::State};

pub(crate) const TEST_SIGNING_SECRET: &str = "test-signing-secret";

pub(crate) fn test_sessions() -> Arc<SessionIssuer> {
    match SessionIssuer::new(TEST_SIGNING_SECRET, SignedDuration::from_hours(1)) {
        Ok(sessions) => Arc::new(sessions),
        Err(error) => unreachable!("test signing secret is not empty: {error}"),
    }
}

pub(crate) fn strict_login_mock() -> MockLoginService {
    let mut login = MockLoginService::new();

    login.expect_request_code().never();
    login.expect_redeem_code().never();

    login
}

pub(crate) fn test_state(login: MockLoginService) -> Arc<State> {
    Arc::new(State::new(
        test_sessions(),
        Arc::new(login),
        RoleName::anonymous(),
    ))
}

/// A service with the auth middleware in front of `route`.
pub(crate) fn authorized_service(login: MockLoginService, route: Router) -> Service {
    Service::new(
        Router::new()
            .hoop(inject(test_state(login)))
            .hoop(auth::middleware::handler)
            .push(route),
    )
}

/// A service with only state injected.
pub(crate) fn login_service(login: MockLoginService, route: Router) -> Service {
    Service::new(Router::new().hoop(inject(test_state(login))).push(route))
}
