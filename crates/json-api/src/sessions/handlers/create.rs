//! Create Session Handler

use std::sync::Arc;

use salvo::prelude::*;

use crate::{extensions::*, login::redeem::SessionResponse, state::State};

/// Create Session Handler
///
/// Issues a fresh token for the identity on the current one.
#[endpoint(
    tags("sessions"),
    summary = "Refresh the current session",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Session issued"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Unauthorized"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<SessionResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let (user, role) = depot.authorized_or_401()?;

    let session = state
        .sessions
        .issue(user, role.clone())
        .or_500("failed to issue session")?;

    res.status_code(StatusCode::CREATED);

    Ok(Json(session.into()))
}
