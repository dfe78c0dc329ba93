//! Redeem Magic Code Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use gatehouse_app::auth::IssuedSession;

use crate::{extensions::*, login::errors::into_redeem_status_error, state::State};

/// Redeem Magic Code Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct RedeemCodeRequest {
    pub email: String,
    pub code: String,
}

/// Session Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct SessionResponse {
    /// Bearer token for the `Authorization` header
    pub token: String,

    /// RFC 3339 expiry of the token
    pub expires_at: String,
}

impl From<IssuedSession> for SessionResponse {
    fn from(session: IssuedSession) -> Self {
        SessionResponse {
            expires_at: session.claims.expires_at().to_string(),
            token: session.token,
        }
    }
}

/// Redeem Magic Code Handler
#[endpoint(
    tags("login"),
    summary = "Exchange a magic code for a session",
    responses(
        (status_code = StatusCode::OK, description = "Session issued"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Unauthorized"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<RedeemCodeRequest>,
    depot: &mut Depot,
) -> Result<Json<SessionResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let request = json.into_inner();

    let session = state
        .login
        .redeem_code(&request.email, &request.code)
        .await
        .map_err(into_redeem_status_error)?;

    Ok(Json(session.into()))
}
