//! Request Magic Code Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::{extensions::*, login::errors::into_status_error, state::State};

/// Magic Code Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct MagicCodeRequest {
    /// Address of an existing user
    pub email: String,

    /// Mail template the relay renders the code with
    pub template: String,
}

/// Request Magic Code Handler
///
/// Mails a one-time code to the user. The code is never returned.
#[endpoint(
    tags("login"),
    summary = "Request a magic code",
    responses(
        (status_code = StatusCode::NO_CONTENT, description = "Code sent"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Unauthorized"),
        (status_code = StatusCode::BAD_GATEWAY, description = "Mail delivery failed"),
        (status_code = StatusCode::SERVICE_UNAVAILABLE, description = "Mail is not configured"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<MagicCodeRequest>,
    depot: &mut Depot,
) -> Result<StatusCode, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let request = json.into_inner();

    state
        .login
        .request_code(&request.email, &request.template)
        .await
        .map_err(into_status_error)?;

    Ok(StatusCode::NO_CONTENT)
}
