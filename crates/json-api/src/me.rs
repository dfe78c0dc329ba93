//! Current Identity Handler

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gatehouse_app::{auth::AuthContext, users::records::UserUuid};

use crate::extensions::*;

/// Identity attached to the request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct MeResponse {
    /// `anonymous` or `authorized`
    pub kind: String,

    /// Signed-in user, absent for anonymous requests
    pub user: Option<Uuid>,

    /// Role the request acts as
    pub role: String,
}

impl From<&AuthContext> for MeResponse {
    fn from(context: &AuthContext) -> Self {
        let kind = if context.is_authorized() {
            "authorized"
        } else {
            "anonymous"
        };

        MeResponse {
            kind: kind.to_string(),
            user: context.user().map(UserUuid::into_uuid),
            role: context.role().to_string(),
        }
    }
}

/// Current Identity Handler
#[endpoint(
    tags("sessions"),
    summary = "Describe the current identity",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Current identity"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Unauthorized"),
    ),
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<MeResponse>, StatusError> {
    let context = depot
        .auth_context()
        .ok_or_else(StatusError::internal_server_error)?;

    Ok(Json(context.into()))
}
