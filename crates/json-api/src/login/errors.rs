//! Login Errors

use salvo::http::StatusError;
use tracing::{error, warn};

use gatehouse_app::auth::LoginError;

/// Map a failed code request to a response.
///
/// Unknown addresses get the same generic 401 as any other rejected login so
/// the endpoint does not reveal which addresses have accounts.
pub(super) fn into_status_error(error: LoginError) -> StatusError {
    match error {
        LoginError::UserNotFound | LoginError::CodeInvalidOrExpired => {
            StatusError::unauthorized().brief("Unauthorized")
        }
        LoginError::MailNotConfigured => {
            StatusError::service_unavailable().brief("Mail is not configured")
        }
        LoginError::MailDelivery(source) => {
            warn!("failed to deliver magic code: {source}");

            StatusError::bad_gateway().brief("Failed to deliver mail")
        }
        LoginError::Users(source) => {
            error!("failed to look up login user: {source}");

            StatusError::internal_server_error()
        }
        LoginError::Session(source) => {
            error!("failed to issue session: {source}");

            StatusError::internal_server_error()
        }
    }
}

/// Map a failed redemption to a response. Every failure is a 401.
pub(super) fn into_redeem_status_error(error: LoginError) -> StatusError {
    match &error {
        LoginError::CodeInvalidOrExpired | LoginError::UserNotFound => {}
        LoginError::MailNotConfigured | LoginError::MailDelivery(_) => {
            warn!("unexpected mail error while redeeming magic code: {error}");
        }
        LoginError::Users(_) | LoginError::Session(_) => {
            error!("failed to redeem magic code: {error}");
        }
    }

    StatusError::unauthorized().brief("Unauthorized")
}

#[cfg(test)]
mod tests {
    use gatehouse_app::{auth::TokenError, mail::MailError, users::UsersServiceError};
    use salvo::http::StatusCode;

    use super::*;

    #[test]
    fn request_errors_map_to_statuses() {
        let cases = [
            (LoginError::UserNotFound, StatusCode::UNAUTHORIZED),
            (LoginError::CodeInvalidOrExpired, StatusCode::UNAUTHORIZED),
            (LoginError::MailNotConfigured, StatusCode::SERVICE_UNAVAILABLE),
            (
                LoginError::MailDelivery(MailError::UnexpectedResponse("500".to_string())),
                StatusCode::BAD_GATEWAY,
            ),
            (
                LoginError::Users(UsersServiceError::InvalidData),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                LoginError::Session(TokenError::Malformed),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(into_status_error(error).code, expected);
        }
    }

    #[test]
    fn redeem_errors_are_always_unauthorized() {
        for error in [
            LoginError::CodeInvalidOrExpired,
            LoginError::Session(TokenError::Malformed),
            LoginError::Users(UsersServiceError::InvalidData),
        ] {
            assert_eq!(into_redeem_status_error(error).code, StatusCode::UNAUTHORIZED);
        }
    }
}
