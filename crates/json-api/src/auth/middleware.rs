//! Auth middleware.
//!
//! Requests without an `Authorization` header continue as the public role.
//! A bearer token must verify against the current signing secret, otherwise
//! the request stops here with a 401.

use std::sync::Arc;

use gatehouse_app::auth::{AuthContext, TokenError};
use salvo::{http::header::AUTHORIZATION, prelude::*};
use tracing::{debug, warn};

use crate::{extensions::*, state::State};

#[salvo::handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    let state = match depot.obtain_or_500::<Arc<State>>() {
        Ok(state) => Arc::clone(state),
        Err(error) => {
            res.render(error);
            ctrl.skip_rest();

            return;
        }
    };

    let context = match bearer_token(req) {
        BearerToken::Absent => AuthContext::anonymous(state.public_role.clone()),
        BearerToken::Invalid => {
            debug!("authorization header is not a bearer token");

            reject(res, ctrl);

            return;
        }
        BearerToken::Present(token) => match state.sessions.verify(token) {
            Ok(claims) => AuthContext::authorized(claims.sub, claims.role),
            Err(error) => {
                log_rejection(&error);

                reject(res, ctrl);

                return;
            }
        },
    };

    depot.insert_auth_context(context);

    ctrl.call_next(req, depot, res).await;
}

#[derive(Debug, PartialEq, Eq)]
enum BearerToken<'a> {
    Absent,
    Invalid,
    Present(&'a str),
}

fn bearer_token(req: &Request) -> BearerToken<'_> {
    let Some(value) = req.headers().get(AUTHORIZATION) else {
        return BearerToken::Absent;
    };

    let Ok(value) = value.to_str() else {
        return BearerToken::Invalid;
    };

    let mut parts = value.splitn(2, ' ');

    let (Some(scheme), Some(token)) = (parts.next(), parts.next().map(str::trim)) else {
        return BearerToken::Invalid;
    };

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return BearerToken::Invalid;
    }

    BearerToken::Present(token)
}

fn reject(res: &mut Response, ctrl: &mut FlowCtrl) {
    res.render(StatusError::unauthorized().brief("Unauthorized"));
    ctrl.skip_rest();
}

fn log_rejection(error: &TokenError) {
    match error {
        TokenError::AlgorithmMismatch => warn!("rejected session token: {error}"),
        TokenError::Malformed
        | TokenError::SignatureInvalid
        | TokenError::Expired
        | TokenError::Encoding(_) => debug!("rejected session token: {error}"),
    }
}
