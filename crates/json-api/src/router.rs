//! App Router

use std::{sync::Arc, time::Duration};

use salvo::{
    Router, Service,
    affix_state::inject,
    cors::{AllowHeaders, AllowOrigin, Cors, CorsHandler, ExposeHeaders},
    http::{
        Method,
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderName, LINK},
    },
    oapi::{
        OpenApi,
        security::{Http, HttpAuthScheme, SecurityScheme},
        swagger_ui::SwaggerUi,
    },
    prelude::CatchPanic,
    timeout::Timeout,
    trailing_slash::remove_slash,
};

use crate::{
    auth, healthcheck, login, me, observability::request_logging, sessions, state::State,
};

/// Public login routes plus the routes behind the auth middleware.
pub fn app_router() -> Router {
    Router::new()
        .push(Router::with_path("healthcheck").get(healthcheck::handler))
        .push(Router::with_path("login").post(login::request::handler))
        .push(Router::with_path("magiccode").post(login::redeem::handler))
        .push(
            Router::new()
                .hoop(auth::middleware::handler)
                .push(Router::with_path("sessions").post(sessions::create::handler))
                .push(Router::with_path("me").get(me::handler)),
        )
}

/// Wrap `routes` in the request middleware, API docs and CORS.
///
/// Requests running longer than `request_timeout` are answered with a
/// timeout error and their handler future is dropped.
pub(crate) fn service(state: Arc<State>, request_timeout: Duration, routes: Router) -> Service {
    let router = Router::new()
        .hoop(CatchPanic::new())
        .hoop(remove_slash())
        .hoop(request_logging)
        .hoop(Timeout::new(request_timeout))
        .hoop(inject(state))
        .push(routes);

    let doc = OpenApi::new("Gatehouse API", env!("CARGO_PKG_VERSION"))
        .add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        )
        .merge_router(&router);

    let router = router
        .push(doc.into_router("/api-doc/openapi.json"))
        .push(SwaggerUi::new("/api-doc/openapi.json").into_router("docs"));

    Service::new(router).hoop(cors())
}

/// Browser access for any origin.
///
/// Credentials are not allowed: a wildcard origin cannot be combined with
/// them, and sessions travel in the `Authorization` header.
fn cors() -> CorsHandler {
    let mut methods = vec![
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];

    methods.extend(Method::from_bytes(b"SEARCH").ok());

    Cors::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(methods)
        .allow_headers(AllowHeaders::list([
            ACCEPT,
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static("x-csrf-token"),
        ]))
        .expose_headers(ExposeHeaders::list([LINK]))
        .max_age(Duration::from_secs(300))
        .into_handler()
}

#[cfg(test)]
mod tests {
    use salvo::{
        handler,
        http::{
            StatusCode,
            header::{
                ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_MAX_AGE,
                ACCESS_CONTROL_REQUEST_METHOD, ORIGIN,
            },
        },
        test::{ResponseExt, TestClient},
    };
    use testresult::TestResult;

    use crate::{
        healthcheck::HealthResponse,
        me::MeResponse,
        test_helpers::{strict_login_mock, test_state},
    };

    use super::*;

    const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    fn make_service() -> Service {
        service(test_state(strict_login_mock()), DEFAULT_TIMEOUT, app_router())
    }

    #[handler]
    async fn slow() -> &'static str {
        tokio::time::sleep(Duration::from_secs(5)).await;

        "finished"
    }

    fn header<'a>(res: &'a salvo::Response, name: &salvo::http::HeaderName) -> Option<&'a str> {
        res.headers().get(name).and_then(|value| value.to_str().ok())
    }

    #[tokio::test]
    async fn healthcheck_is_public() -> TestResult {
        let response: HealthResponse = TestClient::get("http://example.com/healthcheck")
            .send(&make_service())
            .await
            .take_json()
            .await?;

        assert_eq!(response.status, "ok");

        Ok(())
    }

    #[tokio::test]
    async fn me_runs_behind_the_authorizer() -> TestResult {
        let response: MeResponse = TestClient::get("http://example.com/me")
            .send(&make_service())
            .await
            .take_json()
            .await?;

        assert_eq!(response.kind, "anonymous");

        Ok(())
    }

    #[tokio::test]
    async fn malformed_authorization_is_rejected_on_protected_routes() {
        let res = TestClient::post("http://example.com/sessions")
            .add_header(AUTHORIZATION, "Token abc", true)
            .send(&make_service())
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));
    }

    #[tokio::test]
    async fn cors_headers_are_added_for_cross_origin_requests() {
        let res = TestClient::get("http://example.com/healthcheck")
            .add_header(ORIGIN, "https://app.example.org", true)
            .send(&make_service())
            .await;

        let allowed = res
            .headers()
            .get("access-control-allow-origin")
            .and_then(|value| value.to_str().ok());

        assert_eq!(allowed, Some("*"));
    }

    #[tokio::test]
    async fn requests_past_the_timeout_get_a_timeout_response() -> TestResult {
        let slow_service = service(
            test_state(strict_login_mock()),
            Duration::from_millis(50),
            Router::with_path("slow").get(slow),
        );

        let mut res = TestClient::get("http://example.com/slow")
            .send(&slow_service)
            .await;

        assert_eq!(res.status_code, Some(StatusCode::SERVICE_UNAVAILABLE));
        assert_ne!(res.take_string().await?, "finished");

        Ok(())
    }

    #[tokio::test]
    async fn preflight_lists_allowed_methods() {
        let res = TestClient::options("http://example.com/login")
            .add_header(ORIGIN, "https://app.example.org", true)
            .add_header(ACCESS_CONTROL_REQUEST_METHOD, "SEARCH", true)
            .send(&make_service())
            .await;

        let methods = header(&res, &ACCESS_CONTROL_ALLOW_METHODS).unwrap_or_default();

        assert!(methods.contains("SEARCH"), "allowed methods: {methods}");
        assert!(methods.contains("DELETE"), "allowed methods: {methods}");
        assert_eq!(header(&res, &ACCESS_CONTROL_MAX_AGE), Some("300"));
    }
}
