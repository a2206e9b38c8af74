//! Session boundary: every request is classified before any handler runs.
//! API routes are hard-gated on a valid cookie token; page routes are
//! soft-gated and only have a stale cookie cleared, each page re-checks for
//! itself.

use axum::{
    extract::{FromRef, Request, State},
    http::header::SET_COOKIE,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

use crate::auth::jwt::JwtKeys;
use crate::auth::principal::{clear_auth_cookie, AUTH_COOKIE};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Reachable without a token: login, logout, setup, health.
    Public,
    /// API namespace; a valid token is required before the handler runs.
    Api,
    /// Everything else (the served SPA); passes through regardless.
    Page,
}

const PUBLIC_PATHS: [&str; 4] = ["/api/login", "/api/logout", "/api/setup", "/api/health"];

pub fn classify(path: &str) -> RouteClass {
    if PUBLIC_PATHS.contains(&path) {
        RouteClass::Public
    } else if path == "/api" || path.starts_with("/api/") {
        RouteClass::Api
    } else {
        RouteClass::Page
    }
}

pub async fn session_boundary(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let keys = JwtKeys::from_ref(&state);
    let token = jar.get(AUTH_COOKIE).map(|c| c.value().to_string());

    match classify(request.uri().path()) {
        RouteClass::Public => next.run(request).await,
        RouteClass::Api => {
            let authenticated = token.as_deref().and_then(|t| keys.verify(t)).is_some();
            if !authenticated {
                debug!(path = %request.uri().path(), "api request without a valid token");
                return ApiError::AuthRequired.into_response();
            }
            next.run(request).await
        }
        RouteClass::Page => {
            let stale = token
                .as_deref()
                .map(|t| keys.verify(t).is_none())
                .unwrap_or(false);
            let mut response = next.run(request).await;
            if stale {
                if let Ok(value) = clear_auth_cookie().to_string().parse() {
                    response.headers_mut().append(SET_COOKIE, value);
                }
            }
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_is_public() {
        assert_eq!(classify("/api/login"), RouteClass::Public);
        assert_eq!(classify("/api/logout"), RouteClass::Public);
        assert_eq!(classify("/api/setup"), RouteClass::Public);
        assert_eq!(classify("/api/health"), RouteClass::Public);
    }

    #[test]
    fn api_namespace_is_hard_gated() {
        assert_eq!(classify("/api/projects"), RouteClass::Api);
        assert_eq!(classify("/api/projects/123"), RouteClass::Api);
        assert_eq!(classify("/api/categories"), RouteClass::Api);
        assert_eq!(classify("/api/me"), RouteClass::Api);
        assert_eq!(classify("/api"), RouteClass::Api);
        // Prefix must match on a path segment.
        assert_eq!(classify("/api/loginx"), RouteClass::Api);
    }

    #[test]
    fn everything_else_is_a_page() {
        assert_eq!(classify("/"), RouteClass::Page);
        assert_eq!(classify("/dashboard"), RouteClass::Page);
        assert_eq!(classify("/assets/app.js"), RouteClass::Page);
        assert_eq!(classify("/apifake"), RouteClass::Page);
    }
}
