use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration as TimeDuration;
use uuid::Uuid;

use crate::auth::jwt::JwtKeys;
use crate::error::ApiError;

pub const AUTH_COOKIE: &str = "auth-token";

/// Fixed subject recognized as the sandboxed demo account.
pub const DEMO_SUBJECT: &str = "demo";

/// Caller identity, decided once at token verification. Handlers match on
/// this instead of comparing id strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Principal {
    User(Uuid),
    Demo,
}

impl Principal {
    pub fn subject(&self) -> String {
        match self {
            Principal::User(id) => id.to_string(),
            Principal::Demo => DEMO_SUBJECT.to_string(),
        }
    }

    pub fn from_subject(sub: &str) -> Option<Self> {
        if sub == DEMO_SUBJECT {
            return Some(Principal::Demo);
        }
        Uuid::parse_str(sub).ok().map(Principal::User)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(AUTH_COOKIE)
            .map(|c| c.value().to_string())
            .ok_or(ApiError::AuthRequired)?;
        keys.verify(&token).ok_or(ApiError::AuthRequired)
    }
}

pub fn auth_cookie(token: String, ttl: std::time::Duration) -> Cookie<'static> {
    let mut cookie = Cookie::new(AUTH_COOKIE, token);
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(TimeDuration::seconds(ttl.as_secs() as i64));
    cookie
}

/// Expired empty cookie; adding it to a response clears the client's token.
pub fn clear_auth_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::new(AUTH_COOKIE, "");
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(TimeDuration::ZERO);
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_roundtrip_for_user() {
        let id = Uuid::new_v4();
        let p = Principal::User(id);
        assert_eq!(Principal::from_subject(&p.subject()), Some(p));
    }

    #[test]
    fn demo_subject_maps_to_demo_principal() {
        assert_eq!(Principal::from_subject("demo"), Some(Principal::Demo));
        assert_eq!(Principal::Demo.subject(), "demo");
    }

    #[test]
    fn junk_subject_is_rejected() {
        assert_eq!(Principal::from_subject("not-a-uuid"), None);
        assert_eq!(Principal::from_subject(""), None);
        assert_eq!(Principal::from_subject("Demo"), None);
    }

    #[test]
    fn auth_cookie_is_http_only_and_scoped_to_root() {
        let cookie = auth_cookie("tok".into(), std::time::Duration::from_secs(60));
        assert_eq!(cookie.name(), AUTH_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let cookie = clear_auth_cookie();
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(TimeDuration::ZERO));
    }
}
