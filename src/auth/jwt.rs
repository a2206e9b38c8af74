use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use crate::auth::principal::Principal;
use crate::config::JwtConfig;
use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id, or the demo sentinel subject.
    pub sub: String,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig { secret, ttl_days } = state.config.jwt.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::from_secs(ttl_days.max(1) as u64 * 24 * 60 * 60),
        }
    }
}

impl JwtKeys {
    pub fn sign(&self, principal: &Principal) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: principal.subject(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(subject = %claims.sub, "token signed");
        Ok(token)
    }

    /// None on bad signature, expiry, or a malformed subject. Callers treat
    /// None as "unauthenticated" and nothing else.
    pub fn verify(&self, token: &str) -> Option<Principal> {
        let validation = Validation::default();
        let data = decode::<Claims>(token, &self.decoding, &validation).ok()?;
        Principal::from_subject(&data.claims.sub)
    }
}
