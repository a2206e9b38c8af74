use serde::Deserialize;
use tracing::warn;

/// Fallback signing secret used when JWT_SECRET is absent. Kept so a bare
/// checkout boots, but any real deployment must set its own secret.
pub const DEV_JWT_SECRET: &str = "freelancedesk-dev-secret-do-not-ship";

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let secret = match std::env::var("JWT_SECRET") {
            Ok(s) if !s.is_empty() => s,
            _ => {
                warn!("JWT_SECRET not set; falling back to the built-in dev secret");
                DEV_JWT_SECRET.to_string()
            }
        };
        let jwt = JwtConfig {
            secret,
            ttl_days: std::env::var("AUTH_TOKEN_TTL_DAYS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(7),
        };
        Ok(Self { database_url, jwt })
    }
}
