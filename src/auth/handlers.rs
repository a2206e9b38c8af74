use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use axum_extra::extract::cookie::CookieJar;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        demo,
        dto::{AuthResponse, ChangePasswordRequest, LoginRequest, PublicUser, SetupRequest},
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        principal::{auth_cookie, clear_auth_cookie, Principal},
        repo::User,
    },
    error::ApiError,
    extract::Json,
    state::AppState,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/setup", post(setup))
        .route("/change-password", post(change_password))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(mut payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError> {
    payload.username = payload.username.trim().to_string();
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "Username and password are required".into(),
        ));
    }

    let keys = JwtKeys::from_ref(&state);

    // The demo account lives outside the users table; its password hash is a
    // settings row.
    if payload.username == demo::DEMO_USERNAME {
        let hash = demo::fetch_password_hash(&state.db)
            .await?
            .ok_or(ApiError::InvalidCredentials)?;
        if !verify_password(&payload.password, &hash) {
            warn!("demo login with invalid password");
            return Err(ApiError::InvalidCredentials);
        }
        let token = keys.sign(&Principal::Demo)?;
        let jar = jar.add(auth_cookie(token, keys.ttl));
        info!("demo user logged in");
        return Ok((jar, Json(AuthResponse { user: demo::demo_user() })));
    }

    let user = match User::find_by_username(&state.db, &payload.username).await? {
        Some(u) => u,
        None => {
            warn!(username = %payload.username, "login unknown username");
            return Err(ApiError::InvalidCredentials);
        }
    };

    if !verify_password(&payload.password, &user.password_hash) {
        warn!(username = %payload.username, user_id = %user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let token = keys.sign(&Principal::User(user.id))?;
    let jar = jar.add(auth_cookie(token, keys.ttl));
    info!(user_id = %user.id, username = %user.username, "user logged in");
    Ok((jar, Json(AuthResponse { user: user.into() })))
}

#[instrument(skip(jar))]
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<Value>) {
    // Stateless tokens cannot be revoked; logout only clears the cookie.
    (
        jar.add(clear_auth_cookie()),
        Json(json!({ "message": "Logged out" })),
    )
}

#[instrument(skip(state))]
pub async fn me(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<PublicUser>, ApiError> {
    match principal {
        Principal::Demo => Ok(Json(demo::demo_user())),
        Principal::User(user_id) => {
            let user = User::find_by_id(&state.db, user_id)
                .await?
                .ok_or(ApiError::AuthRequired)?;
            Ok(Json(user.into()))
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn setup(
    State(state): State<AppState>,
    Json(mut payload): Json<SetupRequest>,
) -> Result<(StatusCode, Json<PublicUser>), ApiError> {
    if User::count(&state.db).await? > 0 {
        return Err(ApiError::Validation(
            "Setup has already been completed".into(),
        ));
    }

    payload.username = payload.username.trim().to_string();
    if payload.username.is_empty() {
        return Err(ApiError::Validation("username is required".into()));
    }
    if payload.username == demo::DEMO_USERNAME {
        return Err(ApiError::Conflict("Username is reserved".into()));
    }
    if payload.password.len() < 6 {
        return Err(ApiError::Validation(
            "Password must be at least 6 characters".into(),
        ));
    }
    if let Some(email) = payload.email.as_deref() {
        if !is_valid_email(email) {
            return Err(ApiError::Validation("Invalid email".into()));
        }
    }

    let hash = hash_password(&payload.password)?;
    let user = User::create(
        &state.db,
        &payload.username,
        &hash,
        payload.email.as_deref(),
        "admin",
    )
    .await?;

    info!(user_id = %user.id, username = %user.username, "bootstrap admin created");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    principal: Principal,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<Value>, ApiError> {
    if payload.new_password.len() < 6 {
        return Err(ApiError::Validation(
            "Password must be at least 6 characters".into(),
        ));
    }

    match principal {
        Principal::Demo => {
            let hash = demo::fetch_password_hash(&state.db)
                .await?
                .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
            if !verify_password(&payload.current_password, &hash) {
                return Err(ApiError::Validation("Current password is incorrect".into()));
            }
            let new_hash = hash_password(&payload.new_password)?;
            demo::set_password_hash(&state.db, &new_hash).await?;
            info!("demo password updated");
        }
        Principal::User(user_id) => {
            let user = User::find_by_id(&state.db, user_id)
                .await?
                .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
            if !verify_password(&payload.current_password, &user.password_hash) {
                return Err(ApiError::Validation("Current password is incorrect".into()));
            }
            let new_hash = hash_password(&payload.new_password)?;
            User::update_password(&state.db, user_id, &new_hash).await?;
            info!(user_id = %user_id, "password updated");
        }
    }

    Ok(Json(json!({ "message": "Password updated" })))
}
