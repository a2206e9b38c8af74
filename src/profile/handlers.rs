use axum::{extract::State, routing::get, Router};
use tracing::{info, instrument};

use crate::{
    auth::{
        demo,
        dto::PublicUser,
        handlers::is_valid_email,
        principal::Principal,
        repo::User,
    },
    error::ApiError,
    extract::Json,
    profile::dto::UpdateProfileRequest,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/profile", get(get_profile).put(update_profile))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<PublicUser>, ApiError> {
    match principal {
        Principal::Demo => Ok(Json(demo::demo_user())),
        Principal::User(user_id) => {
            let user = User::find_by_id(&state.db, user_id)
                .await?
                .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
            Ok(Json(user.into()))
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    principal: Principal,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    let username = match payload.username {
        Some(u) => {
            let u = u.trim().to_string();
            if u.is_empty() {
                return Err(ApiError::Validation("username cannot be empty".into()));
            }
            if u == demo::DEMO_USERNAME {
                return Err(ApiError::Conflict("Username is reserved".into()));
            }
            Some(u)
        }
        None => None,
    };
    // Empty string clears the email; anything else must look like one.
    let email = match payload.email.as_deref().map(str::trim) {
        Some("") => Some(None),
        Some(e) => {
            if !is_valid_email(e) {
                return Err(ApiError::Validation("Invalid email".into()));
            }
            Some(Some(e.to_string()))
        }
        None => None,
    };

    match principal {
        Principal::Demo => {
            // Sandbox: echo the merged profile, persist nothing.
            let mut user = demo::demo_user();
            if let Some(u) = username {
                user.username = u;
            }
            if let Some(e) = email {
                user.email = e;
            }
            Ok(Json(user))
        }
        Principal::User(user_id) => {
            let current = User::find_by_id(&state.db, user_id)
                .await?
                .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

            let next_username = username.unwrap_or_else(|| current.username.clone());
            let next_email = match email {
                Some(e) => e,
                None => current.email.clone(),
            };

            // Uniqueness pre-check, not a constraint race fix.
            if next_username != current.username {
                if let Some(existing) =
                    User::find_by_username(&state.db, &next_username).await?
                {
                    if existing.id != user_id {
                        return Err(ApiError::Conflict("Username already taken".into()));
                    }
                }
            }

            let updated = User::update_profile(
                &state.db,
                user_id,
                &next_username,
                next_email.as_deref(),
            )
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

            info!(user_id = %user_id, "profile updated");
            Ok(Json(updated.into()))
        }
    }
}
