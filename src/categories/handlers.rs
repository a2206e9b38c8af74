use axum::{extract::State, http::StatusCode, routing::get, Router};
use tracing::{info, instrument};

use crate::{
    auth::{demo, principal::Principal},
    categories::{
        dto::{
            AddCategoryRequest, CascadeResponse, CategoryListResponse, DeleteCategoryRequest,
            RenameCategoryRequest,
        },
        repo::{self, FALLBACK_CATEGORY},
    },
    error::ApiError,
    extract::Json,
    projects,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/categories",
        get(list_categories)
            .post(add_category)
            .put(rename_category)
            .delete(delete_category),
    )
}

#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<CategoryListResponse>, ApiError> {
    let categories = match principal {
        Principal::Demo => repo::default_list(),
        Principal::User(user_id) => repo::list_for(&state.db, user_id).await?,
    };
    Ok(Json(CategoryListResponse { categories }))
}

#[instrument(skip(state, payload))]
pub async fn add_category(
    State(state): State<AppState>,
    principal: Principal,
    Json(payload): Json<AddCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryListResponse>), ApiError> {
    match principal {
        Principal::Demo => {
            let categories = repo::add(&repo::default_list(), &payload.name)?;
            Ok((StatusCode::CREATED, Json(CategoryListResponse { categories })))
        }
        Principal::User(user_id) => {
            let current = repo::list_for(&state.db, user_id).await?;
            let categories = repo::add(&current, &payload.name)?;
            repo::store(&state.db, user_id, &categories).await?;
            info!(user_id = %user_id, name = %payload.name.trim(), "category added");
            Ok((StatusCode::CREATED, Json(CategoryListResponse { categories })))
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn rename_category(
    State(state): State<AppState>,
    principal: Principal,
    Json(payload): Json<RenameCategoryRequest>,
) -> Result<Json<CascadeResponse>, ApiError> {
    let from = payload.from.trim();
    let to = payload.to.trim();
    match principal {
        Principal::Demo => {
            let categories = repo::rename(&repo::default_list(), from, to)?;
            let projects_updated = demo::demo_projects()
                .iter()
                .filter(|p| p.category == from)
                .count() as u64;
            Ok(Json(CascadeResponse { categories, projects_updated }))
        }
        Principal::User(user_id) => {
            let current = repo::list_for(&state.db, user_id).await?;
            let categories = repo::rename(&current, from, to)?;
            // Two sequential statements, intentionally unwrapped: a crash in
            // between leaves projects tagged with the old name until retried.
            repo::store(&state.db, user_id, &categories).await?;
            let projects_updated =
                projects::repo::retag_category(&state.db, user_id, from, to).await?;
            info!(
                user_id = %user_id, from = %from, to = %to,
                projects_updated, "category renamed"
            );
            Ok(Json(CascadeResponse { categories, projects_updated }))
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn delete_category(
    State(state): State<AppState>,
    principal: Principal,
    Json(payload): Json<DeleteCategoryRequest>,
) -> Result<Json<CascadeResponse>, ApiError> {
    let name = payload.name.trim();
    match principal {
        Principal::Demo => {
            let categories = repo::remove(&repo::default_list(), name)?;
            let projects_updated = demo::demo_projects()
                .iter()
                .filter(|p| p.category == name)
                .count() as u64;
            Ok(Json(CascadeResponse { categories, projects_updated }))
        }
        Principal::User(user_id) => {
            let current = repo::list_for(&state.db, user_id).await?;
            let categories = repo::remove(&current, name)?;
            repo::store(&state.db, user_id, &categories).await?;
            let projects_updated = if name == FALLBACK_CATEGORY {
                // Reassigning Other to Other would be a no-op update.
                0
            } else {
                projects::repo::retag_category(&state.db, user_id, name, FALLBACK_CATEGORY)
                    .await?
            };
            info!(
                user_id = %user_id, name = %name,
                projects_updated, "category deleted"
            );
            Ok(Json(CascadeResponse { categories, projects_updated }))
        }
    }
}
