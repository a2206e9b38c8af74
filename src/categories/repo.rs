use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo::User;
use crate::error::ApiError;

/// Default list used until a user first customizes their categories.
pub const DEFAULT_CATEGORIES: [&str; 7] = [
    "Web Development",
    "Mobile App",
    "UI/UX Design",
    "Branding",
    "Content Writing",
    "Marketing",
    "Other",
];

/// Projects tagged with a deleted category are reassigned here.
pub const FALLBACK_CATEGORY: &str = "Other";

pub fn default_list() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect()
}

pub async fn list_for(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<String>> {
    Ok(User::get_categories(db, user_id)
        .await?
        .unwrap_or_else(default_list))
}

pub async fn store(db: &PgPool, user_id: Uuid, categories: &[String]) -> anyhow::Result<()> {
    User::set_categories(db, user_id, categories).await?;
    Ok(())
}

// Pure list mutations, shared by the persistent path and the demo sandbox.

pub fn add(list: &[String], name: &str) -> Result<Vec<String>, ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("name is required".into()));
    }
    if list.iter().any(|c| c == name) {
        return Err(ApiError::Conflict("Category already exists".into()));
    }
    let mut next = list.to_vec();
    next.push(name.to_string());
    Ok(next)
}

pub fn rename(list: &[String], from: &str, to: &str) -> Result<Vec<String>, ApiError> {
    let from = from.trim();
    let to = to.trim();
    if to.is_empty() {
        return Err(ApiError::Validation("to is required".into()));
    }
    if !list.iter().any(|c| c == from) {
        return Err(ApiError::NotFound("Category not found".into()));
    }
    if list.iter().any(|c| c == to) {
        return Err(ApiError::Conflict("Category already exists".into()));
    }
    Ok(list
        .iter()
        .map(|c| {
            if c == from {
                to.to_string()
            } else {
                c.clone()
            }
        })
        .collect())
}

pub fn remove(list: &[String], name: &str) -> Result<Vec<String>, ApiError> {
    let name = name.trim();
    if !list.iter().any(|c| c == name) {
        return Err(ApiError::NotFound("Category not found".into()));
    }
    Ok(list.iter().filter(|c| *c != name).cloned().collect())
}
