use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email: Option<String>,
    pub role: String,
    #[serde(skip_serializing)]
    pub categories: Option<Vec<String>>,
    pub created_at: OffsetDateTime,
}

const USER_COLUMNS: &str = "id, username, password_hash, email, role, categories, created_at";

impl User {
    pub async fn find_by_username(db: &PgPool, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn create(
        db: &PgPool,
        username: &str,
        password_hash: &str,
        email: Option<&str>,
        role: &str,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, password_hash, email, role)
             VALUES ($1, $2, $3, $4)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(username)
        .bind(password_hash)
        .bind(email)
        .bind(role)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    pub async fn count(db: &PgPool) -> anyhow::Result<i64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(db)
            .await?;
        Ok(n)
    }

    pub async fn update_password(db: &PgPool, id: Uuid, password_hash: &str) -> anyhow::Result<u64> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(db)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        username: &str,
        email: Option<&str>,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET username = $2, email = $3 WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(username)
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn get_categories(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Vec<String>>> {
        let stored: Option<Option<Vec<String>>> =
            sqlx::query_scalar("SELECT categories FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(db)
                .await?;
        Ok(stored.flatten())
    }

    pub async fn set_categories(db: &PgPool, id: Uuid, categories: &[String]) -> anyhow::Result<u64> {
        let result = sqlx::query("UPDATE users SET categories = $2 WHERE id = $1")
            .bind(id)
            .bind(categories)
            .execute(db)
            .await?;
        Ok(result.rows_affected())
    }
}
