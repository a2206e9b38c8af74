//! Sandboxed demo account. Reads come from a fixed canned dataset, writes are
//! acknowledged without touching the store. The demo password lives in the
//! `app_settings` table and is updated with a single atomic statement.

use rust_decimal::Decimal;
use sqlx::PgPool;
use time::macros::{date, datetime};
use uuid::{uuid, Uuid};

use crate::auth::dto::PublicUser;
use crate::auth::password::hash_password;
use crate::auth::principal::DEMO_SUBJECT;
use crate::projects::repo::Project;

pub const DEMO_USERNAME: &str = "demo";
pub const DEFAULT_DEMO_PASSWORD: &str = "demo123";

const DEMO_PASSWORD_KEY: &str = "demo_password";

/// Placeholder owner id stamped on canned projects; no such row exists.
const DEMO_OWNER_ID: Uuid = uuid!("00000000-0000-0000-0000-00000000d340");

pub fn demo_user() -> PublicUser {
    PublicUser {
        id: DEMO_SUBJECT.to_string(),
        username: DEMO_USERNAME.to_string(),
        email: Some("demo@freelancedesk.app".to_string()),
        role: "user".to_string(),
        created_at: datetime!(2024-01-15 00:00:00 UTC),
    }
}

pub fn demo_projects() -> Vec<Project> {
    vec![
        Project {
            id: uuid!("11111111-1111-4111-8111-111111111111"),
            owner_id: DEMO_OWNER_ID,
            title: "Portfolio website redesign".to_string(),
            client: "Acme Studio".to_string(),
            description: Some("Full redesign of the marketing site".to_string()),
            category: "Web Development".to_string(),
            budget: Decimal::new(450_000, 2),
            deadline: date!(2024 - 06 - 30),
            priority: "High".to_string(),
            status: "In Progress".to_string(),
            progress: 60,
            paid: Decimal::new(150_000, 2),
            created_at: datetime!(2024-02-01 09:00:00 UTC),
            updated_at: datetime!(2024-03-10 14:30:00 UTC),
        },
        Project {
            id: uuid!("22222222-2222-4222-8222-222222222222"),
            owner_id: DEMO_OWNER_ID,
            title: "Mobile ordering app".to_string(),
            client: "Bluebird Coffee".to_string(),
            description: None,
            category: "Mobile App".to_string(),
            budget: Decimal::new(820_000, 2),
            deadline: date!(2024 - 09 - 15),
            priority: "Medium".to_string(),
            status: "Pending".to_string(),
            progress: 0,
            paid: Decimal::ZERO,
            created_at: datetime!(2024-03-05 11:20:00 UTC),
            updated_at: datetime!(2024-03-05 11:20:00 UTC),
        },
        Project {
            id: uuid!("33333333-3333-4333-8333-333333333333"),
            owner_id: DEMO_OWNER_ID,
            title: "Brand guidelines".to_string(),
            client: "Northwind Labs".to_string(),
            description: Some("Logo refresh and brand book".to_string()),
            category: "Branding".to_string(),
            budget: Decimal::new(200_000, 2),
            deadline: date!(2024 - 04 - 01),
            priority: "Low".to_string(),
            status: "Completed".to_string(),
            progress: 100,
            paid: Decimal::new(200_000, 2),
            created_at: datetime!(2024-01-20 08:00:00 UTC),
            updated_at: datetime!(2024-04-01 17:00:00 UTC),
        },
    ]
}

pub fn demo_project(id: Uuid) -> Option<Project> {
    demo_projects().into_iter().find(|p| p.id == id)
}

pub async fn fetch_password_hash(db: &PgPool) -> anyhow::Result<Option<String>> {
    let hash: Option<String> =
        sqlx::query_scalar("SELECT value FROM app_settings WHERE key = $1")
            .bind(DEMO_PASSWORD_KEY)
            .fetch_optional(db)
            .await?;
    Ok(hash)
}

/// Last-writer-wins on the single settings row.
pub async fn set_password_hash(db: &PgPool, hash: &str) -> anyhow::Result<()> {
    sqlx::query(
        "INSERT INTO app_settings (key, value) VALUES ($1, $2)
         ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value",
    )
    .bind(DEMO_PASSWORD_KEY)
    .bind(hash)
    .execute(db)
    .await?;
    Ok(())
}

/// Seeds the default demo password once; an existing row is left alone.
pub async fn ensure_seed(db: &PgPool) -> anyhow::Result<()> {
    let hash = hash_password(DEFAULT_DEMO_PASSWORD)?;
    sqlx::query(
        "INSERT INTO app_settings (key, value) VALUES ($1, $2)
         ON CONFLICT (key) DO NOTHING",
    )
    .bind(DEMO_PASSWORD_KEY)
    .bind(&hash)
    .execute(db)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canned_dataset_is_stable_across_calls() {
        let a = demo_projects();
        let b = demo_projects();
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.id, y.id);
            assert_eq!(x.title, y.title);
            assert_eq!(x.status, y.status);
            assert_eq!(x.budget, y.budget);
        }
    }

    #[test]
    fn unknown_id_yields_none() {
        assert!(demo_project(Uuid::new_v4()).is_none());
    }

    #[test]
    fn known_id_yields_the_project() {
        let first = demo_projects().remove(0);
        let found = demo_project(first.id).expect("canned project");
        assert_eq!(found.title, first.title);
    }

    #[test]
    fn demo_user_has_the_sentinel_id() {
        assert_eq!(demo_user().id, DEMO_SUBJECT);
        assert_eq!(demo_user().username, DEMO_USERNAME);
    }
}
