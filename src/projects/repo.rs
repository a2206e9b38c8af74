use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::projects::dto::NewProject;

const PROJECT_COLUMNS: &str = "id, owner_id, title, client, description, category, budget, \
     deadline, priority, status, progress, paid, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub client: String,
    pub description: Option<String>,
    pub category: String,
    pub budget: Decimal,
    pub deadline: Date,
    pub priority: String,
    pub status: String,
    pub progress: i32,
    pub paid: Decimal,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

pub async fn list_by_owner(db: &PgPool, owner_id: Uuid) -> anyhow::Result<Vec<Project>> {
    let rows = sqlx::query_as::<_, Project>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects
         WHERE owner_id = $1
         ORDER BY created_at DESC"
    ))
    .bind(owner_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn find_by_owner(
    db: &PgPool,
    owner_id: Uuid,
    project_id: Uuid,
) -> anyhow::Result<Option<Project>> {
    let project = sqlx::query_as::<_, Project>(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects
         WHERE id = $1 AND owner_id = $2"
    ))
    .bind(project_id)
    .bind(owner_id)
    .fetch_optional(db)
    .await?;
    Ok(project)
}

pub async fn insert(db: &PgPool, owner_id: Uuid, new: NewProject) -> anyhow::Result<Project> {
    let project = sqlx::query_as::<_, Project>(&format!(
        "INSERT INTO projects
             (owner_id, title, client, description, category, budget, deadline,
              priority, status, progress, paid)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
         RETURNING {PROJECT_COLUMNS}"
    ))
    .bind(owner_id)
    .bind(&new.title)
    .bind(&new.client)
    .bind(&new.description)
    .bind(&new.category)
    .bind(new.budget)
    .bind(new.deadline)
    .bind(&new.priority)
    .bind(&new.status)
    .bind(new.progress)
    .bind(new.paid)
    .fetch_one(db)
    .await?;
    Ok(project)
}

/// Writes the already-merged record back. The owner predicate keeps the
/// update scoped; None means no owned row with that id.
pub async fn update(db: &PgPool, project: &Project) -> anyhow::Result<Option<Project>> {
    let updated = sqlx::query_as::<_, Project>(&format!(
        "UPDATE projects SET
             title = $3, client = $4, description = $5, category = $6,
             budget = $7, deadline = $8, priority = $9, status = $10,
             progress = $11, paid = $12, updated_at = now()
         WHERE id = $1 AND owner_id = $2
         RETURNING {PROJECT_COLUMNS}"
    ))
    .bind(project.id)
    .bind(project.owner_id)
    .bind(&project.title)
    .bind(&project.client)
    .bind(&project.description)
    .bind(&project.category)
    .bind(project.budget)
    .bind(project.deadline)
    .bind(&project.priority)
    .bind(&project.status)
    .bind(project.progress)
    .bind(project.paid)
    .fetch_optional(db)
    .await?;
    Ok(updated)
}

pub async fn delete_by_owner(db: &PgPool, owner_id: Uuid, project_id: Uuid) -> anyhow::Result<u64> {
    let result = sqlx::query("DELETE FROM projects WHERE id = $1 AND owner_id = $2")
        .bind(project_id)
        .bind(owner_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

/// Rewrites a category tag across every owned project. Used by both the
/// rename cascade and the delete-with-fallback cascade.
pub async fn retag_category(
    db: &PgPool,
    owner_id: Uuid,
    from: &str,
    to: &str,
) -> anyhow::Result<u64> {
    let result = sqlx::query(
        "UPDATE projects SET category = $3, updated_at = now()
         WHERE owner_id = $1 AND category = $2",
    )
    .bind(owner_id)
    .bind(from)
    .bind(to)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo::User;
    use time::macros::date;

    fn sample(category: &str) -> NewProject {
        NewProject {
            title: "Site build".into(),
            client: "Acme".into(),
            description: None,
            category: category.into(),
            budget: Decimal::new(100_000, 2),
            deadline: date!(2025 - 01 - 31),
            priority: "Medium".into(),
            status: "Pending".into(),
            progress: 0,
            paid: Decimal::ZERO,
        }
    }

    async fn make_user(db: &PgPool, username: &str) -> User {
        User::create(db, username, "hash-placeholder", None, "user")
            .await
            .expect("create user")
    }

    #[sqlx::test]
    async fn owner_scoping_hides_foreign_projects(db: PgPool) {
        let alice = make_user(&db, "alice").await;
        let bob = make_user(&db, "bob").await;
        let project = insert(&db, alice.id, sample("Web Development"))
            .await
            .expect("insert");

        // Another user's id never resolves someone else's project.
        assert!(find_by_owner(&db, bob.id, project.id)
            .await
            .unwrap()
            .is_none());
        assert_eq!(delete_by_owner(&db, bob.id, project.id).await.unwrap(), 0);

        // Even a record claiming the wrong owner cannot update the row.
        let mut hijacked = project.clone();
        hijacked.owner_id = bob.id;
        hijacked.title = "Taken over".into();
        assert!(update(&db, &hijacked).await.unwrap().is_none());

        let intact = find_by_owner(&db, alice.id, project.id)
            .await
            .unwrap()
            .expect("still owned");
        assert_eq!(intact.title, "Site build");
        assert_eq!(delete_by_owner(&db, alice.id, project.id).await.unwrap(), 1);
    }

    #[sqlx::test]
    async fn retag_rewrites_only_matching_owned_projects(db: PgPool) {
        let alice = make_user(&db, "alice").await;
        let bob = make_user(&db, "bob").await;
        insert(&db, alice.id, sample("X")).await.unwrap();
        insert(&db, alice.id, sample("X")).await.unwrap();
        insert(&db, alice.id, sample("Y")).await.unwrap();
        let foreign = insert(&db, bob.id, sample("X")).await.unwrap();

        let updated = retag_category(&db, alice.id, "X", "Z").await.unwrap();
        assert_eq!(updated, 2);

        let mut categories: Vec<String> = list_by_owner(&db, alice.id)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.category)
            .collect();
        categories.sort();
        assert_eq!(categories, vec!["Y", "Z", "Z"]);

        let untouched = find_by_owner(&db, bob.id, foreign.id)
            .await
            .unwrap()
            .expect("bob's project");
        assert_eq!(untouched.category, "X");
    }
}
