/// Tag model and database operations
///
/// Tags are defined per project and can be attached to any task of that
/// project. Deleting a tag unlinks it from every task (via `ON DELETE CASCADE`
/// on `task_tags`).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tags (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     name VARCHAR(255) NOT NULL,
///     colour VARCHAR(7) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const TAG_COLUMNS: &str = r#"
    g.id, g.project_id, g.name, g.colour, g.created_at,
    ARRAY(
        SELECT tt.task_id FROM task_tags tt
        WHERE tt.tag_id = g.id
        ORDER BY tt.added_at, tt.task_id
    ) AS tasks
"#;

/// A project-scoped label
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    pub id: Uuid,

    /// Owning project
    pub project_id: Uuid,

    pub name: String,

    /// Colour (`#RRGGBB`)
    pub colour: String,

    /// Tasks carrying this tag
    pub tasks: Vec<Uuid>,

    pub created_at: DateTime<Utc>,
}

/// Input for creating a tag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTag {
    pub name: String,
    pub colour: String,
}

/// Input for updating a tag
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTag {
    pub name: Option<String>,
    pub colour: Option<String>,
}

impl Tag {
    /// Creates a tag in a project
    ///
    /// # Returns
    ///
    /// The new tag, or None if the project does not exist
    pub async fn create(
        pool: &PgPool,
        project_id: Uuid,
        data: CreateTag,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tag>(
            r#"
            INSERT INTO tags (project_id, name, colour)
            SELECT p.id, $2, $3
            FROM projects p
            WHERE p.id = $1
            RETURNING id, project_id, name, colour, created_at,
                      ARRAY[]::uuid[] AS tasks
            "#,
        )
        .bind(project_id)
        .bind(data.name)
        .bind(data.colour)
        .fetch_optional(pool)
        .await
    }

    /// Finds a tag by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {TAG_COLUMNS} FROM tags g WHERE g.id = $1");

        sqlx::query_as::<_, Tag>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds every tag whose id is in `ids`, omitting missing ones
    pub async fn find_by_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!("SELECT {TAG_COLUMNS} FROM tags g WHERE g.id = ANY($1)");

        sqlx::query_as::<_, Tag>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Updates a tag's name or colour
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTag,
    ) -> Result<Option<Self>, sqlx::Error> {
        let updated: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE tags
            SET name = COALESCE($2, name),
                colour = COALESCE($3, colour)
            WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(data.name)
        .bind(data.colour)
        .fetch_optional(pool)
        .await?;

        match updated {
            Some(id) => Self::find_by_id(pool, id).await,
            None => Ok(None),
        }
    }

    /// Deletes a tag and unlinks it from every task
    ///
    /// # Returns
    ///
    /// The tag as it was before deletion, or None if it did not exist
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!("SELECT {TAG_COLUMNS} FROM tags g WHERE g.id = $1");
        let tag = sqlx::query_as::<_, Tag>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        if tag.is_some() {
            sqlx::query("DELETE FROM tags WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(tag)
    }
}
