/// Comment model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE comments (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     text TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const COMMENT_COLUMNS: &str = "c.id, c.task_id, c.owner_id, c.text, c.created_at";

/// A comment written on a task
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,

    /// Task the comment belongs to
    pub task_id: Uuid,

    /// Author
    pub owner_id: Uuid,

    pub text: String,

    pub created_at: DateTime<Utc>,
}

/// Input for creating a comment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateComment {
    pub owner_id: Uuid,
    pub text: String,
}

impl Comment {
    /// Creates a comment on a task
    ///
    /// # Returns
    ///
    /// The new comment, or None if the task does not exist
    pub async fn create(
        pool: &PgPool,
        task_id: Uuid,
        data: CreateComment,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (task_id, owner_id, text)
            SELECT t.id, $2, $3
            FROM tasks t
            WHERE t.id = $1
            RETURNING id, task_id, owner_id, text, created_at
            "#,
        )
        .bind(task_id)
        .bind(data.owner_id)
        .bind(data.text)
        .fetch_optional(pool)
        .await
    }

    /// Finds a comment by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {COMMENT_COLUMNS} FROM comments c WHERE c.id = $1");

        sqlx::query_as::<_, Comment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds every comment whose id is in `ids`, omitting missing ones
    pub async fn find_by_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!("SELECT {COMMENT_COLUMNS} FROM comments c WHERE c.id = ANY($1)");

        sqlx::query_as::<_, Comment>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }
}
