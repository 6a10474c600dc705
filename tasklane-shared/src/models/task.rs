/// Task model and database operations
///
/// Tasks live in a section. They carry an optional assignee (who must be a
/// member of the owning project), a set of tags from the same project, and
/// the comments written on them.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('in_progress', 'done', 'on_hold');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     section_id UUID NOT NULL REFERENCES sections(id) ON DELETE CASCADE,
///     name VARCHAR(255) NOT NULL,
///     description TEXT,
///     status task_status NOT NULL DEFAULT 'in_progress',
///     due_date TIMESTAMPTZ,
///     assignee_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE task_tags (
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     tag_id UUID NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
///     added_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (task_id, tag_id)
/// );
/// ```
///
/// The write-time rules (assignee membership, tag ownership) are checked by
/// the API before calling into this module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

const TASK_COLUMNS: &str = r#"
    t.id, t.section_id, t.name, t.description, t.status, t.due_date,
    t.assignee_id, t.created_at, t.updated_at,
    ARRAY(
        SELECT tt.tag_id FROM task_tags tt
        WHERE tt.task_id = t.id
        ORDER BY tt.added_at, tt.tag_id
    ) AS tags,
    ARRAY(
        SELECT c.id FROM comments c
        WHERE c.task_id = t.id
        ORDER BY c.created_at, c.id
    ) AS comments
"#;

/// Progress of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Being worked on
    #[default]
    InProgress,

    /// Finished
    Done,

    /// Parked until further notice
    OnHold,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
            TaskStatus::OnHold => "on_hold",
        }
    }
}

/// A task within a section
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,

    /// Owning section
    pub section_id: Uuid,

    pub name: String,

    pub description: Option<String>,

    pub status: TaskStatus,

    pub due_date: Option<DateTime<Utc>>,

    /// Assigned project member, if any
    pub assignee_id: Option<Uuid>,

    /// Tags attached to the task, all from the owning project
    pub tags: Vec<Uuid>,

    /// Comments on the task, oldest first
    pub comments: Vec<Uuid>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTask {
    pub name: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<DateTime<Utc>>,
    pub assignee_id: Option<Uuid>,
    #[serde(default)]
    pub tags: Vec<Uuid>,
}

/// Input for updating a task
///
/// Outer `None` leaves a field unchanged; `Some(None)` clears a nullable
/// field. `tags`, when present, replaces the whole tag set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub assignee_id: Option<Option<Uuid>>,
    pub tags: Option<Vec<Uuid>>,
}

async fn replace_tags(
    tx: &mut Transaction<'_, Postgres>,
    task_id: Uuid,
    tags: &[Uuid],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM task_tags WHERE task_id = $1")
        .bind(task_id)
        .execute(&mut **tx)
        .await?;

    for tag_id in tags {
        sqlx::query(
            r#"
            INSERT INTO task_tags (task_id, tag_id)
            VALUES ($1, $2)
            ON CONFLICT (task_id, tag_id) DO NOTHING
            "#,
        )
        .bind(task_id)
        .bind(tag_id)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

impl Task {
    /// Creates a task in a section
    ///
    /// # Returns
    ///
    /// The new task, or None if the section does not exist
    pub async fn create(
        pool: &PgPool,
        section_id: Uuid,
        data: CreateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let task_id: Option<Uuid> = sqlx::query_scalar(
            r#"
            INSERT INTO tasks (section_id, name, description, status, due_date, assignee_id)
            SELECT s.id, $2, $3, $4, $5, $6
            FROM sections s
            WHERE s.id = $1
            RETURNING id
            "#,
        )
        .bind(section_id)
        .bind(data.name)
        .bind(data.description)
        .bind(data.status.unwrap_or_default())
        .bind(data.due_date)
        .bind(data.assignee_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(task_id) = task_id else {
            return Ok(None);
        };

        replace_tags(&mut tx, task_id, &data.tags).await?;

        tx.commit().await?;

        Self::find_by_id(pool, task_id).await
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {TASK_COLUMNS} FROM tasks t WHERE t.id = $1");

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds every task whose id is in `ids`, omitting missing ones
    pub async fn find_by_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!("SELECT {TASK_COLUMNS} FROM tasks t WHERE t.id = ANY($1)");

        sqlx::query_as::<_, Task>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Lists the tasks of a section, oldest first
    pub async fn list_by_section(
        pool: &PgPool,
        section_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {TASK_COLUMNS} FROM tasks t WHERE t.section_id = $1 ORDER BY t.created_at, t.id"
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(section_id)
            .fetch_all(pool)
            .await
    }

    /// Updates a task
    ///
    /// Only the fields present in `data` are written. `updated_at` is always bumped.
    ///
    /// # Returns
    ///
    /// The updated task, or None if it does not exist
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.status.is_some() {
            bind_count += 1;
            query.push_str(&format!(", status = ${}", bind_count));
        }
        if data.due_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", due_date = ${}", bind_count));
        }
        if data.assignee_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", assignee_id = ${}", bind_count));
        }

        query.push_str(" WHERE id = $1 RETURNING id");

        let mut q = sqlx::query_scalar::<_, Uuid>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(due_date) = data.due_date {
            q = q.bind(due_date);
        }
        if let Some(assignee_id) = data.assignee_id {
            q = q.bind(assignee_id);
        }

        let mut tx = pool.begin().await?;

        let Some(task_id) = q.fetch_optional(&mut *tx).await? else {
            return Ok(None);
        };

        if let Some(tags) = data.tags {
            replace_tags(&mut tx, task_id, &tags).await?;
        }

        tx.commit().await?;

        Self::find_by_id(pool, task_id).await
    }

    /// Deletes a task together with its comments and tag links
    ///
    /// # Returns
    ///
    /// The task as it was before deletion, or None if it did not exist
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!("SELECT {TASK_COLUMNS} FROM tasks t WHERE t.id = $1");
        let task = sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        if task.is_some() {
            sqlx::query("DELETE FROM tasks WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(task)
    }
}
