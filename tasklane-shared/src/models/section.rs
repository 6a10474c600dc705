/// Section model and database operations
///
/// Sections are the columns of a project board. Each section belongs to one
/// project and keeps a `position` so the project's section list has a stable
/// order. Deleting a section cascades to its tasks (and through them to
/// comments and tag links).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE sections (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     name VARCHAR(255) NOT NULL,
///     colour VARCHAR(7) NOT NULL,
///     icon VARCHAR(255) NOT NULL DEFAULT '',
///     position INTEGER NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

const SECTION_COLUMNS: &str = r#"
    s.id, s.project_id, s.name, s.colour, s.icon, s.position, s.created_at,
    ARRAY(
        SELECT t.id FROM tasks t
        WHERE t.section_id = s.id
        ORDER BY t.created_at, t.id
    ) AS tasks
"#;

/// A section of a project board
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Section {
    pub id: Uuid,

    /// Owning project
    pub project_id: Uuid,

    pub name: String,

    /// Colour (`#RRGGBB`)
    pub colour: String,

    /// Icon name, may be empty
    pub icon: String,

    /// Zero-based position within the project
    pub position: i32,

    /// Tasks in this section, oldest first
    pub tasks: Vec<Uuid>,

    pub created_at: DateTime<Utc>,
}

/// Input for creating a section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSection {
    pub name: String,
    pub colour: String,
    #[serde(default)]
    pub icon: String,
}

/// Input for updating a section
///
/// Fields left as None are unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSection {
    pub name: Option<String>,
    pub colour: Option<String>,
    pub icon: Option<String>,
}

impl CreateSection {
    fn new(name: &str, colour: &str) -> Self {
        Self {
            name: name.to_string(),
            colour: colour.to_string(),
            icon: String::new(),
        }
    }

    /// The sections every new project starts with
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("Open", "#bef9f2"),
            Self::new("In progress", "#35b6ff"),
            Self::new("Done", "#d6a1ff"),
            Self::new("On hold", "#fff0a1"),
        ]
    }
}

impl Section {
    /// Appends sections to the end of a project, preserving input order
    ///
    /// The project row is locked for the duration of the transaction so that
    /// concurrent appends get distinct positions.
    ///
    /// # Returns
    ///
    /// The created sections, or None if the project does not exist
    pub async fn create_many(
        pool: &PgPool,
        project_id: Uuid,
        sections: Vec<CreateSection>,
    ) -> Result<Option<Vec<Self>>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM projects WHERE id = $1 FOR UPDATE")
                .bind(project_id)
                .fetch_optional(&mut *tx)
                .await?;

        if locked.is_none() {
            return Ok(None);
        }

        let created = Self::insert_many(&mut *tx, project_id, sections).await?;

        tx.commit().await?;

        Ok(Some(created))
    }

    /// Inserts sections after the last existing position of a project
    ///
    /// Runs on the caller's connection so it can share a transaction with
    /// the project insert.
    pub(crate) async fn insert_many(
        conn: &mut PgConnection,
        project_id: Uuid,
        sections: Vec<CreateSection>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let next_position: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM sections WHERE project_id = $1",
        )
        .bind(project_id)
        .fetch_one(&mut *conn)
        .await?;

        let mut created = Vec::with_capacity(sections.len());
        for (offset, data) in sections.into_iter().enumerate() {
            let section = sqlx::query_as::<_, Section>(
                r#"
                INSERT INTO sections (project_id, name, colour, icon, position)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, project_id, name, colour, icon, position, created_at,
                          ARRAY[]::uuid[] AS tasks
                "#,
            )
            .bind(project_id)
            .bind(data.name)
            .bind(data.colour)
            .bind(data.icon)
            .bind(next_position + offset as i32)
            .fetch_one(&mut *conn)
            .await?;

            created.push(section);
        }

        Ok(created)
    }

    /// Finds a section by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {SECTION_COLUMNS} FROM sections s WHERE s.id = $1");

        sqlx::query_as::<_, Section>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds every section whose id is in `ids`, omitting missing ones
    pub async fn find_by_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!("SELECT {SECTION_COLUMNS} FROM sections s WHERE s.id = ANY($1)");

        sqlx::query_as::<_, Section>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Lists the sections of a project in board order
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {SECTION_COLUMNS} FROM sections s \
             WHERE s.project_id = $1 ORDER BY s.position, s.created_at"
        );

        sqlx::query_as::<_, Section>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Updates a section's name, colour or icon
    ///
    /// # Returns
    ///
    /// The updated section, or None if it does not exist
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateSection,
    ) -> Result<Option<Self>, sqlx::Error> {
        let updated: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE sections
            SET name = COALESCE($2, name),
                colour = COALESCE($3, colour),
                icon = COALESCE($4, icon)
            WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(data.name)
        .bind(data.colour)
        .bind(data.icon)
        .fetch_optional(pool)
        .await?;

        match updated {
            Some(id) => Self::find_by_id(pool, id).await,
            None => Ok(None),
        }
    }

    /// Deletes a section and, by cascade, its tasks
    ///
    /// # Returns
    ///
    /// The section as it was before deletion, or None if it did not exist
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!("SELECT {SECTION_COLUMNS} FROM sections s WHERE s.id = $1");
        let section = sqlx::query_as::<_, Section>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        if section.is_some() {
            sqlx::query("DELETE FROM sections WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(section)
    }
}
