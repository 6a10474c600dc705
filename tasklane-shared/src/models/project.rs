/// Project model and database operations
///
/// A project is the root of the ownership hierarchy. Every section, task,
/// tag and comment belongs (directly or transitively) to exactly one project,
/// and access to all of them is decided by membership of that project.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     background VARCHAR(7) NOT NULL DEFAULT '#c4c4c4',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE project_members (
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     joined_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (project_id, user_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::section::{CreateSection, Section};

/// Background colour given to projects created without one
pub const DEFAULT_BACKGROUND: &str = "#c4c4c4";

const PROJECT_COLUMNS: &str = r#"
    p.id, p.name, p.background, p.created_at,
    ARRAY(
        SELECT m.user_id FROM project_members m
        WHERE m.project_id = p.id
        ORDER BY m.joined_at, m.user_id
    ) AS members,
    ARRAY(
        SELECT s.id FROM sections s
        WHERE s.project_id = p.id
        ORDER BY s.position, s.created_at
    ) AS sections,
    ARRAY(
        SELECT g.id FROM tags g
        WHERE g.project_id = p.id
        ORDER BY g.created_at, g.id
    ) AS tags
"#;

/// A project and the ids of everything directly beneath it
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    /// Unique project ID
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Background colour (`#RRGGBB`)
    pub background: String,

    /// Users allowed to act on this project
    pub members: Vec<Uuid>,

    /// Sections in board order
    pub sections: Vec<Uuid>,

    /// Tags defined for this project
    pub tags: Vec<Uuid>,

    /// When the project was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    /// Display name
    pub name: String,

    /// Background colour, `DEFAULT_BACKGROUND` when absent
    pub background: Option<String>,

    /// Starting sections, written in the same transaction as the project
    #[serde(default)]
    pub sections: Vec<CreateSection>,
}

impl Project {
    /// Returns true if the user is a member of this project
    pub fn has_member(&self, user_id: Uuid) -> bool {
        self.members.contains(&user_id)
    }

    /// Creates a project with `owner_id` as its only member
    ///
    /// The project, its membership row and its starting sections are written
    /// in one transaction, so a failure leaves nothing behind.
    ///
    /// # Returns
    ///
    /// The new project, or None if the owner does not exist
    pub async fn create(
        pool: &PgPool,
        owner_id: Uuid,
        data: CreateProject,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let owner_exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
                .bind(owner_id)
                .fetch_one(&mut *tx)
                .await?;

        if !owner_exists {
            return Ok(None);
        }

        let project_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO projects (name, background)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(data.name)
        .bind(data.background.unwrap_or_else(|| DEFAULT_BACKGROUND.to_string()))
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO project_members (project_id, user_id) VALUES ($1, $2)")
            .bind(project_id)
            .bind(owner_id)
            .execute(&mut *tx)
            .await?;

        Section::insert_many(&mut *tx, project_id, data.sections).await?;

        tx.commit().await?;

        Self::find_by_id(pool, project_id).await
    }

    /// Finds a project by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {PROJECT_COLUMNS} FROM projects p WHERE p.id = $1");

        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds every project whose id is in `ids`
    ///
    /// Missing ids are silently omitted; rows come back in no particular order.
    pub async fn find_by_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!("SELECT {PROJECT_COLUMNS} FROM projects p WHERE p.id = ANY($1)");

        sqlx::query_as::<_, Project>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Lists the projects a user is a member of, oldest membership first
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {PROJECT_COLUMNS}
            FROM projects p
            INNER JOIN project_members pm ON pm.project_id = p.id
            WHERE pm.user_id = $1
            ORDER BY pm.joined_at, p.id
            "#
        );

        sqlx::query_as::<_, Project>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Adds a user to the project's members
    ///
    /// Adding an existing member is a no-op.
    ///
    /// # Returns
    ///
    /// The updated project, or None if either the project or the user does not exist
    pub async fn add_member(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO project_members (project_id, user_id)
            SELECT p.id, u.id
            FROM projects p, users u
            WHERE p.id = $1 AND u.id = $2
            ON CONFLICT (project_id, user_id) DO NOTHING
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .execute(pool)
        .await?;

        let project = Self::find_by_id(pool, project_id).await?;

        match project {
            Some(project) if inserted.rows_affected() > 0 || project.has_member(user_id) => {
                Ok(Some(project))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_member() {
        let owner = Uuid::new_v4();
        let project = Project {
            id: Uuid::new_v4(),
            name: "Launch".to_string(),
            background: DEFAULT_BACKGROUND.to_string(),
            members: vec![owner],
            sections: vec![],
            tags: vec![],
            created_at: Utc::now(),
        };

        assert!(project.has_member(owner));
        assert!(!project.has_member(Uuid::new_v4()));
    }
}
