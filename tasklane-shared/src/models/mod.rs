/// Database models for Tasklane
///
/// This module contains the domain entities and their PostgreSQL operations.
/// The same structs are stored by the in-memory store, so handlers never see
/// which backend they are talking to.
///
/// # Models
///
/// - `user`: User accounts
/// - `project`: Projects and their members
/// - `section`: Ordered board columns of a project
/// - `task`: Tasks within a section
/// - `tag`: Project-scoped labels attached to tasks
/// - `comment`: Comments on tasks
///
/// # Example
///
/// ```no_run
/// use tasklane_shared::models::project::{CreateProject, Project};
/// use tasklane_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example(owner_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let project = Project::create(&pool, owner_id, CreateProject {
///     name: "Website relaunch".to_string(),
///     background: None,
///     sections: Vec::new(),
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod comment;
pub mod project;
pub mod section;
pub mod tag;
pub mod task;
pub mod user;

pub use comment::{Comment, CreateComment};
pub use project::{CreateProject, Project};
pub use section::{CreateSection, Section, UpdateSection};
pub use tag::{CreateTag, Tag, UpdateTag};
pub use task::{CreateTask, Task, TaskStatus, UpdateTask};
pub use user::{CreateUser, User};
