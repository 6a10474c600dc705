/// Entity store abstraction
///
/// The permission core only needs to read entities by id, so that is all
/// `EntityStore` asks for. The CRUD routes additionally need the write side,
/// which lives in `EntityRepository`.
///
/// # Implementations
///
/// - `PgStore`: PostgreSQL through the functions in `crate::models`
/// - `MemoryStore`: in-process maps behind a `tokio::sync::RwLock`, used by
///   tests and for running the API without a database
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tasklane_shared::store::{EntityRepository, MemoryStore};
///
/// let store: Arc<dyn EntityRepository> = Arc::new(MemoryStore::new());
/// ```

mod error;
pub mod memory;
pub mod postgres;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use futures::future::try_join_all;
use uuid::Uuid;

use crate::models::{
    Comment, CreateComment, CreateProject, CreateSection, CreateTag, CreateTask, CreateUser,
    Project, Section, Tag, Task, UpdateSection, UpdateTag, UpdateTask, User,
};

/// Read access to entities by id
///
/// Single lookups return `Ok(None)` for a missing entity. Batched lookups
/// omit missing ids and make no promise about result order.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Checks that the backing store is reachable
    async fn ping(&self) -> StoreResult<()>;

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn find_project_by_id(&self, id: Uuid) -> StoreResult<Option<Project>>;

    async fn find_section_by_id(&self, id: Uuid) -> StoreResult<Option<Section>>;

    async fn find_task_by_id(&self, id: Uuid) -> StoreResult<Option<Task>>;

    async fn find_tag_by_id(&self, id: Uuid) -> StoreResult<Option<Tag>>;

    async fn find_comment_by_id(&self, id: Uuid) -> StoreResult<Option<Comment>>;

    async fn find_projects_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Project>> {
        let found = try_join_all(ids.iter().map(|id| self.find_project_by_id(*id))).await?;
        Ok(found.into_iter().flatten().collect())
    }

    async fn find_sections_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Section>> {
        let found = try_join_all(ids.iter().map(|id| self.find_section_by_id(*id))).await?;
        Ok(found.into_iter().flatten().collect())
    }

    async fn find_tasks_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Task>> {
        let found = try_join_all(ids.iter().map(|id| self.find_task_by_id(*id))).await?;
        Ok(found.into_iter().flatten().collect())
    }

    async fn find_tags_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Tag>> {
        let found = try_join_all(ids.iter().map(|id| self.find_tag_by_id(*id))).await?;
        Ok(found.into_iter().flatten().collect())
    }

    async fn find_comments_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Comment>> {
        let found = try_join_all(ids.iter().map(|id| self.find_comment_by_id(*id))).await?;
        Ok(found.into_iter().flatten().collect())
    }
}

/// Write access used by the HTTP handlers
///
/// Operations that attach an entity to a parent return `Ok(None)` when the
/// parent does not exist.
#[async_trait]
pub trait EntityRepository: EntityStore {
    /// Creates a user; fails with `StoreError::Duplicate` if the username is
    /// taken (compared case-insensitively)
    async fn create_user(&self, data: CreateUser) -> StoreResult<User>;

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    /// Creates a project whose only member is `owner_id`, together with its
    /// starting sections, as one write
    async fn create_project(
        &self,
        owner_id: Uuid,
        data: CreateProject,
    ) -> StoreResult<Option<Project>>;

    async fn list_projects_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Project>>;

    /// Adds an existing user to a project; None if either is missing
    async fn add_project_member(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<Project>>;

    /// Appends sections to a project in the given order
    async fn create_sections(
        &self,
        project_id: Uuid,
        sections: Vec<CreateSection>,
    ) -> StoreResult<Option<Vec<Section>>>;

    /// Sections of a project in board order
    async fn list_sections(&self, project_id: Uuid) -> StoreResult<Vec<Section>>;

    async fn update_section(&self, id: Uuid, data: UpdateSection)
        -> StoreResult<Option<Section>>;

    /// Deletes a section and every task in it
    async fn delete_section(&self, id: Uuid) -> StoreResult<Option<Section>>;

    async fn create_task(&self, section_id: Uuid, data: CreateTask) -> StoreResult<Option<Task>>;

    async fn list_tasks(&self, section_id: Uuid) -> StoreResult<Vec<Task>>;

    async fn update_task(&self, id: Uuid, data: UpdateTask) -> StoreResult<Option<Task>>;

    /// Deletes a task with its comments and tag links
    async fn delete_task(&self, id: Uuid) -> StoreResult<Option<Task>>;

    async fn create_tag(&self, project_id: Uuid, data: CreateTag) -> StoreResult<Option<Tag>>;

    async fn update_tag(&self, id: Uuid, data: UpdateTag) -> StoreResult<Option<Tag>>;

    /// Deletes a tag and removes it from every task
    async fn delete_tag(&self, id: Uuid) -> StoreResult<Option<Tag>>;

    async fn create_comment(
        &self,
        task_id: Uuid,
        data: CreateComment,
    ) -> StoreResult<Option<Comment>>;
}
