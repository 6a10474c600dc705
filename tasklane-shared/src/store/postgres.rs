/// PostgreSQL-backed entity store
///
/// Every method delegates to the query functions on the model types; this
/// type only adapts them to the store traits and maps constraint violations.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{EntityRepository, EntityStore, StoreError, StoreResult};
use crate::db::pool::health_check;
use crate::models::{
    Comment, CreateComment, CreateProject, CreateSection, CreateTag, CreateTask, CreateUser,
    Project, Section, Tag, Task, UpdateSection, UpdateTag, UpdateTask, User,
};

/// Entity store over a sqlx connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl EntityStore for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        health_check(&self.pool).await?;
        Ok(())
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_project_by_id(&self, id: Uuid) -> StoreResult<Option<Project>> {
        Ok(Project::find_by_id(&self.pool, id).await?)
    }

    async fn find_section_by_id(&self, id: Uuid) -> StoreResult<Option<Section>> {
        Ok(Section::find_by_id(&self.pool, id).await?)
    }

    async fn find_task_by_id(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(Task::find_by_id(&self.pool, id).await?)
    }

    async fn find_tag_by_id(&self, id: Uuid) -> StoreResult<Option<Tag>> {
        Ok(Tag::find_by_id(&self.pool, id).await?)
    }

    async fn find_comment_by_id(&self, id: Uuid) -> StoreResult<Option<Comment>> {
        Ok(Comment::find_by_id(&self.pool, id).await?)
    }

    async fn find_projects_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Project>> {
        Ok(Project::find_by_ids(&self.pool, ids).await?)
    }

    async fn find_sections_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Section>> {
        Ok(Section::find_by_ids(&self.pool, ids).await?)
    }

    async fn find_tasks_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Task>> {
        Ok(Task::find_by_ids(&self.pool, ids).await?)
    }

    async fn find_tags_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Tag>> {
        Ok(Tag::find_by_ids(&self.pool, ids).await?)
    }

    async fn find_comments_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Comment>> {
        Ok(Comment::find_by_ids(&self.pool, ids).await?)
    }
}

#[async_trait]
impl EntityRepository for PgStore {
    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        User::create(&self.pool, data)
            .await
            .map_err(|e| StoreError::from_insert(e, "username"))
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_username(&self.pool, username).await?)
    }

    async fn create_project(
        &self,
        owner_id: Uuid,
        data: CreateProject,
    ) -> StoreResult<Option<Project>> {
        Ok(Project::create(&self.pool, owner_id, data).await?)
    }

    async fn list_projects_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Project>> {
        Ok(Project::list_for_user(&self.pool, user_id).await?)
    }

    async fn add_project_member(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<Project>> {
        Ok(Project::add_member(&self.pool, project_id, user_id).await?)
    }

    async fn create_sections(
        &self,
        project_id: Uuid,
        sections: Vec<CreateSection>,
    ) -> StoreResult<Option<Vec<Section>>> {
        Ok(Section::create_many(&self.pool, project_id, sections).await?)
    }

    async fn list_sections(&self, project_id: Uuid) -> StoreResult<Vec<Section>> {
        Ok(Section::list_by_project(&self.pool, project_id).await?)
    }

    async fn update_section(
        &self,
        id: Uuid,
        data: UpdateSection,
    ) -> StoreResult<Option<Section>> {
        Ok(Section::update(&self.pool, id, data).await?)
    }

    async fn delete_section(&self, id: Uuid) -> StoreResult<Option<Section>> {
        Ok(Section::delete(&self.pool, id).await?)
    }

    async fn create_task(&self, section_id: Uuid, data: CreateTask) -> StoreResult<Option<Task>> {
        Ok(Task::create(&self.pool, section_id, data).await?)
    }

    async fn list_tasks(&self, section_id: Uuid) -> StoreResult<Vec<Task>> {
        Ok(Task::list_by_section(&self.pool, section_id).await?)
    }

    async fn update_task(&self, id: Uuid, data: UpdateTask) -> StoreResult<Option<Task>> {
        Ok(Task::update(&self.pool, id, data).await?)
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(Task::delete(&self.pool, id).await?)
    }

    async fn create_tag(&self, project_id: Uuid, data: CreateTag) -> StoreResult<Option<Tag>> {
        Ok(Tag::create(&self.pool, project_id, data).await?)
    }

    async fn update_tag(&self, id: Uuid, data: UpdateTag) -> StoreResult<Option<Tag>> {
        Ok(Tag::update(&self.pool, id, data).await?)
    }

    async fn delete_tag(&self, id: Uuid) -> StoreResult<Option<Tag>> {
        Ok(Tag::delete(&self.pool, id).await?)
    }

    async fn create_comment(
        &self,
        task_id: Uuid,
        data: CreateComment,
    ) -> StoreResult<Option<Comment>> {
        Ok(Comment::create(&self.pool, task_id, data).await?)
    }
}
