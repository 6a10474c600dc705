/// Behaviour when the store itself fails
///
/// A failing lookup must never be mistaken for a missing entity: guarded
/// routes answer 500 with a generic message instead of 404.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use common::{id_of, test_config, TestContext, TestUser};
use tasklane_api::app::{build_router, AppState};
use tasklane_shared::models::{
    Comment, CreateComment, CreateProject, CreateSection, CreateTag, CreateTask, CreateUser,
    Project, Section, Tag, Task, UpdateSection, UpdateTag, UpdateTask, User,
};
use tasklane_shared::store::{EntityRepository, EntityStore, MemoryStore, StoreError, StoreResult};
use uuid::Uuid;

fn timed_out() -> StoreError {
    StoreError::Database(sqlx::Error::PoolTimedOut)
}

/// Shares data with a memory store but cannot reach sections
struct SectionsDown {
    inner: Arc<MemoryStore>,
}

#[async_trait]
impl EntityStore for SectionsDown {
    async fn ping(&self) -> StoreResult<()> {
        self.inner.ping().await
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        self.inner.find_user_by_id(id).await
    }

    async fn find_project_by_id(&self, id: Uuid) -> StoreResult<Option<Project>> {
        self.inner.find_project_by_id(id).await
    }

    async fn find_section_by_id(&self, _id: Uuid) -> StoreResult<Option<Section>> {
        Err(timed_out())
    }

    async fn find_task_by_id(&self, id: Uuid) -> StoreResult<Option<Task>> {
        self.inner.find_task_by_id(id).await
    }

    async fn find_tag_by_id(&self, id: Uuid) -> StoreResult<Option<Tag>> {
        self.inner.find_tag_by_id(id).await
    }

    async fn find_comment_by_id(&self, id: Uuid) -> StoreResult<Option<Comment>> {
        self.inner.find_comment_by_id(id).await
    }
}

#[async_trait]
impl EntityRepository for SectionsDown {
    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        self.inner.create_user(data).await
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        self.inner.find_user_by_username(username).await
    }

    async fn create_project(
        &self,
        owner_id: Uuid,
        data: CreateProject,
    ) -> StoreResult<Option<Project>> {
        self.inner.create_project(owner_id, data).await
    }

    async fn list_projects_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Project>> {
        self.inner.list_projects_for_user(user_id).await
    }

    async fn add_project_member(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<Project>> {
        self.inner.add_project_member(project_id, user_id).await
    }

    async fn create_sections(
        &self,
        _project_id: Uuid,
        _sections: Vec<CreateSection>,
    ) -> StoreResult<Option<Vec<Section>>> {
        Err(timed_out())
    }

    async fn list_sections(&self, _project_id: Uuid) -> StoreResult<Vec<Section>> {
        Err(timed_out())
    }

    async fn update_section(
        &self,
        _id: Uuid,
        _data: UpdateSection,
    ) -> StoreResult<Option<Section>> {
        Err(timed_out())
    }

    async fn delete_section(&self, _id: Uuid) -> StoreResult<Option<Section>> {
        Err(timed_out())
    }

    async fn create_task(&self, section_id: Uuid, data: CreateTask) -> StoreResult<Option<Task>> {
        self.inner.create_task(section_id, data).await
    }

    async fn list_tasks(&self, section_id: Uuid) -> StoreResult<Vec<Task>> {
        self.inner.list_tasks(section_id).await
    }

    async fn update_task(&self, id: Uuid, data: UpdateTask) -> StoreResult<Option<Task>> {
        self.inner.update_task(id, data).await
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        self.inner.delete_task(id).await
    }

    async fn create_tag(&self, project_id: Uuid, data: CreateTag) -> StoreResult<Option<Tag>> {
        self.inner.create_tag(project_id, data).await
    }

    async fn update_tag(&self, id: Uuid, data: UpdateTag) -> StoreResult<Option<Tag>> {
        self.inner.update_tag(id, data).await
    }

    async fn delete_tag(&self, id: Uuid) -> StoreResult<Option<Tag>> {
        self.inner.delete_tag(id).await
    }

    async fn create_comment(
        &self,
        task_id: Uuid,
        data: CreateComment,
    ) -> StoreResult<Option<Comment>> {
        self.inner.create_comment(task_id, data).await
    }
}

/// Seeds a board through a healthy router, then swaps in one whose store
/// cannot reach sections
async fn broken_board() -> (TestContext, TestUser, String) {
    let mut ctx = TestContext::new();
    let alice = ctx.user("alice").await;

    let project = ctx.project(&alice, "Garden plans").await;
    let section = ctx.first_section(&alice, &project).await;
    let task = id_of(&ctx.task(&alice, &section, "Water beds").await);

    let store = Arc::new(SectionsDown {
        inner: ctx.store.clone(),
    });
    ctx.app = build_router(AppState::new(store, test_config()));

    (ctx, alice, task)
}

#[tokio::test]
async fn test_guarded_task_route_reports_store_failure() {
    let (ctx, alice, task) = broken_board().await;

    let (status, body) = ctx.get(&format!("/v1/tasks/{task}"), &alice).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "internal_error");
    assert_eq!(body["message"], "An internal error occurred");
    assert!(body.get("details").is_none());
    assert!(!body.to_string().contains("timed out"));
}

#[tokio::test]
async fn test_bulk_tasks_report_store_failure() {
    let (ctx, alice, task) = broken_board().await;

    let (status, body) = ctx.get(&format!("/v1/tasks?ids={task}"), &alice).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "internal_error");
}

#[tokio::test]
async fn test_routes_not_touching_sections_still_work() {
    let (ctx, alice, _) = broken_board().await;

    let (status, body) = ctx
        .send(Method::GET, "/v1/projects", Some(&alice.token), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));
}
