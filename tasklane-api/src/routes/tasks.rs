/// Task endpoints
///
/// `/v1/tasks/:task_id/*` sits behind the task access guard. The bulk
/// `GET /v1/tasks?ids=a,b` checks every id itself.
///
/// Two rules apply whenever a task is written:
///
/// - the assignee must be a member of the task's project
/// - every tag must exist and belong to the task's project

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::access,
    routes::IdsQuery,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use tasklane_shared::{
    auth::middleware::AuthContext,
    models::{Comment, CreateComment, Project, Task, TaskStatus, UpdateTask},
    permission::{collect_found, dedup_ids, parse_ids, ResourceKind},
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// Keeps an explicit `null` apart from a missing field
fn explicit_null<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Update task request
///
/// Missing fields are left alone; `null` clears description, due date or
/// assignee. `tags` replaces the whole tag set.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Task name must be 1-200 characters"))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "explicit_null")]
    #[validate(length(max = 10000, message = "Description must be at most 10000 characters"))]
    pub description: Option<Option<String>>,

    pub status: Option<TaskStatus>,

    #[serde(default, deserialize_with = "explicit_null")]
    pub due_date: Option<Option<DateTime<Utc>>>,

    #[serde(default, deserialize_with = "explicit_null")]
    pub assignee_id: Option<Option<Uuid>>,

    pub tags: Option<Vec<Uuid>>,
}

/// Create comment request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 10000, message = "Comment must be 1-10000 characters"))]
    pub text: String,
}

fn task_not_found(task_id: Uuid) -> ApiError {
    ApiError::resources_not_found(ResourceKind::Task, &[task_id.to_string()])
}

/// Loads the project a section belongs to
pub(crate) async fn project_of_section(
    state: &AppState,
    section_id: Uuid,
) -> ApiResult<Project> {
    let not_found =
        || ApiError::resources_not_found(ResourceKind::Section, &[section_id.to_string()]);

    let section = state
        .store
        .find_section_by_id(section_id)
        .await?
        .ok_or_else(not_found)?;

    state
        .store
        .find_project_by_id(section.project_id)
        .await?
        .ok_or_else(not_found)
}

/// Rejects an assignee who is not a member of `project`
pub(crate) fn check_assignee(project: &Project, assignee_id: Option<Uuid>) -> ApiResult<()> {
    match assignee_id {
        Some(assignee) if !project.has_member(assignee) => Err(ApiError::BadRequest(format!(
            "Assignee '{}' not in project '{}'",
            assignee, project.id
        ))),
        _ => Ok(()),
    }
}

/// Rejects tags that do not exist or belong to another project
pub(crate) async fn check_tags(
    state: &AppState,
    project: &Project,
    tags: &[Uuid],
) -> ApiResult<()> {
    if tags.is_empty() {
        return Ok(());
    }

    let requested = dedup_ids(&tags.iter().map(Uuid::to_string).collect::<Vec<_>>());
    let found = state.store.find_tags_by_ids(&parse_ids(&requested)).await?;

    let bad: Vec<String> = requested
        .into_iter()
        .filter(|id| {
            !found
                .iter()
                .any(|tag| tag.id.to_string() == *id && tag.project_id == project.id)
        })
        .collect();

    if bad.is_empty() {
        Ok(())
    } else {
        Err(ApiError::bulk_not_found("Tags", &bad))
    }
}

/// Bulk fetch, in request order
pub async fn get_tasks(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<IdsQuery>,
) -> ApiResult<Json<Vec<Task>>> {
    let ids = query.ids();
    if ids.is_empty() {
        return Ok(Json(Vec::new()));
    }

    if let Some(denied) = access::denied(&state, auth.user_id, ResourceKind::Task, &ids).await? {
        return Err(ApiError::bulk_not_found("Tasks", &denied));
    }

    let found = state.store.find_tasks_by_ids(&parse_ids(&ids)).await?;
    let tasks = collect_found(&ids, found, |task: &Task| task.id)
        .map_err(|missing| ApiError::bulk_not_found("Tasks", &missing.0))?;

    Ok(Json(tasks))
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = state
        .store
        .find_task_by_id(task_id)
        .await?
        .ok_or_else(|| task_not_found(task_id))?;

    Ok(Json(task))
}

pub async fn update_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(task_id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    req.validate()?;

    let assignee = req.assignee_id.flatten();
    if assignee.is_some() || req.tags.is_some() {
        let task = state
            .store
            .find_task_by_id(task_id)
            .await?
            .ok_or_else(|| task_not_found(task_id))?;
        let project = project_of_section(&state, task.section_id).await?;

        check_assignee(&project, assignee)?;
        check_tags(&state, &project, req.tags.as_deref().unwrap_or_default()).await?;
    }

    let task = state
        .store
        .update_task(
            task_id,
            UpdateTask {
                name: req.name,
                description: req.description,
                status: req.status,
                due_date: req.due_date,
                assignee_id: req.assignee_id,
                tags: req.tags,
            },
        )
        .await?
        .ok_or_else(|| task_not_found(task_id))?;

    info!(task_id = %task_id, user_id = %auth.user_id, "Task updated");

    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<Task>> {
    let task = state
        .store
        .delete_task(task_id)
        .await?
        .ok_or_else(|| task_not_found(task_id))?;

    info!(task_id = %task_id, user_id = %auth.user_id, "Task deleted");

    Ok(Json(task))
}

/// Adds a comment owned by the caller
pub async fn create_comment(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(task_id): Path<Uuid>,
    Json(req): Json<CreateCommentRequest>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    req.validate()?;

    let comment = state
        .store
        .create_comment(
            task_id,
            CreateComment {
                owner_id: auth.user_id,
                text: req.text,
            },
        )
        .await?
        .ok_or_else(|| task_not_found(task_id))?;

    Ok((StatusCode::CREATED, Json(comment)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn project_with(members: Vec<Uuid>) -> Project {
        Project {
            id: Uuid::new_v4(),
            name: "Garden".to_string(),
            background: "#c4c4c4".to_string(),
            members,
            sections: vec![],
            tags: vec![],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_update_request_distinguishes_null_from_missing() {
        let req: UpdateTaskRequest =
            serde_json::from_str(r#"{"description": null, "status": "done"}"#).unwrap();

        assert_eq!(req.description, Some(None));
        assert_eq!(req.assignee_id, None);
        assert_eq!(req.status, Some(TaskStatus::Done));
    }

    #[test]
    fn test_update_request_validation() {
        let req = UpdateTaskRequest {
            name: Some(String::new()),
            ..Default::default()
        };
        assert!(req.validate().is_err());

        let req = UpdateTaskRequest {
            name: Some("x".repeat(201)),
            ..Default::default()
        };
        assert!(req.validate().is_err());

        let req = UpdateTaskRequest {
            name: Some("Weed the beds".to_string()),
            description: Some(None),
            ..Default::default()
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_check_assignee() {
        let member = Uuid::new_v4();
        let outsider = Uuid::new_v4();
        let project = project_with(vec![member]);

        assert!(check_assignee(&project, None).is_ok());
        assert!(check_assignee(&project, Some(member)).is_ok());

        let err = check_assignee(&project, Some(outsider)).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!(
                "Bad request: Assignee '{}' not in project '{}'",
                outsider, project.id
            )
        );
    }
}
