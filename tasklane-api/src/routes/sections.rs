/// Section endpoints, all behind the section access guard

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{
        tasks::{check_assignee, check_tags, project_of_section},
        validate_colour,
    },
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tasklane_shared::{
    auth::middleware::AuthContext,
    models::{CreateTask, Section, Task, TaskStatus, UpdateSection},
    permission::ResourceKind,
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// A section together with its tasks
#[derive(Debug, Serialize, Deserialize)]
pub struct SectionDetail {
    pub section: Section,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSectionRequest {
    #[validate(length(min = 1, max = 255, message = "Section name must be 1-255 characters"))]
    pub name: Option<String>,

    #[validate(custom(function = "validate_colour"))]
    pub colour: Option<String>,

    #[validate(length(max = 255, message = "Icon must be at most 255 characters"))]
    pub icon: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Task name must be 1-255 characters"))]
    pub name: String,

    #[validate(length(max = 10000, message = "Description must be at most 10000 characters"))]
    pub description: Option<String>,

    pub status: Option<TaskStatus>,

    pub due_date: Option<DateTime<Utc>>,

    pub assignee_id: Option<Uuid>,

    #[serde(default)]
    pub tags: Vec<Uuid>,
}

fn section_not_found(section_id: Uuid) -> ApiError {
    ApiError::resources_not_found(ResourceKind::Section, &[section_id.to_string()])
}

pub async fn get_section(
    State(state): State<AppState>,
    Path(section_id): Path<Uuid>,
) -> ApiResult<Json<SectionDetail>> {
    let section = state
        .store
        .find_section_by_id(section_id)
        .await?
        .ok_or_else(|| section_not_found(section_id))?;
    let tasks = state.store.list_tasks(section_id).await?;

    Ok(Json(SectionDetail { section, tasks }))
}

pub async fn update_section(
    State(state): State<AppState>,
    Path(section_id): Path<Uuid>,
    Json(req): Json<UpdateSectionRequest>,
) -> ApiResult<Json<Section>> {
    req.validate()?;

    let section = state
        .store
        .update_section(
            section_id,
            UpdateSection {
                name: req.name,
                colour: req.colour,
                icon: req.icon,
            },
        )
        .await?
        .ok_or_else(|| section_not_found(section_id))?;

    Ok(Json(section))
}

/// Deletes the section and every task in it
pub async fn delete_section(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(section_id): Path<Uuid>,
) -> ApiResult<Json<Section>> {
    let section = state
        .store
        .delete_section(section_id)
        .await?
        .ok_or_else(|| section_not_found(section_id))?;

    info!(
        section_id = %section_id,
        user_id = %auth.user_id,
        tasks = section.tasks.len(),
        "Section deleted"
    );

    Ok(Json(section))
}

pub async fn create_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(section_id): Path<Uuid>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    req.validate()?;

    let project = project_of_section(&state, section_id).await?;
    check_assignee(&project, req.assignee_id)?;
    check_tags(&state, &project, &req.tags).await?;

    let task = state
        .store
        .create_task(
            section_id,
            CreateTask {
                name: req.name,
                description: req.description,
                status: req.status,
                due_date: req.due_date,
                assignee_id: req.assignee_id,
                tags: req.tags,
            },
        )
        .await?
        .ok_or_else(|| section_not_found(section_id))?;

    info!(
        task_id = %task.id,
        section_id = %section_id,
        user_id = %auth.user_id,
        "Task created"
    );

    Ok((StatusCode::CREATED, Json(task)))
}
