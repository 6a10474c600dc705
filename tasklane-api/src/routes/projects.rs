/// Project endpoints
///
/// Everything under `/v1/projects/:project_id` sits behind the project
/// access guard.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::validate_colour,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tasklane_shared::{
    auth::middleware::AuthContext,
    models::{CreateProject, CreateSection, CreateTag, Project, Section, Tag},
    permission::ResourceKind,
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// One section in a create request
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct SectionRequest {
    #[validate(length(min = 1, max = 255, message = "Section name must be 1-255 characters"))]
    pub name: String,

    #[validate(custom(function = "validate_colour"))]
    pub colour: String,

    #[validate(length(max = 255, message = "Icon must be at most 255 characters"))]
    #[serde(default)]
    pub icon: String,
}

impl From<SectionRequest> for CreateSection {
    fn from(req: SectionRequest) -> Self {
        CreateSection {
            name: req.name,
            colour: req.colour,
            icon: req.icon,
        }
    }
}

/// Create project request
///
/// Without `sections` the project starts with the default board
/// (Open, In progress, Done, On hold).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 4, max = 255, message = "Project name must be 4-255 characters"))]
    pub name: String,

    #[validate(custom(function = "validate_colour"))]
    pub background: Option<String>,

    #[validate(nested)]
    pub sections: Option<Vec<SectionRequest>>,
}

/// Append sections request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSectionsRequest {
    #[validate(length(min = 1, message = "At least one section is required"), nested)]
    pub sections: Vec<SectionRequest>,
}

/// Add member request
#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub user_id: Uuid,
}

/// Create tag request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTagRequest {
    #[validate(length(min = 1, max = 255, message = "Tag name must be 1-255 characters"))]
    pub name: String,

    #[validate(custom(function = "validate_colour"))]
    pub colour: String,
}

fn project_not_found(project_id: Uuid) -> ApiError {
    ApiError::resources_not_found(ResourceKind::Project, &[project_id.to_string()])
}

/// Lists the caller's projects
pub async fn list_projects(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<Vec<Project>>> {
    let projects = state.store.list_projects_for_user(auth.user_id).await?;

    Ok(Json(projects))
}

/// Creates a project owned by the caller, with its initial sections
pub async fn create_project(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    req.validate()?;

    let sections: Vec<CreateSection> = match req.sections {
        Some(sections) => sections.into_iter().map(CreateSection::from).collect(),
        None => CreateSection::defaults(),
    };

    let project = state
        .store
        .create_project(
            auth.user_id,
            CreateProject {
                name: req.name,
                background: req.background,
                sections,
            },
        )
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Unknown user".to_string()))?;

    info!(
        project_id = %project.id,
        user_id = %auth.user_id,
        sections = project.sections.len(),
        "Project created"
    );

    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn get_project(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Project>> {
    let project = state
        .store
        .find_project_by_id(project_id)
        .await?
        .ok_or_else(|| project_not_found(project_id))?;

    Ok(Json(project))
}

/// Adds an existing user to the project; adding a member twice is a no-op
pub async fn add_member(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(project_id): Path<Uuid>,
    Json(req): Json<AddMemberRequest>,
) -> ApiResult<Json<Project>> {
    if state.store.find_user_by_id(req.user_id).await?.is_none() {
        return Err(ApiError::NotFound(format!(
            "No user with id '{}' found",
            req.user_id
        )));
    }

    let project = state
        .store
        .add_project_member(project_id, req.user_id)
        .await?
        .ok_or_else(|| project_not_found(project_id))?;

    info!(
        project_id = %project_id,
        member_id = %req.user_id,
        added_by = %auth.user_id,
        "Project member added"
    );

    Ok(Json(project))
}

/// Sections of the project in board order
pub async fn list_sections(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Section>>> {
    let sections = state.store.list_sections(project_id).await?;

    Ok(Json(sections))
}

/// Appends sections after the existing ones
pub async fn create_sections(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<CreateSectionsRequest>,
) -> ApiResult<(StatusCode, Json<Vec<Section>>)> {
    req.validate()?;

    let sections = state
        .store
        .create_sections(
            project_id,
            req.sections.into_iter().map(CreateSection::from).collect(),
        )
        .await?
        .ok_or_else(|| project_not_found(project_id))?;

    Ok((StatusCode::CREATED, Json(sections)))
}

pub async fn create_tag(
    State(state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Json(req): Json<CreateTagRequest>,
) -> ApiResult<(StatusCode, Json<Tag>)> {
    req.validate()?;

    let tag = state
        .store
        .create_tag(
            project_id,
            CreateTag {
                name: req.name,
                colour: req.colour,
            },
        )
        .await?
        .ok_or_else(|| project_not_found(project_id))?;

    Ok((StatusCode::CREATED, Json(tag)))
}
