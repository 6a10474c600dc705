/// Tag endpoints
///
/// Tags are reached through their project: a caller sees a tag only when
/// they are a member of the project it belongs to.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::access,
    routes::{validate_colour, IdsQuery},
};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use tasklane_shared::{
    auth::middleware::AuthContext,
    models::{Tag, UpdateTag},
    permission::{collect_found, parse_ids, ResourceKind},
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTagRequest {
    #[validate(length(min = 1, max = 255, message = "Tag name must be 1-255 characters"))]
    pub name: Option<String>,

    #[validate(custom(function = "validate_colour"))]
    pub colour: Option<String>,
}

/// Fetches tags and drops the request if any is missing or out of reach
async fn accessible_tags(state: &AppState, user_id: Uuid, ids: &[String]) -> ApiResult<Vec<Tag>> {
    let found = state.store.find_tags_by_ids(&parse_ids(ids)).await?;
    let tags = collect_found(ids, found, |tag: &Tag| tag.id)
        .map_err(|missing| ApiError::bulk_not_found("Tags", &missing.0))?;

    let owners: Vec<(String, Uuid)> = tags
        .iter()
        .map(|tag| (tag.id.to_string(), tag.project_id))
        .collect();
    let denied = access::denied_via_owner(state, user_id, ResourceKind::Project, &owners).await?;
    if !denied.is_empty() {
        return Err(ApiError::bulk_not_found("Tags", &denied));
    }

    Ok(tags)
}

async fn accessible_tag(state: &AppState, user_id: Uuid, tag_id: &str) -> ApiResult<Tag> {
    accessible_tags(state, user_id, &[tag_id.to_string()])
        .await?
        .pop()
        .ok_or_else(|| ApiError::bulk_not_found("Tags", &[tag_id.to_string()]))
}

/// Bulk fetch, in request order
pub async fn get_tags(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<IdsQuery>,
) -> ApiResult<Json<Vec<Tag>>> {
    let ids = query.ids();
    if ids.is_empty() {
        return Ok(Json(Vec::new()));
    }

    Ok(Json(accessible_tags(&state, auth.user_id, &ids).await?))
}

pub async fn update_tag(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(tag_id): Path<String>,
    Json(req): Json<UpdateTagRequest>,
) -> ApiResult<Json<Tag>> {
    req.validate()?;

    let tag = accessible_tag(&state, auth.user_id, &tag_id).await?;

    let tag = state
        .store
        .update_tag(
            tag.id,
            UpdateTag {
                name: req.name,
                colour: req.colour,
            },
        )
        .await?
        .ok_or_else(|| ApiError::bulk_not_found("Tags", &[tag_id]))?;

    Ok(Json(tag))
}

/// Deletes the tag and unlinks it from every task
pub async fn delete_tag(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(tag_id): Path<String>,
) -> ApiResult<Json<Tag>> {
    let tag = accessible_tag(&state, auth.user_id, &tag_id).await?;

    let tag = state
        .store
        .delete_tag(tag.id)
        .await?
        .ok_or_else(|| ApiError::bulk_not_found("Tags", &[tag_id]))?;

    info!(tag_id = %tag.id, user_id = %auth.user_id, "Tag deleted");

    Ok(Json(tag))
}
