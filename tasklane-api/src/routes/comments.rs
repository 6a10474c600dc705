/// Bulk comment fetch
///
/// ```text
/// GET /v1/comments?ids=c1,c2
/// ```
///
/// Missing comments are reported first. A comment on a task the caller
/// cannot reach is reported the same way.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::access,
    routes::IdsQuery,
};
use axum::{
    extract::{Query, State},
    Json,
};
use tasklane_shared::{
    auth::middleware::AuthContext,
    models::Comment,
    permission::{collect_found, parse_ids, ResourceKind},
};

pub async fn get_comments(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(query): Query<IdsQuery>,
) -> ApiResult<Json<Vec<Comment>>> {
    let ids = query.ids();
    if ids.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let found = state.store.find_comments_by_ids(&parse_ids(&ids)).await?;
    let comments = collect_found(&ids, found, |comment: &Comment| comment.id)
        .map_err(|missing| ApiError::bulk_not_found("Comments", &missing.0))?;

    let owners: Vec<(String, uuid::Uuid)> = comments
        .iter()
        .map(|comment| (comment.id.to_string(), comment.task_id))
        .collect();
    let denied = access::denied_via_owner(&state, auth.user_id, ResourceKind::Task, &owners).await?;
    if !denied.is_empty() {
        return Err(ApiError::bulk_not_found("Comments", &denied));
    }

    Ok(Json(comments))
}
