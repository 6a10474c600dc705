/// Access guards
///
/// Each guard runs as a `route_layer` on routes whose path carries a
/// project, section or task id. It asks the permission evaluator whether the
/// authenticated user may act on that id and stops the request otherwise.
///
/// Denied and missing resources get the same 404 so callers cannot probe
/// for ids in projects they do not belong to. The difference is only
/// visible in the server log.

use std::collections::{HashMap, HashSet};

use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
};
use tasklane_shared::auth::middleware::AuthContext;
use tasklane_shared::permission::{check_access, Outcome, ResourceKind};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::{ApiError, ApiResult};

/// Path parameter each guard reads
fn path_key(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Project => "project_id",
        ResourceKind::Section => "section_id",
        ResourceKind::Task => "task_id",
    }
}

/// Runs the access check and converts a denial into a 404
pub async fn ensure_access(
    state: &AppState,
    user_id: Uuid,
    kind: ResourceKind,
    ids: &[String],
) -> ApiResult<()> {
    match denied(state, user_id, kind, ids).await? {
        None => Ok(()),
        Some(ids) => Err(ApiError::resources_not_found(kind, &ids)),
    }
}

/// Returns the ids that stop the request, if any
///
/// Missing ids are reported when there are any; otherwise the forbidden ones.
pub async fn denied(
    state: &AppState,
    user_id: Uuid,
    kind: ResourceKind,
    ids: &[String],
) -> ApiResult<Option<Vec<String>>> {
    match check_access(state.store.as_ref(), user_id, kind, ids).await? {
        Outcome::Allowed => Ok(None),
        Outcome::NotFound(missing) => {
            debug!(user_id = %user_id, kind = %kind, ids = ?missing, "Resources not found");
            Ok(Some(missing))
        }
        Outcome::Forbidden(forbidden) => {
            warn!(
                user_id = %user_id,
                kind = %kind,
                ids = ?forbidden,
                "Access denied: user is not a project member"
            );
            Ok(Some(forbidden))
        }
    }
}

/// Checks entities reached through an owning resource
///
/// `owners` pairs each entity id with the id of the project or task it
/// belongs to. Returns the entity ids whose owner the user may not act on,
/// in input order.
pub async fn denied_via_owner(
    state: &AppState,
    user_id: Uuid,
    owner_kind: ResourceKind,
    owners: &[(String, Uuid)],
) -> ApiResult<Vec<String>> {
    let owner_ids: Vec<String> = owners.iter().map(|(_, owner)| owner.to_string()).collect();

    let blocked: HashSet<String> = match denied(state, user_id, owner_kind, &owner_ids).await? {
        None => return Ok(Vec::new()),
        Some(ids) => ids.into_iter().collect(),
    };

    Ok(owners
        .iter()
        .filter(|(_, owner)| blocked.contains(&owner.to_string()))
        .map(|(id, _)| id.clone())
        .collect())
}

async fn guard(
    kind: ResourceKind,
    state: AppState,
    auth: AuthContext,
    params: HashMap<String, String>,
    req: Request,
    next: Next,
) -> ApiResult<Response> {
    let key = path_key(kind);
    let id = params
        .get(key)
        .cloned()
        .ok_or_else(|| ApiError::InternalError(format!("Route has no {} parameter", key)))?;

    ensure_access(&state, auth.user_id, kind, &[id]).await?;

    Ok(next.run(req).await)
}

/// Requires membership of the project in `:project_id`
pub async fn require_project_access(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(params): Path<HashMap<String, String>>,
    req: Request,
    next: Next,
) -> ApiResult<Response> {
    guard(ResourceKind::Project, state, auth, params, req, next).await
}

/// Requires membership of the project owning the section in `:section_id`
pub async fn require_section_access(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(params): Path<HashMap<String, String>>,
    req: Request,
    next: Next,
) -> ApiResult<Response> {
    guard(ResourceKind::Section, state, auth, params, req, next).await
}

/// Requires membership of the project owning the task in `:task_id`
pub async fn require_task_access(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(params): Path<HashMap<String, String>>,
    req: Request,
    next: Next,
) -> ApiResult<Response> {
    guard(ResourceKind::Task, state, auth, params, req, next).await
}
