/// API route handlers
///
/// Organized by resource:
///
/// - `health`: Health check endpoint
/// - `users`: Signup, login, token refresh and a user's projects
/// - `projects`: Projects, members, sections and tags of a project
/// - `sections`: Section detail, updates and task creation
/// - `tasks`: Task detail, updates, comments and bulk fetch
/// - `comments`: Bulk comment fetch
/// - `tags`: Bulk tag fetch, tag updates and deletion
///
/// Handlers behind an access guard can assume the guarded id exists and is
/// visible to the caller, but still treat a vanished entity as a 404 since a
/// concurrent delete may land between the guard and the handler.

pub mod comments;
pub mod health;
pub mod projects;
pub mod sections;
pub mod tags;
pub mod tasks;
pub mod users;

use serde::Deserialize;
use tasklane_shared::permission::dedup_ids;
use validator::ValidationError;

/// `?ids=a,b,c` query of the bulk endpoints
#[derive(Debug, Default, Deserialize)]
pub struct IdsQuery {
    pub ids: Option<String>,
}

impl IdsQuery {
    /// Requested ids, trimmed and deduplicated in first-seen order
    pub fn ids(&self) -> Vec<String> {
        let raw: Vec<&str> = self
            .ids
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .collect();

        dedup_ids(&raw)
    }
}

/// Accepts `#rrggbb` colours
pub fn validate_colour(value: &str) -> Result<(), ValidationError> {
    let hex = value.strip_prefix('#').unwrap_or_default();

    if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Ok(());
    }

    let mut error = ValidationError::new("colour");
    error.message = Some("Colour must be a hex string like #a1b2c3".into());
    Err(error)
}
