/// User endpoints
///
/// - `POST /v1/users/signup` - Create an account and get tokens
/// - `POST /v1/users/login` - Exchange credentials for tokens
/// - `POST /v1/users/refresh` - Exchange a refresh token for an access token
/// - `GET /v1/users/:user_id/projects` - Projects of the caller

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tasklane_shared::{
    auth::{
        jwt::{self, TokenPair, TokenType},
        middleware::AuthContext,
        password,
    },
    models::{CreateUser, Project, User},
};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

/// Signup request
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 4, max = 65, message = "Username must be 4-65 characters"))]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, max = 255, message = "Password must be 8-255 characters"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 4, max = 65, message = "Username must be 4-65 characters"))]
    pub username: String,

    #[validate(length(max = 255, message = "Password must be at most 255 characters"))]
    pub password: String,
}

/// Signup and login response
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: User,

    #[serde(flatten)]
    pub tokens: TokenPair,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Refresh token response
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    /// New access token (24h)
    pub access_token: String,

    /// Seconds until the access token expires
    pub expires_in: i64,
}

/// Creates an account
///
/// # Errors
///
/// - `409 Conflict`: Username already taken (case-insensitive)
/// - `422 Unprocessable Entity`: Validation failed
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    req.validate()?;

    let password_hash = password::hash_password(&req.password)?;

    let user = state
        .store
        .create_user(CreateUser {
            username: req.username,
            email: req.email,
            password_hash,
        })
        .await?;

    info!(user_id = %user.id, username = %user.username, "User signed up");

    let tokens = jwt::issue_token_pair(user.id, state.jwt_secret())?;

    Ok((StatusCode::CREATED, Json(AuthResponse { user, tokens })))
}

/// Logs a user in
///
/// Unknown usernames and wrong passwords get the same 401.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    req.validate()?;

    let invalid = || ApiError::Unauthorized("Invalid username or password".to_string());

    let user = state
        .store
        .find_user_by_username(&req.username)
        .await?
        .ok_or_else(invalid)?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        warn!(user_id = %user.id, "Login failed: wrong password");
        return Err(invalid());
    }

    let tokens = jwt::issue_token_pair(user.id, state.jwt_secret())?;

    Ok(Json(AuthResponse { user, tokens }))
}

/// Issues a new access token for a refresh token whose user still exists
pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let claims = jwt::validate_refresh_token(&req.refresh_token, state.jwt_secret())?;

    if state.store.find_user_by_id(claims.sub).await?.is_none() {
        return Err(ApiError::Unauthorized("Unknown user".to_string()));
    }

    let access = jwt::Claims::new(claims.sub, TokenType::Access);

    Ok(Json(RefreshResponse {
        access_token: jwt::create_token(&access, state.jwt_secret())?,
        expires_in: TokenType::Access.lifetime().num_seconds(),
    }))
}

/// Lists the projects of `:user_id`, which must be the caller
pub async fn list_user_projects(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<Project>>> {
    if Uuid::parse_str(&user_id).ok() != Some(auth.user_id) {
        warn!(
            user_id = %auth.user_id,
            requested = %user_id,
            "Attempt to list another user's projects"
        );
        return Err(ApiError::Forbidden(
            "Cannot list projects of another user".to_string(),
        ));
    }

    let projects = state.store.list_projects_for_user(auth.user_id).await?;

    Ok(Json(projects))
}
