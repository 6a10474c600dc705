/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tasklane_api::{app::{build_router, AppState}, config::Config};
/// use tasklane_shared::store::MemoryStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Arc::new(MemoryStore::new()), config);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::Config,
    error::ApiResult,
    middleware::{access, security::SecurityHeadersLayer},
};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::{from_fn_with_state, Next},
    response::Response,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tasklane_shared::auth::middleware::authenticate;
use tasklane_shared::store::EntityRepository;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned into every handler through Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Persistence, PostgreSQL in production and in-memory in tests
    pub store: Arc<dyn EntityRepository>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn EntityRepository>, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                          # Health check (public)
/// └── /v1/
///     ├── /users/
///     │   ├── POST /signup
///     │   ├── POST /login
///     │   ├── POST /refresh
///     │   └── GET  /:user_id/projects     (self only)
///     ├── /projects/                      (project guard on /:project_id/*)
///     │   ├── GET|POST /
///     │   ├── GET      /:project_id
///     │   ├── POST     /:project_id/members
///     │   ├── GET|POST /:project_id/sections
///     │   └── POST     /:project_id/tags
///     ├── /sections/                      (section guard)
///     │   ├── GET|PATCH|DELETE /:section_id
///     │   └── POST /:section_id/tasks
///     ├── /tasks/                         (task guard on /:task_id/*)
///     │   ├── GET /?ids=a,b
///     │   ├── GET|PATCH|DELETE /:task_id
///     │   └── POST /:task_id/comments
///     ├── /comments/
///     │   └── GET /?ids=a,b
///     └── /tags/
///         ├── GET /?ids=a,b
///         └── PATCH|DELETE /:tag_id
/// ```
///
/// # Middleware Stack
///
/// Outermost first: security headers, CORS, tracing, then per router the
/// JWT layer followed by the access guard.
pub fn build_router(state: AppState) -> Router {
    use crate::routes::{comments, health, projects, sections, tags, tasks, users};

    let health_routes = Router::new().route("/health", get(health::health_check));

    let user_routes = Router::new()
        .route("/:user_id/projects", get(users::list_user_projects))
        .layer(from_fn_with_state(state.clone(), jwt_auth_layer))
        .route("/signup", post(users::signup))
        .route("/login", post(users::login))
        .route("/refresh", post(users::refresh));

    let project_routes = Router::new()
        .route("/:project_id", get(projects::get_project))
        .route("/:project_id/members", post(projects::add_member))
        .route(
            "/:project_id/sections",
            get(projects::list_sections).post(projects::create_sections),
        )
        .route("/:project_id/tags", post(projects::create_tag))
        .route_layer(from_fn_with_state(state.clone(), access::require_project_access))
        .route("/", get(projects::list_projects).post(projects::create_project))
        .layer(from_fn_with_state(state.clone(), jwt_auth_layer));

    let section_routes = Router::new()
        .route(
            "/:section_id",
            get(sections::get_section)
                .patch(sections::update_section)
                .delete(sections::delete_section),
        )
        .route("/:section_id/tasks", post(sections::create_task))
        .route_layer(from_fn_with_state(state.clone(), access::require_section_access))
        .layer(from_fn_with_state(state.clone(), jwt_auth_layer));

    let task_routes = Router::new()
        .route(
            "/:task_id",
            get(tasks::get_task)
                .patch(tasks::update_task)
                .delete(tasks::delete_task),
        )
        .route("/:task_id/comments", post(tasks::create_comment))
        .route_layer(from_fn_with_state(state.clone(), access::require_task_access))
        .route("/", get(tasks::get_tasks))
        .layer(from_fn_with_state(state.clone(), jwt_auth_layer));

    let comment_routes = Router::new()
        .route("/", get(comments::get_comments))
        .layer(from_fn_with_state(state.clone(), jwt_auth_layer));

    let tag_routes = Router::new()
        .route("/", get(tags::get_tags))
        .route("/:tag_id", patch(tags::update_tag).delete(tags::delete_tag))
        .layer(from_fn_with_state(state.clone(), jwt_auth_layer));

    let v1_routes = Router::new()
        .nest("/users", user_routes)
        .nest("/projects", project_routes)
        .nest("/sections", section_routes)
        .nest("/tasks", task_routes)
        .nest("/comments", comment_routes)
        .nest("/tags", tag_routes);

    let cors = if state.config.allows_any_origin() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    let production = state.config.api.production;

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(production))
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Validates the bearer token, confirms the user still exists and puts the
/// resulting `AuthContext` into the request extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> ApiResult<Response> {
    let auth = authenticate(state.store.as_ref(), req.headers(), state.jwt_secret()).await?;

    req.extensions_mut().insert(auth);

    Ok(next.run(req).await)
}
