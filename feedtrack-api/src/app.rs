/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use feedtrack_api::{app::{build_router, AppState}, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let app = build_router(AppState::new(pool, config));
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer, routes};
use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use feedtrack_shared::auth::middleware::create_jwt_middleware;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
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
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete router
///
/// ```text
/// /                                   GET     public
/// /api/health                         GET     public
/// /api/auth/register                  POST    public
/// /api/auth/login                     POST    public
/// /api/auth/managers                  GET     public
/// /api/auth/me                        GET
/// /api/auth/refresh                   POST
/// /api/auth/team-members              GET     manager
/// /api/feedback                       POST, GET
/// /api/feedback/:id                   GET, PUT, DELETE
/// /api/feedback/:id/acknowledge       POST    employee
/// /api/dashboard/manager              GET     manager
/// /api/dashboard/employee             GET     employee
/// /api/dashboard/stats                GET     manager
/// /api/forms                          POST, GET
/// /api/forms/active/list              GET
/// /api/forms/:id                      GET, PUT, DELETE
/// /api/forms/:id/submit               POST
/// /api/forms/:id/submissions          GET     manager
/// ```
///
/// Unmarked routes below `/api/auth/me` require a bearer token; role
/// checks happen in the handlers.
pub fn build_router(state: AppState) -> Router {
    let jwt = middleware::from_fn(create_jwt_middleware(
        state.db.clone(),
        state.jwt_secret().to_string(),
    ));

    let public_auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/managers", get(routes::auth::list_managers));

    let protected_auth_routes = Router::new()
        .route("/me", get(routes::auth::me))
        .route("/refresh", post(routes::auth::refresh))
        .route("/team-members", get(routes::auth::team_members))
        .route_layer(jwt.clone());

    let feedback_routes = Router::new()
        .route(
            "/",
            post(routes::feedback::create_feedback).get(routes::feedback::list_feedback),
        )
        .route(
            "/:id",
            get(routes::feedback::get_feedback)
                .put(routes::feedback::update_feedback)
                .delete(routes::feedback::delete_feedback),
        )
        .route("/:id/acknowledge", post(routes::feedback::acknowledge_feedback))
        .route_layer(jwt.clone());

    let dashboard_routes = Router::new()
        .route("/manager", get(routes::dashboard::manager_dashboard))
        .route("/employee", get(routes::dashboard::employee_dashboard))
        .route("/stats", get(routes::dashboard::general_stats))
        .route_layer(jwt.clone());

    let form_routes = Router::new()
        .route("/", post(routes::forms::create_form).get(routes::forms::list_forms))
        .route("/active/list", get(routes::forms::list_active_forms))
        .route(
            "/:id",
            get(routes::forms::get_form)
                .put(routes::forms::update_form)
                .delete(routes::forms::delete_form),
        )
        .route("/:id/submit", post(routes::forms::submit_form))
        .route("/:id/submissions", get(routes::forms::list_submissions))
        .route_layer(jwt);

    let api_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/auth", public_auth_routes.merge(protected_auth_routes))
        .nest("/feedback", feedback_routes)
        .nest("/dashboard", dashboard_routes)
        .nest("/forms", form_routes);

    Router::new()
        .route("/", get(routes::health::root))
        .nest("/api", api_routes)
        .fallback(not_found)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// CORS: permissive when `*` is configured, else the listed origins
fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_allows_any() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

async fn not_found() -> ApiError {
    ApiError::NotFound("Route not found".to_string())
}
