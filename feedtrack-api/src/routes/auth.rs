/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/auth/register` - Register a manager or employee
/// - `POST /api/auth/login` - Exchange credentials for an access token
/// - `GET /api/auth/managers` - Public manager list for the registration form
/// - `GET /api/auth/me` - Current user
/// - `POST /api/auth/refresh` - Fresh access token for the current user
/// - `GET /api/auth/team-members` - The calling manager's active employees

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ApiJson,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use feedtrack_shared::{
    auth::{
        jwt::{self, Claims},
        middleware::AuthContext,
        password,
    },
    models::user::{CreateUser, ManagerOption, User, UserRole},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(length(min = 1, max = 255, message = "Full name is required"))]
    pub full_name: String,

    pub role: UserRole,

    #[validate(length(min = 1, max = 64, message = "Employee ID is required"))]
    pub employee_id: String,

    #[validate(length(max = 255, message = "Department must be at most 255 characters"))]
    pub department: Option<String>,

    /// Manager the new employee reports to
    pub manager_id: Option<Uuid>,
}

impl RegisterRequest {
    fn normalized(mut self) -> Self {
        self.email = self.email.trim().to_string();
        self.full_name = self.full_name.trim().to_string();
        self.employee_id = self.employee_id.trim().to_string();
        self.department = self
            .department
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        self
    }
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub user: User,
    pub access_token: String,
    pub token_type: String,

    /// Seconds until the token expires
    pub expires_in: i64,
}

/// Refresh response
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

fn issue_token(state: &AppState, user: &User) -> ApiResult<(String, i64)> {
    let claims = Claims::new(user.id, user.role, state.config.jwt.ttl());
    let token = jwt::create_token(&claims, state.jwt_secret())?;
    Ok((token, claims.expires_in()))
}

/// Register a new user
///
/// ```text
/// POST /api/auth/register
///
/// {
///   "email": "dev@example.com",
///   "password": "correct-horse",
///   "full_name": "Dana Developer",
///   "role": "employee",
///   "employee_id": "E-1042",
///   "manager_id": "8f0c…"
/// }
/// ```
///
/// # Errors
///
/// - `422`: Invalid fields, a manager with a manager reference, or an
///   employee whose manager reference does not name an active manager
/// - `409`: Email or employee ID already registered
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let req = req.normalized();
    req.validate()?;

    match (req.role, req.manager_id) {
        (UserRole::Manager, Some(_)) => {
            return Err(ApiError::invalid_field(
                "manager_id",
                "Managers cannot report to a manager",
            ));
        }
        (UserRole::Employee, Some(manager_id)) => {
            let manager = User::find_by_id(&state.db, manager_id).await?;
            if !matches!(manager, Some(ref m) if m.is_manager() && m.is_active) {
                return Err(ApiError::invalid_field("manager_id", "Invalid manager ID"));
            }
        }
        _ => {}
    }

    if User::find_by_email(&state.db, &req.email).await?.is_some() {
        return Err(ApiError::Conflict("Email already registered".to_string()));
    }

    let password_hash = password::hash_password(&req.password)?;

    // Unique constraints still guard against a concurrent registration
    let user = User::create(
        &state.db,
        CreateUser {
            email: req.email,
            password_hash,
            full_name: req.full_name,
            role: req.role,
            employee_id: req.employee_id,
            department: req.department,
            manager_id: req.manager_id,
        },
    )
    .await?;

    tracing::info!(user_id = %user.id, role = user.role.as_str(), "User registered");

    Ok((StatusCode::CREATED, Json(user)))
}

/// Log in with email and password
///
/// # Errors
///
/// - `401`: Unknown email, wrong password, or deactivated account
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    req.validate()?;

    let invalid = || ApiError::Unauthorized("Incorrect email or password".to_string());

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(invalid)?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
        return Err(invalid());
    }

    if !user.is_active {
        return Err(ApiError::Unauthorized("Account is deactivated".to_string()));
    }

    let (access_token, expires_in) = issue_token(&state, &user)?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        user,
        access_token,
        token_type: "bearer".to_string(),
        expires_in,
    }))
}

/// Current user
pub async fn me(Extension(auth): Extension<AuthContext>) -> Json<User> {
    Json(auth.user)
}

/// Issue a fresh token for the authenticated user
pub async fn refresh(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<TokenResponse>> {
    let (access_token, expires_in) = issue_token(&state, &auth.user)?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        expires_in,
    }))
}

/// Active employees of the calling manager, ordered by name
pub async fn team_members(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<User>>> {
    let cap = auth.caller.require_manager()?;
    let members = User::list_team_members(&state.db, cap.manager_id()).await?;
    Ok(Json(members))
}

/// Active managers as `{label, value}` pairs
pub async fn list_managers(State(state): State<AppState>) -> ApiResult<Json<Vec<ManagerOption>>> {
    Ok(Json(User::list_managers(&state.db).await?))
}
