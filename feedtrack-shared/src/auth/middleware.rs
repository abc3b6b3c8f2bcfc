/// Bearer-token authentication middleware for Axum
///
/// The middleware validates the `Authorization: Bearer <token>` header,
/// re-loads the referenced user and inserts an [`AuthContext`] into the
/// request extensions. Requests without a valid token never reach the
/// handler.
///
/// The user row is read on every request, so deactivating an account or
/// changing a role takes effect immediately rather than at token expiry.
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Extension, Router};
/// use feedtrack_shared::auth::middleware::{create_jwt_middleware, AuthContext};
/// use sqlx::PgPool;
///
/// async fn whoami(Extension(auth): Extension<AuthContext>) -> String {
///     auth.user.full_name
/// }
///
/// fn router(pool: PgPool) -> Router {
///     Router::new()
///         .route("/whoami", get(whoami))
///         .layer(middleware::from_fn(create_jwt_middleware(pool, "secret")))
/// }
/// ```

use std::future::Future;
use std::pin::Pin;

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sqlx::PgPool;

use super::authorization::Caller;
use super::jwt::{validate_token, JwtError};
use crate::models::user::User;

/// Authenticated identity attached to each request
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Freshly loaded user row
    pub user: User,

    /// Authorization subject derived from `user`
    pub caller: Caller,
}

impl AuthContext {
    pub fn new(user: User) -> Self {
        let caller = Caller::from_user(&user);
        Self { user, caller }
    }
}

/// Error type for authentication
#[derive(Debug)]
pub enum AuthError {
    /// Missing authorization header
    MissingCredentials,

    /// Header is not `Bearer <token>`
    InvalidFormat(String),

    /// Token validation failed
    InvalidToken(String),

    /// Token names a user that no longer exists
    UnknownUser,

    /// Account is deactivated
    Inactive,

    /// Database error
    DatabaseError(String),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn message(&self) -> String {
        match self {
            AuthError::MissingCredentials => "Not authenticated".to_string(),
            AuthError::InvalidFormat(msg) | AuthError::InvalidToken(msg) => msg.clone(),
            AuthError::UnknownUser => "User not found".to_string(),
            AuthError::Inactive => "Account is inactive".to_string(),
            AuthError::DatabaseError(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();

        if let AuthError::DatabaseError(ref detail) = self {
            tracing::error!(error = %detail, "Authentication lookup failed");
        }

        let code = if status == StatusCode::UNAUTHORIZED {
            "Unauthorized"
        } else {
            "InternalError"
        };

        let body = Json(json!({ "error": code, "message": self.message() }));
        let mut response = (status, body).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                header::HeaderValue::from_static("Bearer"),
            );
        }
        response
    }
}

/// Extracts the token from an `Authorization` header value
///
/// The scheme is matched case-insensitively.
pub fn parse_bearer(header_value: Option<&str>) -> Result<&str, AuthError> {
    let value = header_value.ok_or(AuthError::MissingCredentials)?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::InvalidFormat("Expected Bearer token".to_string()));
    }

    Ok(token)
}

/// Validates a token and loads the active user it names
pub async fn authenticate(pool: &PgPool, token: &str, secret: &str) -> Result<AuthContext, AuthError> {
    let claims = validate_token(token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer => AuthError::InvalidToken("Invalid issuer".to_string()),
        _ => AuthError::InvalidToken("Could not validate credentials".to_string()),
    })?;

    let user = User::find_by_id(pool, claims.sub)
        .await
        .map_err(|e| AuthError::DatabaseError(format!("Database error: {}", e)))?
        .ok_or(AuthError::UnknownUser)?;

    if !user.is_active {
        return Err(AuthError::Inactive);
    }

    Ok(AuthContext::new(user))
}

/// JWT authentication middleware
///
/// # Errors
///
/// Returns 401 Unauthorized if the header is missing or malformed, the
/// token fails validation, or the user is unknown or inactive.
pub async fn jwt_auth_middleware(
    pool: PgPool,
    secret: String,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let header_value = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let token = parse_bearer(header_value)?;
    let context = authenticate(&pool, token, &secret).await?;

    tracing::debug!(user_id = %context.user.id, role = context.caller.role().as_str(), "Authenticated request");

    req.extensions_mut().insert(context);

    Ok(next.run(req).await)
}

type MiddlewareFuture = Pin<Box<dyn Future<Output = Result<Response, AuthError>> + Send>>;

/// Creates a JWT authentication middleware closure for `middleware::from_fn`
pub fn create_jwt_middleware(
    pool: PgPool,
    secret: impl Into<String>,
) -> impl Fn(Request, Next) -> MiddlewareFuture + Clone {
    let secret = secret.into();
    move |req, next| {
        let pool = pool.clone();
        let secret = secret.clone();
        Box::pin(jwt_auth_middleware(pool, secret, req, next))
    }
}
