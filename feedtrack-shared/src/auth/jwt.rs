/// JWT access tokens
///
/// Tokens are signed with HS256 and identify a user together with the role
/// they held when the token was issued. The role claim is informational:
/// authorization always re-reads the user row, so a role change takes
/// effect on the next request.
///
/// # Claims
///
/// - `sub`: User ID
/// - `role`: `manager` or `employee`
/// - `iss`: Always `feedtrack`
/// - `iat` / `nbf` / `exp`: Unix timestamps
///
/// # Example
///
/// ```
/// use chrono::Duration;
/// use feedtrack_shared::auth::jwt::{create_token, validate_token, Claims};
/// use feedtrack_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "a-development-secret-of-32-bytes!";
/// let user_id = Uuid::new_v4();
///
/// let claims = Claims::new(user_id, UserRole::Employee, Duration::minutes(30));
/// let token = create_token(&claims, secret)?;
///
/// assert_eq!(validate_token(&token, secret)?.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::UserRole;

/// Issuer written into and required from every token
pub const ISSUER: &str = "feedtrack";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Signature, format or claim check failed
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Token was issued by someone else
    #[error("Invalid issuer")]
    InvalidIssuer,
}

/// Access token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - User ID
    pub sub: Uuid,

    /// Role at issue time
    pub role: UserRole,

    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub nbf: i64,
}

impl Claims {
    /// Creates claims valid from now for `ttl`
    pub fn new(user_id: Uuid, role: UserRole, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            role,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            nbf: now.timestamp(),
        }
    }

    /// Seconds until expiry, zero once expired
    pub fn expires_in(&self) -> i64 {
        (self.exp - Utc::now().timestamp()).max(0)
    }
}

/// Signs claims into a compact JWT
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&Header::new(Algorithm::HS256), claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates a token and returns its claims
///
/// Checks the signature, `exp`, `nbf` and the issuer. No leeway is
/// applied to `exp`.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.leeway = 0;

    let data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => JwtError::Expired,
        ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-that-is-at-least-32-bytes";

    #[test]
    fn test_create_and_validate() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, UserRole::Manager, Duration::minutes(30));
        let token = create_token(&claims, SECRET).unwrap();

        let validated = validate_token(&token, SECRET).unwrap();
        assert_eq!(validated, claims);
        assert_eq!(validated.role, UserRole::Manager);
        assert_eq!(validated.iss, ISSUER);
        assert!(validated.expires_in() > 29 * 60);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let claims = Claims::new(Uuid::new_v4(), UserRole::Employee, Duration::minutes(5));
        let token = create_token(&claims, SECRET).unwrap();

        let result = validate_token(&token, "another-secret-that-is-32-bytes-long");
        assert!(matches!(result, Err(JwtError::ValidationError(_))));
    }

    #[test]
    fn test_expired_token_rejected() {
        let claims = Claims::new(Uuid::new_v4(), UserRole::Employee, Duration::seconds(-3600));
        assert_eq!(claims.expires_in(), 0);

        let token = create_token(&claims, SECRET).unwrap();
        assert!(matches!(validate_token(&token, SECRET), Err(JwtError::Expired)));
    }

    #[test]
    fn test_foreign_issuer_rejected() {
        let mut claims = Claims::new(Uuid::new_v4(), UserRole::Manager, Duration::minutes(5));
        claims.iss = "someone-else".to_string();
        let token = create_token(&claims, SECRET).unwrap();

        assert!(matches!(validate_token(&token, SECRET), Err(JwtError::InvalidIssuer)));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            validate_token("not.a.jwt", SECRET),
            Err(JwtError::ValidationError(_))
        ));
    }
}
