/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing
/// - [`jwt`]: HS256 access tokens
/// - [`middleware`]: Bearer-token middleware producing an `AuthContext`
/// - [`authorization`]: Manager/employee capabilities and visibility rules
///
/// # Example
///
/// ```no_run
/// use chrono::Duration;
/// use feedtrack_shared::auth::jwt::{create_token, Claims};
/// use feedtrack_shared::auth::password::{hash_password, verify_password};
/// use feedtrack_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4(), UserRole::Manager, Duration::minutes(30));
/// let token = create_token(&claims, "secret-key-of-at-least-32-bytes!")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
