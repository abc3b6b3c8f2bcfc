/// Database models for Feedtrack
///
/// This module contains the three persisted collections and their queries.
///
/// # Models
///
/// - `user`: Accounts, roles and the manager → team relation
/// - `feedback`: Manager-authored feedback addressed to one employee
/// - `form`: Manager-defined form schemas used to structure feedback
///
/// Mutating queries take an authorization capability from
/// [`crate::auth::authorization`] and fold the ownership check into the
/// statement's `WHERE` clause. When no row matches they report an
/// [`Outcome`] so the caller can tell a missing record from a foreign one.
///
/// # Example
///
/// ```no_run
/// use feedtrack_shared::models::user::{CreateUser, User, UserRole};
/// use feedtrack_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::new("postgresql://localhost/feedtrack")).await?;
///
/// let manager = User::create(&pool, CreateUser {
///     email: "lead@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     full_name: "Team Lead".to_string(),
///     role: UserRole::Manager,
///     employee_id: "M-001".to_string(),
///     department: Some("Engineering".to_string()),
///     manager_id: None,
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod feedback;
pub mod form;
pub mod user;

/// Result of a write that is scoped to the record's owner
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The write matched and was applied
    Applied(T),

    /// No record with the given id exists
    NotFound,

    /// The record exists but belongs to someone else
    NotPermitted,
}

impl<T> Outcome<T> {
    /// Maps the applied value, keeping the failure variants
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Applied(value) => Outcome::Applied(f(value)),
            Outcome::NotFound => Outcome::NotFound,
            Outcome::NotPermitted => Outcome::NotPermitted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_map() {
        assert_eq!(Outcome::Applied(2).map(|v| v * 2), Outcome::Applied(4));
        assert_eq!(Outcome::<i32>::NotFound.map(|v| v * 2), Outcome::NotFound);
        assert_eq!(
            Outcome::<i32>::NotPermitted.map(|v| v * 2),
            Outcome::NotPermitted
        );
    }
}
