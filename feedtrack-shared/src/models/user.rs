/// User model and database operations
///
/// Users are either managers or employees. An employee may point at the
/// manager whose team they belong to; that relation drives feedback
/// authorship and form visibility.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('manager', 'employee');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(320) NOT NULL CONSTRAINT users_email_key UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     full_name VARCHAR(255) NOT NULL,
///     role user_role NOT NULL,
///     employee_id VARCHAR(64) NOT NULL CONSTRAINT users_employee_id_key UNIQUE,
///     department VARCHAR(255),
///     manager_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Emails are stored lower-cased (see [`normalize_email`]) so the plain
/// unique constraint is case-insensitive in practice.
///
/// # Example
///
/// ```no_run
/// use feedtrack_shared::models::user::User;
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, manager_id: Uuid) -> Result<(), sqlx::Error> {
/// for member in User::list_team_members(&pool, manager_id).await? {
///     println!("{} ({})", member.full_name, member.employee_id);
/// }
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Role of a user account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Authors feedback and forms for their team
    Manager,

    /// Reads and acknowledges feedback addressed to them
    Employee,
}

impl UserRole {
    /// Role name as stored and serialized
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Manager => "manager",
            UserRole::Employee => "employee",
        }
    }
}

/// User account
///
/// The password hash is never serialized into API responses.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Lower-cased email address, unique across all users
    pub email: String,

    /// Argon2id password hash (PHC string)
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Display name
    pub full_name: String,

    /// Manager or employee
    pub role: UserRole,

    /// Organisation-assigned employee number, unique across all users
    pub employee_id: String,

    /// Optional department name
    pub department: Option<String>,

    /// The manager this employee reports to (always None for managers)
    pub manager_id: Option<Uuid>,

    /// Inactive accounts cannot log in or authenticate
    pub is_active: bool,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Returns true if the user is a manager
    pub fn is_manager(&self) -> bool {
        self.role == UserRole::Manager
    }

    /// Returns true if this user is an employee reporting to `manager_id`
    pub fn reports_to(&self, manager_id: Uuid) -> bool {
        self.role == UserRole::Employee && self.manager_id == Some(manager_id)
    }
}

/// Input for creating a new user
///
/// The caller is responsible for hashing the password and for checking the
/// manager reference; see the registration handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Email address (normalized before insert)
    pub email: String,

    /// Argon2id password hash (NOT the plaintext password)
    pub password_hash: String,

    /// Display name
    pub full_name: String,

    /// Account role
    pub role: UserRole,

    /// Organisation-assigned employee number
    pub employee_id: String,

    /// Optional department
    pub department: Option<String>,

    /// Manager reference for employees
    pub manager_id: Option<Uuid>,
}

/// Public manager entry used to populate registration forms
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ManagerOption {
    /// Manager's display name
    pub label: String,

    /// Manager's user ID
    pub value: Uuid,
}

/// Normalizes an email address for storage and lookup
///
/// # Example
///
/// ```
/// use feedtrack_shared::models::user::normalize_email;
///
/// assert_eq!(normalize_email("  Jane.Doe@Example.COM "), "jane.doe@example.com");
/// ```
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl User {
    /// Creates a new user in the database
    ///
    /// # Arguments
    ///
    /// * `pool` - Database connection pool
    /// * `data` - User creation data
    ///
    /// # Returns
    ///
    /// The newly created user with generated ID and timestamps
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Email or employee ID already exists (unique constraint violation)
    /// - Manager reference points at a missing user (foreign key violation)
    /// - Database connection fails
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, full_name, role, employee_id, department, manager_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, email, password_hash, full_name, role, employee_id, department,
                      manager_id, is_active, created_at, updated_at
            "#,
        )
        .bind(normalize_email(&data.email))
        .bind(data.password_hash)
        .bind(data.full_name)
        .bind(data.role)
        .bind(data.employee_id)
        .bind(data.department)
        .bind(data.manager_id)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    ///
    /// # Returns
    ///
    /// The user if found, None otherwise
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, full_name, role, employee_id, department,
                   manager_id, is_active, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address
    ///
    /// The address is normalized before lookup, so the match is
    /// case-insensitive.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use feedtrack_shared::models::user::User;
    /// # use sqlx::PgPool;
    /// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
    /// if let Some(user) = User::find_by_email(&pool, "Jane@Example.com").await? {
    ///     println!("Found user: {}", user.id);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, full_name, role, employee_id, department,
                   manager_id, is_active, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(normalize_email(email))
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Lists the active employees that report to a manager
    ///
    /// Ordered by full name.
    pub async fn list_team_members(
        pool: &PgPool,
        manager_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let members = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, full_name, role, employee_id, department,
                   manager_id, is_active, created_at, updated_at
            FROM users
            WHERE manager_id = $1 AND role = 'employee' AND is_active = TRUE
            ORDER BY full_name ASC, id ASC
            "#,
        )
        .bind(manager_id)
        .fetch_all(pool)
        .await?;

        Ok(members)
    }

    /// Lists active managers as label/value pairs
    pub async fn list_managers(pool: &PgPool) -> Result<Vec<ManagerOption>, sqlx::Error> {
        let managers = sqlx::query_as::<_, ManagerOption>(
            r#"
            SELECT full_name AS label, id AS value
            FROM users
            WHERE role = 'manager' AND is_active = TRUE
            ORDER BY full_name ASC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(managers)
    }

    /// Counts the active employees that report to a manager
    pub async fn count_team_members(pool: &PgPool, manager_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM users
            WHERE manager_id = $1 AND role = 'employee' AND is_active = TRUE
            "#,
        )
        .bind(manager_id)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }
}
