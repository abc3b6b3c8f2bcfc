/// Form model and database operations
///
/// A form is a manager-owned schema: an ordered list of fields that
/// structure a feedback submission. Employees of the owning manager can see
/// the manager's active forms.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE forms (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     manager_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     fields JSONB NOT NULL DEFAULT '[]'::jsonb,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ
/// );
/// ```

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use sqlx::types::Json;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use super::Outcome;
use crate::auth::authorization::ManagerCap;

const FORM_COLUMNS: &str =
    "id, title, description, manager_id, fields, is_active, created_at, updated_at";

/// Input type of a form field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    Text,
    Textarea,
    Select,
    Rating,
    Checkbox,
    Radio,
    Number,
    Email,
    Date,
    Time,
    DatetimeLocal,
    File,
    Password,
}

impl FieldType {
    /// Returns true for types that choose among a fixed list of options
    pub fn needs_options(&self) -> bool {
        matches!(self, FieldType::Select | FieldType::Radio)
    }
}

/// One field of a form schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    /// Key the answer is stored under; derived from the label when empty
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub label: String,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Problems found while normalizing a field list
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormValidationError {
    #[error("Field {0} needs an id or a label")]
    Unnamed(usize),

    #[error("Duplicate field id: {0}")]
    DuplicateId(String),

    #[error("Field '{0}' needs at least one option")]
    MissingOptions(String),

    #[error("Form title must not be empty")]
    EmptyTitle,
}

/// Trims a form title, rejecting one that is blank
pub fn normalize_title(title: &str) -> Result<String, FormValidationError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(FormValidationError::EmptyTitle);
    }
    Ok(title.to_string())
}

/// Derives a field id from its label: lower-cased, spaces become `_`
fn id_from_label(label: &str) -> String {
    label
        .trim()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

/// Derives a field name from its label in camelCase: `Team Spirit` → `teamSpirit`
fn name_from_label(label: &str) -> String {
    let mut words = label.split_whitespace();
    let mut name = words.next().map(str::to_lowercase).unwrap_or_default();
    for word in words {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            name.extend(first.to_uppercase());
            name.push_str(&chars.as_str().to_lowercase());
        }
    }
    name
}

/// Checks a field list and fills in missing ids and names
///
/// Field order is preserved. Every field ends up with a non-empty id that
/// is unique within the form, and choice fields carry at least one option.
/// A labelled field without a name gets one derived from the label.
///
/// # Example
///
/// ```
/// use feedtrack_shared::models::form::{normalize_fields, FieldType, FormField};
///
/// let fields = normalize_fields(vec![FormField {
///     id: String::new(),
///     label: "Overall Rating".to_string(),
///     field_type: FieldType::Rating,
///     required: true,
///     options: None,
///     placeholder: None,
///     name: None,
/// }])
/// .unwrap();
///
/// assert_eq!(fields[0].id, "overall_rating");
/// assert_eq!(fields[0].name.as_deref(), Some("overallRating"));
/// ```
pub fn normalize_fields(fields: Vec<FormField>) -> Result<Vec<FormField>, FormValidationError> {
    let mut seen = HashSet::with_capacity(fields.len());
    let mut normalized = Vec::with_capacity(fields.len());

    for (index, mut field) in fields.into_iter().enumerate() {
        field.id = field.id.trim().to_string();
        if field.id.is_empty() {
            field.id = id_from_label(&field.label);
        }
        if field.id.is_empty() {
            return Err(FormValidationError::Unnamed(index));
        }

        let has_name = field.name.as_deref().is_some_and(|name| !name.trim().is_empty());
        if !has_name && !field.label.trim().is_empty() {
            field.name = Some(name_from_label(&field.label));
        }

        if field.field_type.needs_options() {
            let has_options = field
                .options
                .as_ref()
                .map(|options| options.iter().any(|o| !o.trim().is_empty()))
                .unwrap_or(false);
            if !has_options {
                return Err(FormValidationError::MissingOptions(field.id));
            }
        }

        if !seen.insert(field.id.clone()) {
            return Err(FormValidationError::DuplicateId(field.id));
        }

        normalized.push(field);
    }

    Ok(normalized)
}

/// Returns the ids of required fields whose answer is missing
///
/// An answer is missing when absent, `null`, an empty (or blank) string,
/// or an empty array.
pub fn missing_required_answers(
    fields: &[FormField],
    answers: &Map<String, JsonValue>,
) -> Vec<String> {
    fields
        .iter()
        .filter(|field| field.required)
        .filter(|field| match answers.get(&field.id) {
            None | Some(JsonValue::Null) => true,
            Some(JsonValue::String(s)) => s.trim().is_empty(),
            Some(JsonValue::Array(items)) => items.is_empty(),
            Some(_) => false,
        })
        .map(|field| field.id.clone())
        .collect()
}

/// Form schema record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Form {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,

    /// Owning manager
    pub manager_id: Uuid,

    /// Ordered field list
    pub fields: Json<Vec<FormField>>,

    /// Inactive forms are hidden from employees and reject submissions
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Form plus the number of feedback records captured through it
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FormSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub form: Form,

    pub submission_count: i64,
}

/// Input for creating a form; fields must already be normalized
#[derive(Debug, Clone)]
pub struct NewForm {
    pub title: String,
    pub description: Option<String>,
    pub fields: Vec<FormField>,
    pub is_active: bool,
}

/// Partial form update
#[derive(Debug, Clone, Default)]
pub struct UpdateForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub fields: Option<Vec<FormField>>,
    pub is_active: Option<bool>,
}

impl Form {
    /// Creates a form owned by `owner`
    pub async fn create(pool: &PgPool, owner: &ManagerCap, data: NewForm) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO forms (title, description, manager_id, fields, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {FORM_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Form>(&query)
            .bind(data.title)
            .bind(data.description)
            .bind(owner.manager_id())
            .bind(Json(data.fields))
            .bind(data.is_active)
            .fetch_one(pool)
            .await
    }

    /// Finds a form by ID, without any visibility check
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {FORM_COLUMNS} FROM forms WHERE id = $1");

        sqlx::query_as::<_, Form>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists a manager's forms with submission counts, newest first
    pub async fn list_by_manager(
        pool: &PgPool,
        manager_id: Uuid,
        active_only: bool,
    ) -> Result<Vec<FormSummary>, sqlx::Error> {
        sqlx::query_as::<_, FormSummary>(
            r#"
            SELECT f.id, f.title, f.description, f.manager_id, f.fields, f.is_active,
                   f.created_at, f.updated_at,
                   (SELECT COUNT(*) FROM feedback fb
                    WHERE fb.form_id = f.id AND fb.manager_id = f.manager_id) AS submission_count
            FROM forms f
            WHERE f.manager_id = $1 AND ($2 = FALSE OR f.is_active = TRUE)
            ORDER BY f.created_at DESC, f.id DESC
            "#,
        )
        .bind(manager_id)
        .bind(active_only)
        .fetch_all(pool)
        .await
    }

    /// Merges `patch` into a form owned by `owner`
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        owner: &ManagerCap,
        patch: UpdateForm,
    ) -> Result<Outcome<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE forms SET
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                fields = COALESCE($5, fields),
                is_active = COALESCE($6, is_active),
                updated_at = NOW()
            WHERE id = $1 AND manager_id = $2
            RETURNING {FORM_COLUMNS}
            "#
        );

        let updated = sqlx::query_as::<_, Form>(&query)
            .bind(id)
            .bind(owner.manager_id())
            .bind(patch.title)
            .bind(patch.description)
            .bind(patch.fields.map(Json))
            .bind(patch.is_active)
            .fetch_optional(pool)
            .await?;

        match updated {
            Some(form) => Ok(Outcome::Applied(form)),
            None => Self::classify_miss(pool, id).await,
        }
    }

    /// Deletes a form owned by `owner`
    ///
    /// Feedback captured through the form keeps its `form_id` and answers.
    pub async fn delete(pool: &PgPool, id: Uuid, owner: &ManagerCap) -> Result<Outcome<()>, sqlx::Error> {
        let result = sqlx::query("DELETE FROM forms WHERE id = $1 AND manager_id = $2")
            .bind(id)
            .bind(owner.manager_id())
            .execute(pool)
            .await?;

        if result.rows_affected() > 0 {
            return Ok(Outcome::Applied(()));
        }

        Ok(Self::classify_miss(pool, id).await?.map(|_: Form| ()))
    }

    /// Counts a manager's active forms
    pub async fn count_active_by_manager(pool: &PgPool, manager_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM forms WHERE manager_id = $1 AND is_active = TRUE",
        )
        .bind(manager_id)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Counts feedback captured through any of a manager's forms
    pub async fn count_submissions_by_manager(
        pool: &PgPool,
        manager_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM feedback fb
            JOIN forms f ON f.id = fb.form_id
            WHERE f.manager_id = $1 AND fb.manager_id = $1
            "#,
        )
        .bind(manager_id)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    async fn classify_miss(pool: &PgPool, id: Uuid) -> Result<Outcome<Self>, sqlx::Error> {
        Ok(match Self::find_by_id(pool, id).await? {
            None => Outcome::NotFound,
            Some(_) => Outcome::NotPermitted,
        })
    }
}
