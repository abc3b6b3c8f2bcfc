/// Feedback model and database operations
///
/// A feedback record is written by a manager about one employee of their
/// team. The employee can acknowledge it exactly once.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE sentiment AS ENUM ('positive', 'neutral', 'negative');
///
/// CREATE TABLE feedback (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     employee_id UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
///     manager_id UUID NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
///     strengths TEXT NOT NULL,
///     areas_to_improve TEXT NOT NULL,
///     overall_sentiment sentiment NOT NULL,
///     additional_notes TEXT,
///     form_data JSONB,
///     form_id UUID,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ,
///     is_acknowledged BOOLEAN NOT NULL DEFAULT FALSE,
///     acknowledged_at TIMESTAMPTZ
/// );
/// ```
///
/// `form_id` is deliberately not a foreign key: `form_data` is a frozen
/// snapshot and outlives the form it was captured from. Users with
/// feedback cannot be deleted.
///
/// # Concurrency
///
/// Updates, deletes and acknowledgements are single statements whose
/// `WHERE` clause carries the ownership (and, for acknowledgement, the
/// `is_acknowledged = FALSE`) condition. Two concurrent acknowledgements
/// therefore cannot both match.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use super::Outcome;
use crate::auth::authorization::{EmployeeCap, FeedbackScope, ManagerCap, SelfSubmissionCap};

const FEEDBACK_COLUMNS: &str = "id, employee_id, manager_id, strengths, areas_to_improve, \
     overall_sentiment, additional_notes, form_data, form_id, created_at, updated_at, \
     is_acknowledged, acknowledged_at";

/// Overall sentiment of a feedback record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "sentiment", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    #[serde(alias = "pos", alias = "Positive")]
    Positive,

    #[serde(alias = "Neutral")]
    Neutral,

    #[serde(alias = "neg", alias = "Negative")]
    Negative,
}

impl Sentiment {
    /// All sentiments, in display order
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Neutral, Sentiment::Negative];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }

    /// Reads a free-form answer; anything unrecognised counts as neutral
    ///
    /// Used for form submissions, where the sentiment arrives as an
    /// arbitrary answer rather than a typed field.
    ///
    /// ```
    /// use feedtrack_shared::models::feedback::Sentiment;
    ///
    /// assert_eq!(Sentiment::from_answer("POS"), Sentiment::Positive);
    /// assert_eq!(Sentiment::from_answer("meh"), Sentiment::Neutral);
    /// ```
    pub fn from_answer(answer: &str) -> Self {
        match answer.trim().to_lowercase().as_str() {
            "positive" | "pos" => Sentiment::Positive,
            "negative" | "neg" => Sentiment::Negative,
            _ => Sentiment::Neutral,
        }
    }
}

/// Feedback record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Feedback {
    pub id: Uuid,

    /// Employee the feedback is addressed to
    pub employee_id: Uuid,

    /// Authoring manager
    pub manager_id: Uuid,

    pub strengths: String,

    pub areas_to_improve: String,

    pub overall_sentiment: Sentiment,

    pub additional_notes: Option<String>,

    /// Snapshot of form answers (field id → answer)
    pub form_data: Option<JsonValue>,

    /// Form the answers were captured with, if any
    pub form_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,

    /// Set on every update, None until the first one
    pub updated_at: Option<DateTime<Utc>>,

    pub is_acknowledged: bool,

    /// Set once, on the false → true acknowledgement transition
    pub acknowledged_at: Option<DateTime<Utc>>,
}

/// Input for creating feedback
///
/// There is no manager field: the author is always the manager whose
/// capability is passed to [`Feedback::create`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFeedback {
    pub employee_id: Uuid,
    pub strengths: String,
    pub areas_to_improve: String,
    pub overall_sentiment: Sentiment,
    pub additional_notes: Option<String>,
    pub form_data: Option<JsonValue>,
    pub form_id: Option<Uuid>,
}

/// Partial update; only `Some` fields are written
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateFeedback {
    pub strengths: Option<String>,
    pub areas_to_improve: Option<String>,
    pub overall_sentiment: Option<Sentiment>,
    pub additional_notes: Option<String>,
    pub form_data: Option<JsonValue>,
}

impl UpdateFeedback {
    /// Returns true if the patch carries no field at all
    pub fn is_empty(&self) -> bool {
        self.strengths.is_none()
            && self.areas_to_improve.is_none()
            && self.overall_sentiment.is_none()
            && self.additional_notes.is_none()
            && self.form_data.is_none()
    }
}

/// Result of an acknowledgement attempt
#[derive(Debug, Clone)]
pub enum Acknowledgement {
    /// The flag flipped; the record carries the new timestamp
    Recorded(Feedback),

    /// The record was acknowledged before; nothing changed
    AlreadyAcknowledged,

    /// No feedback with this id
    NotFound,

    /// The feedback is addressed to someone else
    NotRecipient,
}

impl Feedback {
    /// Creates feedback authored by `author`
    ///
    /// The caller must already have checked that the employee belongs to the
    /// author's team (see [`ManagerCap::require_team_member`]) and, when
    /// `form_id` is set, that the author owns the form.
    pub async fn create(
        pool: &PgPool,
        author: &ManagerCap,
        data: NewFeedback,
    ) -> Result<Self, sqlx::Error> {
        Self::insert(pool, data.employee_id, author.manager_id(), data).await
    }

    /// Records a form an employee filled in about themselves
    ///
    /// The feedback is addressed to the submitting employee, whatever
    /// `data.employee_id` says, and attributed to the form's manager.
    pub async fn create_self_submission(
        pool: &PgPool,
        submitter: &SelfSubmissionCap,
        data: NewFeedback,
    ) -> Result<Self, sqlx::Error> {
        Self::insert(pool, submitter.employee_id(), submitter.manager_id(), data).await
    }

    async fn insert(
        pool: &PgPool,
        employee_id: Uuid,
        manager_id: Uuid,
        data: NewFeedback,
    ) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO feedback (employee_id, manager_id, strengths, areas_to_improve,
                                  overall_sentiment, additional_notes, form_data, form_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {FEEDBACK_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Feedback>(&query)
            .bind(employee_id)
            .bind(manager_id)
            .bind(data.strengths)
            .bind(data.areas_to_improve)
            .bind(data.overall_sentiment)
            .bind(data.additional_notes)
            .bind(data.form_data)
            .bind(data.form_id)
            .fetch_one(pool)
            .await
    }

    /// Finds feedback by ID, without any visibility check
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {FEEDBACK_COLUMNS} FROM feedback WHERE id = $1");

        sqlx::query_as::<_, Feedback>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists feedback visible in `scope`, newest first
    ///
    /// `employee` narrows a manager's listing to a single team member; it is
    /// ignored for employee scopes, which are already narrowed to one person.
    pub async fn list(
        pool: &PgPool,
        scope: FeedbackScope,
        employee: Option<Uuid>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let (query, owner, employee) = match scope {
            FeedbackScope::AuthoredBy(manager_id) => (
                format!(
                    "SELECT {FEEDBACK_COLUMNS} FROM feedback \
                     WHERE manager_id = $1 AND ($2::uuid IS NULL OR employee_id = $2) \
                     ORDER BY created_at DESC, id DESC"
                ),
                manager_id,
                employee,
            ),
            FeedbackScope::AddressedTo(employee_id) => (
                format!(
                    "SELECT {FEEDBACK_COLUMNS} FROM feedback \
                     WHERE employee_id = $1 AND ($2::uuid IS NULL OR employee_id = $2) \
                     ORDER BY created_at DESC, id DESC"
                ),
                employee_id,
                None,
            ),
        };

        sqlx::query_as::<_, Feedback>(&query)
            .bind(owner)
            .bind(employee)
            .fetch_all(pool)
            .await
    }

    /// Lists the feedback captured through a form of `owner`, newest first
    ///
    /// Only feedback attributed to the owner counts as a submission.
    pub async fn list_by_form(
        pool: &PgPool,
        form_id: Uuid,
        owner: &ManagerCap,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {FEEDBACK_COLUMNS} FROM feedback WHERE form_id = $1 AND manager_id = $2 \
             ORDER BY created_at DESC, id DESC"
        );

        sqlx::query_as::<_, Feedback>(&query)
            .bind(form_id)
            .bind(owner.manager_id())
            .fetch_all(pool)
            .await
    }

    /// Merges `patch` into feedback written by `author`
    ///
    /// Fields left as `None` keep their stored value. `updated_at` is always
    /// refreshed when the update applies.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        author: &ManagerCap,
        patch: UpdateFeedback,
    ) -> Result<Outcome<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE feedback SET
                strengths = COALESCE($3, strengths),
                areas_to_improve = COALESCE($4, areas_to_improve),
                overall_sentiment = COALESCE($5, overall_sentiment),
                additional_notes = COALESCE($6, additional_notes),
                form_data = COALESCE($7, form_data),
                updated_at = NOW()
            WHERE id = $1 AND manager_id = $2
            RETURNING {FEEDBACK_COLUMNS}
            "#
        );

        let updated = sqlx::query_as::<_, Feedback>(&query)
            .bind(id)
            .bind(author.manager_id())
            .bind(patch.strengths)
            .bind(patch.areas_to_improve)
            .bind(patch.overall_sentiment)
            .bind(patch.additional_notes)
            .bind(patch.form_data)
            .fetch_optional(pool)
            .await?;

        match updated {
            Some(feedback) => Ok(Outcome::Applied(feedback)),
            None => Self::classify_miss(pool, id).await,
        }
    }

    /// Acknowledges feedback on behalf of its recipient
    ///
    /// The flag and timestamp are written by one conditional statement, so
    /// only the first of several concurrent calls is [`Acknowledgement::Recorded`].
    pub async fn acknowledge(
        pool: &PgPool,
        id: Uuid,
        recipient: &EmployeeCap,
    ) -> Result<Acknowledgement, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE feedback SET
                is_acknowledged = TRUE,
                acknowledged_at = NOW()
            WHERE id = $1 AND employee_id = $2 AND is_acknowledged = FALSE
            RETURNING {FEEDBACK_COLUMNS}
            "#
        );

        let acknowledged = sqlx::query_as::<_, Feedback>(&query)
            .bind(id)
            .bind(recipient.employee_id())
            .fetch_optional(pool)
            .await?;

        if let Some(feedback) = acknowledged {
            return Ok(Acknowledgement::Recorded(feedback));
        }

        Ok(match Self::find_by_id(pool, id).await? {
            None => Acknowledgement::NotFound,
            Some(existing) if existing.employee_id != recipient.employee_id() => {
                Acknowledgement::NotRecipient
            }
            Some(_) => Acknowledgement::AlreadyAcknowledged,
        })
    }

    /// Deletes feedback written by `author`
    pub async fn delete(
        pool: &PgPool,
        id: Uuid,
        author: &ManagerCap,
    ) -> Result<Outcome<()>, sqlx::Error> {
        let result = sqlx::query("DELETE FROM feedback WHERE id = $1 AND manager_id = $2")
            .bind(id)
            .bind(author.manager_id())
            .execute(pool)
            .await?;

        if result.rows_affected() > 0 {
            return Ok(Outcome::Applied(()));
        }

        Ok(Self::classify_miss(pool, id).await?.map(|_: Feedback| ()))
    }

    /// Tells a missing record from one owned by someone else
    async fn classify_miss(pool: &PgPool, id: Uuid) -> Result<Outcome<Self>, sqlx::Error> {
        Ok(match Self::find_by_id(pool, id).await? {
            None => Outcome::NotFound,
            Some(_) => Outcome::NotPermitted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentiment_accepts_legacy_spellings() {
        let parsed: Sentiment = serde_json::from_str("\"pos\"").unwrap();
        assert_eq!(parsed, Sentiment::Positive);

        let parsed: Sentiment = serde_json::from_str("\"neg\"").unwrap();
        assert_eq!(parsed, Sentiment::Negative);

        let parsed: Sentiment = serde_json::from_str("\"Neutral\"").unwrap();
        assert_eq!(parsed, Sentiment::Neutral);

        assert!(serde_json::from_str::<Sentiment>("\"great\"").is_err());
    }

    #[test]
    fn test_sentiment_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Sentiment::Negative).unwrap(),
            "\"negative\""
        );
    }

    #[test]
    fn test_sentiment_from_answer() {
        assert_eq!(Sentiment::from_answer("Positive"), Sentiment::Positive);
        assert_eq!(Sentiment::from_answer(" neg "), Sentiment::Negative);
        assert_eq!(Sentiment::from_answer(""), Sentiment::Neutral);
    }

    #[test]
    fn test_update_feedback_is_empty() {
        assert!(UpdateFeedback::default().is_empty());

        let patch = UpdateFeedback {
            overall_sentiment: Some(Sentiment::Positive),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
