/// Dashboard rollups
///
/// Dashboards are computed fresh on every request from the feedback, user
/// and form tables. The aggregation itself is pure (`build` functions) so it
/// can be tested without a database; the `load_*` functions fetch the inputs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::authorization::{EmployeeCap, FeedbackScope, ManagerCap};
use crate::models::feedback::{Feedback, Sentiment};
use crate::models::form::Form;
use crate::models::user::User;

/// Number of records in an employee's "recent feedback" list
pub const RECENT_FEEDBACK_LIMIT: usize = 5;

/// Window for [`GeneralStats::recent_feedback`]
pub const RECENT_WINDOW_DAYS: i32 = 30;

/// Count of feedback per sentiment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentBreakdown {
    pub positive: i64,
    pub neutral: i64,
    pub negative: i64,
}

impl SentimentBreakdown {
    pub fn record(&mut self, sentiment: Sentiment) {
        match sentiment {
            Sentiment::Positive => self.positive += 1,
            Sentiment::Neutral => self.neutral += 1,
            Sentiment::Negative => self.negative += 1,
        }
    }

    pub fn total(&self) -> i64 {
        self.positive + self.neutral + self.negative
    }

    fn tally<'a>(feedback: impl IntoIterator<Item = &'a Feedback>) -> Self {
        let mut breakdown = Self::default();
        for record in feedback {
            breakdown.record(record.overall_sentiment);
        }
        breakdown
    }
}

/// Per-team-member rollup on the manager dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMemberStats {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub employee_id: String,
    pub department: Option<String>,
    pub feedback_count: i64,
    pub latest_feedback: Option<DateTime<Utc>>,
    pub sentiment_breakdown: SentimentBreakdown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerDashboard {
    pub team_size: i64,
    pub total_feedback_given: i64,
    pub sentiment_trends: SentimentBreakdown,
    pub pending_acknowledgement: i64,
    pub team_members: Vec<TeamMemberStats>,
    pub active_forms_count: i64,
    pub form_submissions_count: i64,
}

impl ManagerDashboard {
    /// Aggregates a manager's team and the feedback they authored
    ///
    /// Team members keep the order of `team`.
    pub fn build(
        team: &[User],
        authored: &[Feedback],
        active_forms_count: i64,
        form_submissions_count: i64,
    ) -> Self {
        let team_members = team
            .iter()
            .map(|member| {
                let received: Vec<&Feedback> =
                    authored.iter().filter(|f| f.employee_id == member.id).collect();

                TeamMemberStats {
                    id: member.id,
                    full_name: member.full_name.clone(),
                    email: member.email.clone(),
                    employee_id: member.employee_id.clone(),
                    department: member.department.clone(),
                    feedback_count: received.len() as i64,
                    latest_feedback: received.iter().map(|f| f.created_at).max(),
                    sentiment_breakdown: SentimentBreakdown::tally(received.iter().copied()),
                }
            })
            .collect();

        Self {
            team_size: team.len() as i64,
            total_feedback_given: authored.len() as i64,
            sentiment_trends: SentimentBreakdown::tally(authored),
            pending_acknowledgement: authored.iter().filter(|f| !f.is_acknowledged).count() as i64,
            team_members,
            active_forms_count,
            form_submissions_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeDashboard {
    pub total_feedback_received: i64,
    pub unacknowledged_count: i64,
    pub sentiment_distribution: SentimentBreakdown,
    pub recent_feedback: Vec<Feedback>,
    pub available_forms_count: i64,
}

impl EmployeeDashboard {
    /// Aggregates the feedback an employee received
    ///
    /// `received` must be ordered newest first.
    pub fn build(received: Vec<Feedback>, available_forms_count: i64) -> Self {
        let total_feedback_received = received.len() as i64;
        let unacknowledged_count = received.iter().filter(|f| !f.is_acknowledged).count() as i64;
        let sentiment_distribution = SentimentBreakdown::tally(&received);

        let mut recent_feedback = received;
        recent_feedback.truncate(RECENT_FEEDBACK_LIMIT);

        Self {
            total_feedback_received,
            unacknowledged_count,
            sentiment_distribution,
            recent_feedback,
            available_forms_count,
        }
    }
}

/// Organisation-wide totals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralStats {
    pub total_users: i64,
    pub total_managers: i64,
    pub total_employees: i64,
    pub active_users: i64,
    pub total_feedback: i64,
    pub acknowledged_feedback: i64,
    pub pending_feedback: i64,
    pub sentiment_distribution: SentimentBreakdown,
    pub total_forms: i64,
    pub active_forms: i64,
    /// Feedback created in the last [`RECENT_WINDOW_DAYS`] days
    pub recent_feedback: i64,
}

#[derive(sqlx::FromRow)]
struct GeneralStatsRow {
    total_users: i64,
    total_managers: i64,
    total_employees: i64,
    active_users: i64,
    total_feedback: i64,
    acknowledged_feedback: i64,
    positive: i64,
    neutral: i64,
    negative: i64,
    total_forms: i64,
    active_forms: i64,
    recent_feedback: i64,
}

impl From<GeneralStatsRow> for GeneralStats {
    fn from(row: GeneralStatsRow) -> Self {
        Self {
            total_users: row.total_users,
            total_managers: row.total_managers,
            total_employees: row.total_employees,
            active_users: row.active_users,
            total_feedback: row.total_feedback,
            acknowledged_feedback: row.acknowledged_feedback,
            pending_feedback: row.total_feedback - row.acknowledged_feedback,
            sentiment_distribution: SentimentBreakdown {
                positive: row.positive,
                neutral: row.neutral,
                negative: row.negative,
            },
            total_forms: row.total_forms,
            active_forms: row.active_forms,
            recent_feedback: row.recent_feedback,
        }
    }
}

/// Loads the dashboard for the manager holding `cap`
pub async fn load_manager_dashboard(
    pool: &PgPool,
    cap: &ManagerCap,
) -> Result<ManagerDashboard, sqlx::Error> {
    let manager_id = cap.manager_id();

    let team = User::list_team_members(pool, manager_id).await?;
    let authored = Feedback::list(pool, FeedbackScope::AuthoredBy(manager_id), None).await?;
    let active_forms = Form::count_active_by_manager(pool, manager_id).await?;
    let submissions = Form::count_submissions_by_manager(pool, manager_id).await?;

    Ok(ManagerDashboard::build(&team, &authored, active_forms, submissions))
}

/// Loads the dashboard for the employee holding `cap`
pub async fn load_employee_dashboard(
    pool: &PgPool,
    cap: &EmployeeCap,
) -> Result<EmployeeDashboard, sqlx::Error> {
    let received =
        Feedback::list(pool, FeedbackScope::AddressedTo(cap.employee_id()), None).await?;

    let available_forms = match cap.manager_id() {
        Some(manager_id) => Form::count_active_by_manager(pool, manager_id).await?,
        None => 0,
    };

    Ok(EmployeeDashboard::build(received, available_forms))
}

/// Loads organisation-wide totals; restricted to managers
pub async fn load_general_stats(pool: &PgPool, _cap: &ManagerCap) -> Result<GeneralStats, sqlx::Error> {
    let row = sqlx::query_as::<_, GeneralStatsRow>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM users) AS total_users,
            (SELECT COUNT(*) FROM users WHERE role = 'manager') AS total_managers,
            (SELECT COUNT(*) FROM users WHERE role = 'employee') AS total_employees,
            (SELECT COUNT(*) FROM users WHERE is_active = TRUE) AS active_users,
            (SELECT COUNT(*) FROM feedback) AS total_feedback,
            (SELECT COUNT(*) FROM feedback WHERE is_acknowledged = TRUE) AS acknowledged_feedback,
            (SELECT COUNT(*) FROM feedback WHERE overall_sentiment = 'positive') AS positive,
            (SELECT COUNT(*) FROM feedback WHERE overall_sentiment = 'neutral') AS neutral,
            (SELECT COUNT(*) FROM feedback WHERE overall_sentiment = 'negative') AS negative,
            (SELECT COUNT(*) FROM forms) AS total_forms,
            (SELECT COUNT(*) FROM forms WHERE is_active = TRUE) AS active_forms,
            (SELECT COUNT(*) FROM feedback
              WHERE created_at >= NOW() - make_interval(days => $1)) AS recent_feedback
        "#,
    )
    .bind(RECENT_WINDOW_DAYS)
    .fetch_one(pool)
    .await?;

    Ok(row.into())
}
