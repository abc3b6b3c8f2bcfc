/// Feedback endpoints
///
/// # Endpoints
///
/// - `POST /api/feedback` - Manager writes feedback for a team member
/// - `GET /api/feedback?employee_id=` - Authored (manager) or received (employee)
/// - `GET /api/feedback/:id` - Author or recipient only
/// - `PUT /api/feedback/:id` - Author only; partial update
/// - `DELETE /api/feedback/:id` - Author only
/// - `POST /api/feedback/:id/acknowledge` - Recipient only, once

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiPath, ApiQuery},
    routes::MessageResponse,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use feedtrack_shared::{
    auth::middleware::AuthContext,
    models::{
        feedback::{Acknowledgement, Feedback, NewFeedback, Sentiment, UpdateFeedback},
        form::Form,
        user::{User, UserRole},
        Outcome,
    },
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;
use validator::Validate;

/// Form answers must be a JSON object keyed by field id
fn check_form_data(value: Option<&JsonValue>) -> ApiResult<()> {
    match value {
        Some(value) if !value.is_object() => Err(ApiError::invalid_field(
            "form_data",
            "form_data must be a JSON object",
        )),
        _ => Ok(()),
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateFeedbackRequest {
    pub employee_id: Uuid,

    #[validate(length(min = 1, message = "Strengths are required"))]
    pub strengths: String,

    #[validate(length(min = 1, message = "Areas to improve are required"))]
    pub areas_to_improve: String,

    pub overall_sentiment: Sentiment,

    pub additional_notes: Option<String>,

    pub form_data: Option<JsonValue>,

    pub form_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateFeedbackRequest {
    #[validate(length(min = 1, message = "Strengths must not be empty"))]
    pub strengths: Option<String>,

    #[validate(length(min = 1, message = "Areas to improve must not be empty"))]
    pub areas_to_improve: Option<String>,

    pub overall_sentiment: Option<Sentiment>,

    pub additional_notes: Option<String>,

    pub form_data: Option<JsonValue>,
}

impl From<UpdateFeedbackRequest> for UpdateFeedback {
    fn from(req: UpdateFeedbackRequest) -> Self {
        Self {
            strengths: req.strengths,
            areas_to_improve: req.areas_to_improve,
            overall_sentiment: req.overall_sentiment,
            additional_notes: req.additional_notes,
            form_data: req.form_data,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListFeedbackQuery {
    /// Narrow a manager's listing to one team member
    pub employee_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct AcknowledgeResponse {
    pub message: String,
    pub feedback: Feedback,
}

/// Loads `id` as an employee of the team behind `cap`
///
/// An unknown id, or one that is not an employee, is reported as not found;
/// an employee of another team as forbidden.
pub(crate) async fn load_team_member(
    state: &AppState,
    cap: &feedtrack_shared::auth::authorization::ManagerCap,
    id: Uuid,
) -> ApiResult<User> {
    let employee = User::find_by_id(&state.db, id)
        .await?
        .filter(|user| user.role == UserRole::Employee)
        .ok_or_else(|| ApiError::NotFound("Employee not found".to_string()))?;

    cap.require_team_member(&employee)?;
    Ok(employee)
}

/// Create feedback for a team member
///
/// # Errors
///
/// - `403`: Caller is not a manager, the employee is in another team, or
///   `form_id` names another manager's form
/// - `404`: No such employee or form
/// - `422`: Empty text fields or non-object `form_data`
pub async fn create_feedback(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateFeedbackRequest>,
) -> ApiResult<(StatusCode, Json<Feedback>)> {
    let cap = auth.caller.require_manager()?;
    req.validate()?;
    check_form_data(req.form_data.as_ref())?;

    if let Some(form_id) = req.form_id {
        let form = Form::find_by_id(&state.db, form_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Form not found".to_string()))?;
        auth.caller.require_form_owner(&form)?;
    }

    let employee = load_team_member(&state, &cap, req.employee_id).await?;

    let feedback = Feedback::create(
        &state.db,
        &cap,
        NewFeedback {
            employee_id: employee.id,
            strengths: req.strengths,
            areas_to_improve: req.areas_to_improve,
            overall_sentiment: req.overall_sentiment,
            additional_notes: req.additional_notes,
            form_data: req.form_data,
            form_id: req.form_id,
        },
    )
    .await?;

    tracing::info!(
        feedback_id = %feedback.id,
        manager_id = %feedback.manager_id,
        employee_id = %feedback.employee_id,
        "Feedback created"
    );

    Ok((StatusCode::CREATED, Json(feedback)))
}

/// List feedback visible to the caller, newest first
///
/// Managers may pass `employee_id` to narrow to one team member; an id
/// outside the team answers 404. Employees always get their own feedback.
pub async fn list_feedback(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiQuery(query): ApiQuery<ListFeedbackQuery>,
) -> ApiResult<Json<Vec<Feedback>>> {
    let filter = match (auth.caller.require_manager(), query.employee_id) {
        (Ok(cap), Some(employee_id)) => {
            let in_team = User::find_by_id(&state.db, employee_id)
                .await?
                .is_some_and(|user| user.reports_to(cap.manager_id()));
            if !in_team {
                return Err(ApiError::NotFound("Employee not found in your team".to_string()));
            }
            Some(employee_id)
        }
        _ => None,
    };

    let feedback = Feedback::list(&state.db, auth.caller.feedback_scope(), filter).await?;
    Ok(Json(feedback))
}

/// Fetch a single feedback record
pub async fn get_feedback(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Feedback>> {
    let feedback = Feedback::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Feedback not found".to_string()))?;

    auth.caller.can_read_feedback(&feedback)?;

    Ok(Json(feedback))
}

/// Merge the provided fields into feedback the caller wrote
pub async fn update_feedback(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateFeedbackRequest>,
) -> ApiResult<Json<Feedback>> {
    let cap = auth.caller.require_manager()?;
    req.validate()?;
    check_form_data(req.form_data.as_ref())?;

    match Feedback::update(&state.db, id, &cap, req.into()).await? {
        Outcome::Applied(feedback) => {
            tracing::info!(feedback_id = %feedback.id, "Feedback updated");
            Ok(Json(feedback))
        }
        Outcome::NotFound => Err(ApiError::NotFound("Feedback not found".to_string())),
        Outcome::NotPermitted => Err(ApiError::Forbidden(
            "You can only update feedback you've given".to_string(),
        )),
    }
}

/// Acknowledge feedback addressed to the caller
///
/// # Errors
///
/// - `403`: Caller is not an employee, or not the recipient
/// - `404`: No such feedback
/// - `409`: Already acknowledged
pub async fn acknowledge_feedback(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<AcknowledgeResponse>> {
    let cap = auth.caller.require_employee()?;

    match Feedback::acknowledge(&state.db, id, &cap).await? {
        Acknowledgement::Recorded(feedback) => {
            tracing::info!(feedback_id = %feedback.id, employee_id = %cap.employee_id(), "Feedback acknowledged");
            Ok(Json(AcknowledgeResponse {
                message: "Feedback acknowledged successfully".to_string(),
                feedback,
            }))
        }
        Acknowledgement::AlreadyAcknowledged => {
            Err(ApiError::Conflict("Feedback already acknowledged".to_string()))
        }
        Acknowledgement::NotFound => Err(ApiError::NotFound("Feedback not found".to_string())),
        Acknowledgement::NotRecipient => Err(ApiError::Forbidden(
            "You can only acknowledge your own feedback".to_string(),
        )),
    }
}

/// Delete feedback the caller wrote
pub async fn delete_feedback(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let cap = auth.caller.require_manager()?;

    match Feedback::delete(&state.db, id, &cap).await? {
        Outcome::Applied(()) => {
            tracing::info!(feedback_id = %id, "Feedback deleted");
            Ok(Json(MessageResponse::new("Feedback deleted successfully")))
        }
        Outcome::NotFound => Err(ApiError::NotFound("Feedback not found".to_string())),
        Outcome::NotPermitted => Err(ApiError::Forbidden(
            "You can only delete feedback you've given".to_string(),
        )),
    }
}
