/// Custom form endpoints
///
/// # Endpoints
///
/// - `POST /api/forms` - Manager defines a form
/// - `GET /api/forms` - Own forms (manager) or the manager's active forms (employee)
/// - `GET /api/forms/active/list` - Active forms only
/// - `GET /api/forms/:id` - Single form, subject to visibility
/// - `PUT /api/forms/:id` - Owner only; partial update
/// - `DELETE /api/forms/:id` - Owner only
/// - `POST /api/forms/:id/submit` - Owner fills the form in for a team member,
///   or a team member fills it in about themselves
/// - `GET /api/forms/:id/submissions` - Feedback captured through the form

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    extract::{ApiJson, ApiPath},
    routes::{feedback::load_team_member, MessageResponse},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use feedtrack_shared::{
    auth::{
        authorization::{FormSubmitter, FormVisibility},
        middleware::AuthContext,
    },
    models::{
        feedback::{Feedback, NewFeedback, Sentiment},
        form::{
            missing_required_answers, normalize_fields, normalize_title, Form, FormField,
            FormSummary, NewForm, UpdateForm,
        },
        Outcome,
    },
};
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;

/// Placeholder text for required feedback columns a form did not answer
const DEFAULT_SUBMISSION_TEXT: &str = "Submitted via custom form";

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct CreateFormRequest {
    pub title: String,
    pub description: Option<String>,

    #[serde(default)]
    pub fields: Vec<FormField>,

    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateFormRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub fields: Option<Vec<FormField>>,
    pub is_active: Option<bool>,
}

impl UpdateFormRequest {
    /// Validates the provided parts and turns them into a store patch
    fn into_patch(self) -> ApiResult<UpdateForm> {
        Ok(UpdateForm {
            title: self.title.as_deref().map(normalize_title).transpose()?,
            description: self.description,
            fields: self.fields.map(normalize_fields).transpose()?,
            is_active: self.is_active,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmitFormRequest {
    /// Answers keyed by field id
    #[serde(default)]
    pub form_data: Map<String, JsonValue>,

    pub target_employee_id: Option<Uuid>,
}

/// Non-blank string answer for `key`
fn answer_text(answers: &Map<String, JsonValue>, key: &str) -> Option<String> {
    answers
        .get(key)
        .and_then(JsonValue::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Maps a form's answers onto a feedback record for `employee_id`
///
/// The answers are kept whole as the record's `form_data`.
fn feedback_from_answers(form: &Form, employee_id: Uuid, answers: Map<String, JsonValue>) -> NewFeedback {
    let strengths = answer_text(&answers, "strengths")
        .unwrap_or_else(|| DEFAULT_SUBMISSION_TEXT.to_string());
    let areas_to_improve = answer_text(&answers, "areas_to_improve")
        .unwrap_or_else(|| DEFAULT_SUBMISSION_TEXT.to_string());
    let overall_sentiment = answer_text(&answers, "overall_sentiment")
        .map(|answer| Sentiment::from_answer(&answer))
        .unwrap_or(Sentiment::Neutral);
    let additional_notes = answer_text(&answers, "additional_notes")
        .unwrap_or_else(|| format!("Submitted using form: {}", form.title));

    NewFeedback {
        employee_id,
        strengths,
        areas_to_improve,
        overall_sentiment,
        additional_notes: Some(additional_notes),
        form_data: Some(JsonValue::Object(answers)),
        form_id: Some(form.id),
    }
}

async fn load_form(state: &AppState, id: Uuid) -> ApiResult<Form> {
    Form::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Form not found".to_string()))
}

/// Create a form
///
/// Field ids missing from the request are derived from the labels.
///
/// # Errors
///
/// - `403`: Caller is not a manager
/// - `422`: Blank title, unnamed or duplicate fields, choice field without options
pub async fn create_form(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateFormRequest>,
) -> ApiResult<(StatusCode, Json<Form>)> {
    let cap = auth.caller.require_manager()?;

    let title = normalize_title(&req.title)?;
    let fields = normalize_fields(req.fields)?;

    let form = Form::create(
        &state.db,
        &cap,
        NewForm {
            title,
            description: req.description,
            fields,
            is_active: req.is_active,
        },
    )
    .await?;

    tracing::info!(
        form_id = %form.id,
        manager_id = %form.manager_id,
        fields = form.fields.len(),
        "Form created"
    );

    Ok((StatusCode::CREATED, Json(form)))
}

async fn list_visible_forms(
    state: &AppState,
    auth: &AuthContext,
    active_only: bool,
) -> ApiResult<Vec<FormSummary>> {
    let manager_id = auth
        .caller
        .form_scope()
        .ok_or_else(|| ApiError::validation("You are not assigned to a manager"))?;

    // Employees only ever see active forms
    let active_only = active_only || auth.caller.require_manager().is_err();

    Ok(Form::list_by_manager(&state.db, manager_id, active_only).await?)
}

/// List forms visible to the caller, newest first
///
/// Each entry carries `submission_count`.
pub async fn list_forms(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<FormSummary>>> {
    Ok(Json(list_visible_forms(&state, &auth, false).await?))
}

pub async fn list_active_forms(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<FormSummary>>> {
    Ok(Json(list_visible_forms(&state, &auth, true).await?))
}

/// Fetch a form
///
/// An inactive form of an employee's manager answers 404; a form of any
/// other manager answers 403.
pub async fn get_form(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Form>> {
    let form = load_form(&state, id).await?;

    match auth.caller.form_visibility(&form) {
        FormVisibility::Visible => Ok(Json(form)),
        FormVisibility::Hidden => Err(ApiError::NotFound("Form not found".to_string())),
        FormVisibility::Denied => Err(ApiError::Forbidden(
            "Not authorized to view this form".to_string(),
        )),
    }
}

pub async fn update_form(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateFormRequest>,
) -> ApiResult<Json<Form>> {
    let cap = auth.caller.require_manager()?;
    let patch = req.into_patch()?;

    match Form::update(&state.db, id, &cap, patch).await? {
        Outcome::Applied(form) => {
            tracing::info!(form_id = %form.id, is_active = form.is_active, "Form updated");
            Ok(Json(form))
        }
        Outcome::NotFound => Err(ApiError::NotFound("Form not found".to_string())),
        Outcome::NotPermitted => Err(ApiError::Forbidden(
            "Not authorized to update this form".to_string(),
        )),
    }
}

pub async fn delete_form(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    let cap = auth.caller.require_manager()?;

    match Form::delete(&state.db, id, &cap).await? {
        Outcome::Applied(()) => {
            tracing::info!(form_id = %id, "Form deleted");
            Ok(Json(MessageResponse::new("Form deleted successfully")))
        }
        Outcome::NotFound => Err(ApiError::NotFound("Form not found".to_string())),
        Outcome::NotPermitted => Err(ApiError::Forbidden(
            "Not authorized to delete this form".to_string(),
        )),
    }
}

/// Fill in a form for a team member, recording it as feedback
///
/// # Errors
///
/// - `403`: Caller does not own the form, or the target is in another team
/// - `404`: No such form or employee
/// - `422`: Inactive form, missing target, or unanswered required fields
pub async fn submit_form(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<SubmitFormRequest>,
) -> ApiResult<(StatusCode, Json<Feedback>)> {
    let form = load_form(&state, id).await?;
    let submitter = auth.caller.form_submitter(&form)?;

    if !form.is_active {
        return Err(ApiError::validation("Form is not active"));
    }

    let missing = missing_required_answers(&form.fields, &req.form_data);
    if !missing.is_empty() {
        return Err(ApiError::ValidationError {
            message: "Required fields are missing".to_string(),
            details: missing
                .into_iter()
                .map(|field| ValidationErrorDetail {
                    message: format!("Field '{field}' is required"),
                    field,
                })
                .collect(),
        });
    }

    let feedback = match submitter {
        FormSubmitter::Owner(cap) => {
            let target = req.target_employee_id.ok_or_else(|| {
                ApiError::invalid_field("target_employee_id", "Target employee ID is required")
            })?;
            let employee = load_team_member(&state, &cap, target).await?;
            Feedback::create(
                &state.db,
                &cap,
                feedback_from_answers(&form, employee.id, req.form_data),
            )
            .await?
        }
        // target_employee_id is ignored: a team member only reports on themselves
        FormSubmitter::TeamMember(cap) => {
            Feedback::create_self_submission(
                &state.db,
                &cap,
                feedback_from_answers(&form, cap.employee_id(), req.form_data),
            )
            .await?
        }
    };

    tracing::info!(
        form_id = %form.id,
        feedback_id = %feedback.id,
        employee_id = %feedback.employee_id,
        submitted_by = %auth.caller.user_id(),
        "Form submitted"
    );

    Ok((StatusCode::CREATED, Json(feedback)))
}

/// Feedback recorded through a form, newest first
pub async fn list_submissions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<Feedback>>> {
    let form = load_form(&state, id).await?;
    let owner = auth.caller.require_form_owner(&form)?;

    Ok(Json(Feedback::list_by_form(&state.db, form.id, &owner).await?))
}
