/// Dashboard endpoints
///
/// Every rollup is computed from the database on each request.
///
/// # Endpoints
///
/// - `GET /api/dashboard/manager` - Team rollup for the calling manager
/// - `GET /api/dashboard/employee` - Received-feedback rollup for the caller
/// - `GET /api/dashboard/stats` - Organisation totals, managers only

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Extension, Json};
use feedtrack_shared::{
    auth::middleware::AuthContext,
    dashboard::{self, EmployeeDashboard, GeneralStats, ManagerDashboard},
};

pub async fn manager_dashboard(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<ManagerDashboard>> {
    let cap = auth.caller.require_manager()?;
    let view = dashboard::load_manager_dashboard(&state.db, &cap).await?;
    Ok(Json(view))
}

pub async fn employee_dashboard(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<EmployeeDashboard>> {
    let cap = auth.caller.require_employee()?;
    let view = dashboard::load_employee_dashboard(&state.db, &cap).await?;
    Ok(Json(view))
}

/// Organisation-wide totals
///
/// # Errors
///
/// - `403`: Caller is not a manager
pub async fn general_stats(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<GeneralStats>> {
    let cap = auth.caller.require_manager()?;
    let stats = dashboard::load_general_stats(&state.db, &cap).await?;

    tracing::debug!(
        total_users = stats.total_users,
        total_feedback = stats.total_feedback,
        "General stats computed"
    );

    Ok(Json(stats))
}
