/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Root banner and health check
/// - `auth`: Registration, login, token refresh and team lookups
/// - `feedback`: Feedback CRUD and acknowledgement
/// - `forms`: Custom form CRUD, submission and submission listing
/// - `dashboard`: Manager, employee and organisation rollups

pub mod auth;
pub mod dashboard;
pub mod feedback;
pub mod forms;
pub mod health;

use serde::{Deserialize, Serialize};

/// Plain `{ "message": ... }` body for operations with nothing else to return
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
