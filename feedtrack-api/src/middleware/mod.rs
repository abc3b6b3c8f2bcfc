/// Middleware for the API server
///
/// Authentication middleware lives in `feedtrack_shared::auth::middleware`.

pub mod security;
