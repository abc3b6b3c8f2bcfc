/// Database layer
///
/// - `pool`: PostgreSQL connection pool with a health check
/// - `migrations`: Embedded schema migrations
///
/// Queries live next to their types in the crate's `models` module.

pub mod migrations;
pub mod pool;
