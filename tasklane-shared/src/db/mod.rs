/// Database layer for Tasklane
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool with an up-front health check
/// - `migrations`: Embedded schema migrations
///
/// Queries live with the models in `crate::models`; the `crate::store`
/// module is what the rest of the system talks to.

pub mod migrations;
pub mod pool;
