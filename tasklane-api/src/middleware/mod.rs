/// Middleware for the API server
///
/// - `access`: Membership guards for project, section and task routes
/// - `security`: Security response headers

pub mod access;
pub mod security;
