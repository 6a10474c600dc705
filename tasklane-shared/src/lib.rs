//! # Tasklane Shared Library
//!
//! Domain types, persistence and access control shared by the Tasklane API
//! server and its tests.
//!
//! ## Module Organization
//!
//! - `models`: Users, projects, sections, tasks, tags, comments and their SQL
//! - `store`: The `EntityStore` / `EntityRepository` traits with PostgreSQL
//!   and in-memory implementations
//! - `permission`: Membership-based access checks over the project hierarchy
//! - `auth`: Password hashing, JWTs and request authentication
//! - `db`: Connection pool and migrations

pub mod auth;
pub mod db;
pub mod models;
pub mod permission;
pub mod store;

/// Current version of the Tasklane shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
