//! # Tasklane API Server Library
//!
//! HTTP surface of Tasklane: users, projects, sections, tasks, tags and
//! comments, with every project-scoped route behind a membership guard.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Access guards and security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
