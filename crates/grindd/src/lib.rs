//! Grindmode daemon library - exposes modules for testing.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod server;
