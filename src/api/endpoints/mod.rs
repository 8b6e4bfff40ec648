//! API endpoint handlers.
//!
//! One module per route group under `/api`. Handlers check a connection out
//! of the pool and delegate to the domain modules.

pub mod auth;
pub mod health;
pub mod medical;
pub mod menus;
pub mod rm;
pub mod roles;
