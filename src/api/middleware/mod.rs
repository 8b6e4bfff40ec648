//! API middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. Auth validator: bearer claims, injects `AuthContext`
//! 2. Access logger: runs after auth, has user and role ids

pub mod audit;
pub mod auth;
