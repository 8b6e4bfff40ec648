//! HTTP API for the clinic backend.
//!
//! Routes are nested under `/api/`. Login and health are public; every
//! other route requires a bearer claims token.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use router::clinic_api_router;
pub use server::{start_api_server_on, ApiServer, ApiSession};
pub use types::{ApiContext, ApiResponse, AuthContext};
