//! Clinic API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Routes are nested under `/api/`.
//!
//! Middleware stack (outermost → innermost):
//! CORS → request tracing → Auth validator → Access logger

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the clinic API router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn clinic_api_router(core: Arc<CoreState>) -> Router {
    build_router(ApiContext::new(core))
}

fn build_router(ctx: ApiContext) -> Router {
    // Protected routes: bearer claims required.
    //
    // Layers are applied from bottom (innermost) to top (outermost):
    //   Extension (outermost) → Auth → Access log (innermost) → Handler
    //
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let protected = Router::new()
        .route("/auth/me", get(endpoints::auth::me))
        .route(
            "/roles/:id/privilege",
            get(endpoints::roles::get_privileges).post(endpoints::roles::replace_privileges),
        )
        .route("/menus/user", get(endpoints::menus::user_menus))
        .route("/menus/check-access", get(endpoints::menus::check_access))
        .route("/medical/visits/:id", get(endpoints::medical::visit_detail))
        .route(
            "/medical/visit-medications",
            post(endpoints::medical::sync_medications),
        )
        .route(
            "/medical/visit-medications/:visit_id",
            get(endpoints::medical::list_medications),
        )
        .route(
            "/medical/visit-procedures",
            post(endpoints::medical::sync_procedures),
        )
        .route(
            "/medical/visit-procedures/:visit_id",
            get(endpoints::medical::list_procedures),
        )
        .route(
            "/medical/visit-diagnoses",
            post(endpoints::medical::sync_diagnoses),
        )
        .route(
            "/medical/visit-diagnoses/:visit_id",
            get(endpoints::medical::list_diagnoses),
        )
        .route("/medical/editvitals", post(endpoints::medical::edit_vitals))
        .route("/rm/register", post(endpoints::rm::register))
        .route("/rm/appointments", post(endpoints::rm::create_appointment))
        .route(
            "/rm/appointments/:code/check-in",
            post(endpoints::rm::check_in),
        )
        .route(
            "/rm/appointments/:code/reactivate",
            post(endpoints::rm::reactivate),
        )
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        // Extension must be outermost so middleware can extract ApiContext
        .layer(axum::Extension(ctx.clone()));

    // Unprotected routes
    let unprotected = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/auth/login", post(endpoints::auth::login))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::Extension(ctx));

    Router::new()
        .nest("/api", protected)
        .nest("/api", unprotected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
