//! Route definitions for the Reorder Portal

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
///
/// The state is threaded in so the auth middleware validates tokens against
/// the configured JWT secret rather than re-reading the environment.
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public login + protected session lookup)
        .nest("/auth", auth_routes(state.clone()))
        // Protected routes - the reorder dashboard
        .nest("/reorder", reorder_routes(state.clone()))
        // Protected routes - CSV imports (admin gate enforced per handler)
        .nest("/imports", import_routes(state))
}

/// Authentication routes
fn auth_routes(state: AppState) -> Router<AppState> {
    Router::new().route("/login", post(handlers::login)).merge(
        Router::new()
            .route("/me", get(handlers::me))
            .route_layer(middleware::from_fn_with_state(state, auth_middleware)),
    )
}

/// Reorder dashboard routes (protected)
fn reorder_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::get_reorder_view))
        .route("/meta", get(handlers::get_report_meta))
        .route("/export", get(handlers::export_reorder_view))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// CSV import routes (protected, admin only)
fn import_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/stock", post(handlers::import_stock))
        .route("/sales", post(handlers::import_sales))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
