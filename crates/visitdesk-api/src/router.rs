//! Route definitions for the VisitDesk HTTP API.
//!
//! All routes are organized by domain and mounted under `/api`.
//! Authorization is checked by the services, so routes carry no role
//! guards of their own.

use axum::Router;
use axum::routing::{get, post, put};

use crate::handlers;
use crate::state::AppState;

/// Build the `/api` router. Layers are added by [`crate::app::build_app`].
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(auth_routes())
        .merge(user_routes())
        .merge(visitor_routes())
        .merge(evacuation_routes())
        .merge(report_routes())
        .merge(export_routes())
        .merge(admin_routes())
        .merge(health_routes());

    Router::new().nest("/api", api_routes).with_state(state)
}

/// Login, refresh, me, navigation
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/refresh", post(handlers::auth::refresh))
        .route("/auth/me", get(handlers::auth::me))
        .route("/auth/navigation", get(handlers::auth::navigation))
        .route("/auth/navigation/route", get(handlers::auth::route))
}

/// User self-service endpoints
fn user_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users/me",
            get(handlers::user::get_profile).put(handlers::user::update_profile),
        )
        .route("/users/me/password", put(handlers::user::change_password))
}

/// Check-in, check-out, history
fn visitor_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/visitors",
            get(handlers::visitor::search).post(handlers::visitor::check_in),
        )
        .route("/visitors/active", get(handlers::visitor::active))
        .route(
            "/visitors/checkout/scan",
            post(handlers::visitor::check_out_by_scan),
        )
        .route(
            "/visitors/{id}",
            get(handlers::visitor::get)
                .put(handlers::visitor::update)
                .delete(handlers::visitor::delete),
        )
        .route("/visitors/{id}/checkout", post(handlers::visitor::check_out))
}

fn evacuation_routes() -> Router<AppState> {
    Router::new()
        .route("/evacuation", post(handlers::evacuation::evacuate))
        .route("/evacuation/roster", get(handlers::evacuation::roster))
}

fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/reports/dashboard", get(handlers::report::dashboard))
        .route("/reports/summary", get(handlers::report::summary))
}

fn export_routes() -> Router<AppState> {
    Router::new()
        .route("/export/visitors", get(handlers::export::export_visitors))
        .route("/export/audit", get(handlers::export::export_audit))
}

/// Users, audit log, backups
fn admin_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/admin/users",
            get(handlers::admin::users::list_users).post(handlers::admin::users::create_user),
        )
        .route(
            "/admin/users/{id}",
            get(handlers::admin::users::get_user)
                .put(handlers::admin::users::update_user)
                .delete(handlers::admin::users::delete_user),
        )
        .route(
            "/admin/users/{id}/role",
            put(handlers::admin::users::change_role),
        )
        .route(
            "/admin/users/{id}/status",
            put(handlers::admin::users::change_status),
        )
        .route(
            "/admin/users/{id}/password",
            put(handlers::admin::users::reset_password),
        )
        .route("/admin/audit", get(handlers::admin::audit::search_audit))
        .route(
            "/admin/audit/export",
            get(handlers::export::export_audit),
        )
        .route("/admin/backup", post(handlers::admin::backup::run_backup))
        .route(
            "/admin/backup/status",
            get(handlers::admin::backup::status),
        )
        .route(
            "/admin/backup/drive",
            axum::routing::delete(handlers::admin::backup::drive_disconnect),
        )
        .route(
            "/admin/backup/drive/authorize",
            get(handlers::admin::backup::drive_authorize),
        )
        .route(
            "/admin/backup/drive/callback",
            get(handlers::admin::backup::drive_callback),
        )
}

fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
