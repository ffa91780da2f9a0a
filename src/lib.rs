//! AlumPro Back-Office API Library
//!
//! This crate provides the core functionality for the AlumPro order
//! management back office.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod notifications;
pub mod services;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::auth::SessionStore;
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::services::AppServices;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: AppConfig,
    pub services: AppServices,
    pub sessions: Arc<dyn SessionStore>,
}

// Common response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn success_with_message(data: T, message: String) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// Authenticated v1 API routes.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        // Orders
        .route(
            "/orders",
            get(handlers::orders::list_orders).post(handlers::orders::create_order),
        )
        .route("/orders/:id", get(handlers::orders::get_order))
        .route(
            "/orders/by-number/:order_number",
            get(handlers::orders::get_order_by_number),
        )
        .route(
            "/orders/:id/status",
            put(handlers::orders::update_order_status),
        )
        .route("/orders/:id/print", post(handlers::orders::mark_printed))
        .route("/orders/:id/lines", put(handlers::orders::replace_lines))
        // Users
        .route(
            "/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route("/users/:id/status", put(handlers::users::set_status))
        .route("/users/:id/role", put(handlers::users::change_role))
        .route(
            "/users/:id/reset-password",
            post(handlers::users::reset_password),
        )
        // Customers
        .route(
            "/customers",
            get(handlers::customers::list_customers).post(handlers::customers::create_customer),
        )
        .route("/customers/:id", get(handlers::customers::get_customer))
        .route(
            "/customers/:id/send-reminder",
            post(handlers::customers::send_reminder),
        )
        // Activity log
        .route("/activity-logs", get(handlers::activity_logs::list_activity))
        // Notification templates
        .route(
            "/templates",
            get(handlers::templates::list_templates).post(handlers::templates::save_template),
        )
        .route(
            "/templates/:id",
            delete(handlers::templates::delete_template),
        )
        .route("/templates/:id/test", post(handlers::templates::test_message))
}

/// Builds the full application router: health endpoint, authenticated v1
/// API, and the shared tower layers.
pub fn app_router(state: AppState) -> Router {
    let cors = if state.config.is_development() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/", get(|| async { "alumpro-api up" }))
        .route("/health", get(handlers::health::health))
        .nest(
            "/api/v1",
            api_v1_routes().layer(middleware::from_fn_with_state(
                state.clone(),
                auth::auth_middleware,
            )),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}
