//! HTTP API Layer
//!
//! This crate provides the REST API for the invoice traceability system using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Request handlers for invoice actions and the worklist
//! - **Middleware**: Authentication, audit logging, tracing
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Consistent error responses mapped from the domain taxonomy
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::create_router;
//!
//! let app = create_router(pool, config);
//! axum::serve(listener, app).await?;
//! ```

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use core_kernel::{BusinessCalendar, DeadlineEngine};
use domain_invoicing::InvoiceService;
use infra_db::{InvoiceRepository, WorklistCache};

use crate::config::ApiConfig;
use crate::handlers::{health, invoices};
use crate::middleware::{audit_middleware, auth_middleware};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: ApiConfig,
    pub service: Arc<InvoiceService<InvoiceRepository>>,
    pub cache: Arc<WorklistCache>,
}

/// Creates the main API router
///
/// # Arguments
///
/// * `pool` - Database connection pool
/// * `config` - API configuration
/// * `calendar` - Business calendar with the configured holiday years
///
/// # Returns
///
/// Configured Axum router with all routes and middleware
pub fn create_router(pool: PgPool, config: ApiConfig, calendar: BusinessCalendar) -> Router {
    let repository = InvoiceRepository::new(pool.clone());
    let service = Arc::new(InvoiceService::new(
        repository,
        DeadlineEngine::new(calendar),
    ));
    let state = AppState {
        pool,
        config,
        service,
        cache: Arc::new(WorklistCache::default()),
    };

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    // Invoice routes
    let invoice_routes = Router::new()
        .route("/", post(invoices::create_invoice))
        .route("/", get(invoices::list_invoices))
        .route("/:id", get(invoices::get_invoice))
        .route("/:id", put(invoices::update_invoice))
        .route("/:id", delete(invoices::confirm_deletion))
        .route("/:id/audit", put(invoices::review_invoice))
        .route("/:id/correction", post(invoices::correct_invoice))
        .route("/:id/filing", put(invoices::set_filing_delivery))
        .route("/:id/reissue", post(invoices::reissue_invoice))
        .route("/:id/deletion", post(invoices::request_deletion))
        .route("/:id/deletion", delete(invoices::cancel_deletion));

    // Bulk import and statistics
    let import_routes = Router::new().route("/", post(invoices::import_invoices));
    let statistics_routes = Router::new().route("/", get(invoices::statistics));

    // Protected API routes
    let api_routes = Router::new()
        .nest("/invoices", invoice_routes)
        .nest("/imports", import_routes)
        .nest("/statistics", statistics_routes)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            audit_middleware,
        ))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Combine all routes
    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
