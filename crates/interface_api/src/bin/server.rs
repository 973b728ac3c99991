//! Invoice Traceability - API Server Binary
//!
//! This binary starts the HTTP API server for the invoice traceability system.
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin facturas-api
//!
//! # Run with environment variables
//! API_HOST=0.0.0.0 API_PORT=8080 DATABASE_URL=postgres://... cargo run --bin facturas-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_JWT_SECRET` - JWT signing secret (required in production)
//! * `API_JWT_EXPIRATION_SECS` - JWT token expiration in seconds (default: 3600)
//! * `API_DATABASE_URL` - PostgreSQL connection string
//! * `API_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)
//! * `HOLIDAY_CALENDAR` - Path to a JSON file mapping years to holiday dates

use std::net::SocketAddr;

use chrono::{Datelike, Utc};
use interface_api::{config::ApiConfig, create_router};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use core_kernel::BusinessCalendar;
use infra_db::InvoiceRepository;

/// Main entry point for the API server.
///
/// Initializes logging, loads configuration, establishes database connection,
/// bootstraps the schema, and starts the HTTP server.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    // Load configuration from environment
    let config = load_config()?;

    // Initialize tracing/logging
    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        "Starting Invoice Traceability API Server"
    );

    // Load the business calendar and warn about unconfigured years
    let calendar = load_calendar()?;
    let current_year = Utc::now().date_naive().year();
    if !calendar.is_year_configured(current_year) {
        tracing::warn!(
            year = current_year,
            "No holiday list configured for the current year; treating it as holiday-free"
        );
    }

    // Create database connection pool
    let pool = create_database_pool(&config.database_url).await?;

    // Bootstrap the schema
    InvoiceRepository::new(pool.clone()).init_schema().await?;
    tracing::info!("Database ready");

    // Create the API router
    let app = create_router(pool, config.clone(), calendar);

    // Parse server address
    let addr: SocketAddr = config.server_addr().parse()?;

    tracing::info!(%addr, "Server listening");

    // Create TCP listener and serve
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Loads API configuration from environment variables.
///
/// Falls back to default values if environment variables are not set.
fn load_config() -> Result<ApiConfig, Box<dyn std::error::Error>> {
    // Try to load from environment with API_ prefix
    let config = ApiConfig::from_env().unwrap_or_else(|_| {
        // Fall back to individual env vars or defaults
        ApiConfig {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            jwt_secret: std::env::var("API_JWT_SECRET")
                .unwrap_or_else(|_| "dev-secret-change-in-production".to_string()),
            jwt_expiration_secs: std::env::var("API_JWT_EXPIRATION_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3600),
            database_url: std::env::var("DATABASE_URL")
                .or_else(|_| std::env::var("API_DATABASE_URL"))
                .unwrap_or_else(|_| "postgres://localhost/facturas".to_string()),
            log_level: std::env::var("API_LOG_LEVEL")
                .or_else(|_| std::env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),
        }
    });

    Ok(config)
}

/// Loads the business calendar from `HOLIDAY_CALENDAR`, if set.
///
/// The file is a JSON map from year to a list of `YYYY-MM-DD` dates.
/// Without the variable the calendar starts empty: weekends only,
/// surfaced as a warning at startup.
fn load_calendar() -> Result<BusinessCalendar, Box<dyn std::error::Error>> {
    let Ok(path) = std::env::var("HOLIDAY_CALENDAR") else {
        return Ok(BusinessCalendar::new());
    };
    let raw = std::fs::read_to_string(&path)?;
    let years: std::collections::BTreeMap<i32, Vec<chrono::NaiveDate>> =
        serde_json::from_str(&raw)?;

    let mut calendar = BusinessCalendar::new();
    for (year, dates) in years {
        calendar = calendar.with_year_holidays(year, dates);
    }
    tracing::info!(path = %path, "Holiday calendar loaded");
    Ok(calendar)
}

/// Initializes the tracing subscriber for structured logging.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Creates a PostgreSQL connection pool.
async fn create_database_pool(database_url: &str) -> Result<sqlx::PgPool, sqlx::Error> {
    tracing::info!("Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(database_url)
        .await?;

    tracing::info!("Database connection established");
    Ok(pool)
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// This enables graceful shutdown of the server, allowing in-flight
/// requests to complete before the process exits.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
