//! Router-level tests
//!
//! These tests exercise the HTTP surface without a live database: the
//! pool is created lazily, so routes that fail before any query (health
//! liveness, authentication) can be driven end to end.

use axum_test::TestServer;

use core_kernel::{BusinessCalendar, Role};
use interface_api::auth::create_token;
use interface_api::{config::ApiConfig, create_router};

fn test_server() -> (TestServer, ApiConfig) {
    let config = ApiConfig::default();
    let pool = sqlx::postgres::PgPoolOptions::new()
        .connect_lazy("postgres://localhost/facturas_test")
        .expect("lazy pool");
    let app = create_router(pool, config.clone(), BusinessCalendar::new());
    (TestServer::new(app).expect("test server"), config)
}

#[tokio::test]
async fn test_health_is_public() {
    let (server, _) = test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_api_requires_token() {
    let (server, _) = test_server();
    let response = server.get("/api/v1/invoices").await;
    response.assert_status_unauthorized();
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let (server, _) = test_server();
    let response = server
        .get("/api/v1/invoices")
        .authorization_bearer("not-a-token")
        .await;
    response.assert_status_unauthorized();
}

#[tokio::test]
async fn test_token_with_wrong_secret_is_rejected() {
    let (server, config) = test_server();
    let token = create_token("ana", Role::Legalizador, "some-other-secret", 3600).unwrap();
    assert_ne!(config.jwt_secret, "some-other-secret");

    let response = server
        .get("/api/v1/invoices")
        .authorization_bearer(&token)
        .await;
    response.assert_status_unauthorized();
}
