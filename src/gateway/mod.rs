pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

pub use state::AppState;

/// Build the gateway router
pub fn build_router(state: Arc<AppState>) -> Router {
    let erp_routes = Router::new()
        .route("/transfer", post(handlers::transfer_receipt))
        .route("/expense-categories", get(handlers::list_expense_categories))
        .route("/settlement-accounts", get(handlers::list_settlement_accounts));

    Router::new()
        .route("/api/v1/health", get(handlers::health_check))
        .route("/api/v1/receipts/{id}", get(handlers::get_receipt))
        .nest("/api/v1/erp", erp_routes)
        .route("/api-docs/openapi.json", get(handlers::openapi_json))
        .with_state(state)
}

/// Start HTTP Gateway server
pub async fn run_server(host: &str, port: u16, state: Arc<AppState>) -> std::io::Result<()> {
    let app = build_router(state);

    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr).await?;

    info!(%addr, "Gateway listening");
    info!("ERP API: /api/v1/erp/*  OpenAPI: /api-docs/openapi.json");

    axum::serve(listener, app).await
}
