//! Receipt ERP Bridge server
//!
//! ```text
//! config → logging → receipt store → ERP client → orchestrator → gateway
//!                                                      └─ recovery sweeper
//! ```
//!
//! Usage: `receipt_erp_bridge [--env dev]` (reads `config/<env>.yaml`)

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use receipt_erp_bridge::config::AppConfig;
use receipt_erp_bridge::erp::{
    DocumentMapper, InMemoryErpClient, LogoRestClient, ReferenceDataService, RemoteErpClient,
    SessionProvider,
};
use receipt_erp_bridge::gateway::{self, AppState};
use receipt_erp_bridge::logging::init_logging;
use receipt_erp_bridge::receipt::{InMemoryReceiptStore, PgReceiptStore, ReceiptStore};
use receipt_erp_bridge::transfer::{RecoverySweeper, TransferOrchestrator, WorkerConfig};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    args.iter()
        .position(|a| a == "--env" || a == "-e")
        .and_then(|i| args.get(i + 1))
        .cloned()
        .unwrap_or_else(|| "dev".to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let config = AppConfig::load(&env).context("Failed to load configuration")?;
    let _guard = init_logging(&config);
    info!(env = %env, version = env!("GIT_HASH"), "Starting receipt ERP bridge");

    let store: Arc<dyn ReceiptStore> = match config.postgres_url.as_deref() {
        Some(url) => Arc::new(
            PgReceiptStore::connect(url)
                .await
                .context("Failed to connect to PostgreSQL")?,
        ),
        None => {
            warn!("postgres_url not set, receipts are kept in memory");
            Arc::new(InMemoryReceiptStore::new())
        }
    };

    let erp: Arc<dyn RemoteErpClient> = if config.erp.is_configured() {
        Arc::new(LogoRestClient::new(config.erp.clone()).context("Invalid Logo configuration")?)
    } else {
        warn!("Logo connection not configured, using in-memory ERP fixtures");
        Arc::new(InMemoryErpClient::new())
    };
    info!(erp = erp.name(), store = store.name(), "Components selected");

    let session = Arc::new(SessionProvider::new(erp.clone()));
    let orchestrator = Arc::new(TransferOrchestrator::new(
        store.clone(),
        session.clone(),
        erp.clone(),
        DocumentMapper::new(config.erp.date_order),
    ));
    let reference_data = Arc::new(ReferenceDataService::new(session, erp.clone()));

    if config.recovery.enabled {
        let sweeper = RecoverySweeper::new(orchestrator.clone(), WorkerConfig::from(&config.recovery));
        tokio::spawn(async move {
            sweeper.run().await;
        });
    }

    let state = Arc::new(AppState::new(orchestrator, reference_data, store, erp.name()));
    gateway::run_server(&config.gateway.host, config.gateway.port, state)
        .await
        .context("Gateway server error")?;
    Ok(())
}
