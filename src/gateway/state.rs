use std::sync::Arc;
use std::time::Instant;

use crate::erp::ReferenceDataService;
use crate::receipt::ReceiptStore;
use crate::transfer::TransferOrchestrator;

/// Shared gateway state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<TransferOrchestrator>,
    pub reference_data: Arc<ReferenceDataService>,
    pub store: Arc<dyn ReceiptStore>,
    /// Name of the ERP client in use ("logo-rest" or "in-memory")
    pub erp_client: &'static str,
    started_at: Instant,
}

impl AppState {
    pub fn new(
        orchestrator: Arc<TransferOrchestrator>,
        reference_data: Arc<ReferenceDataService>,
        store: Arc<dyn ReceiptStore>,
        erp_client: &'static str,
    ) -> Self {
        Self {
            orchestrator,
            reference_data,
            store,
            erp_client,
            started_at: Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
