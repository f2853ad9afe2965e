//! Recovery Sweeper
//!
//! Background task that fails receipts left in `processing` by a crashed or
//! abandoned attempt, so they become retry-eligible again.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use super::error::TransferError;
use super::orchestrator::TransferOrchestrator;
use crate::config::RecoveryConfig;

/// Configuration for the recovery sweeper
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// How often to scan for stale transfers
    pub scan_interval: Duration,
    /// How long a receipt must sit in `processing` to be considered stale
    pub stale_threshold: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            scan_interval: Duration::from_secs(60),
            stale_threshold: Duration::from_secs(300),
        }
    }
}

impl From<&RecoveryConfig> for WorkerConfig {
    fn from(config: &RecoveryConfig) -> Self {
        Self {
            scan_interval: Duration::from_secs(config.scan_interval_secs),
            stale_threshold: Duration::from_secs(config.stale_threshold_secs),
        }
    }
}

pub struct RecoverySweeper {
    orchestrator: Arc<TransferOrchestrator>,
    config: WorkerConfig,
}

impl RecoverySweeper {
    pub fn new(orchestrator: Arc<TransferOrchestrator>, config: WorkerConfig) -> Self {
        Self {
            orchestrator,
            config,
        }
    }

    /// Run the sweep loop forever
    pub async fn run(&self) -> ! {
        info!(
            scan_interval_secs = self.config.scan_interval.as_secs(),
            stale_threshold_secs = self.config.stale_threshold.as_secs(),
            "Starting recovery sweeper"
        );

        loop {
            if let Err(e) = self.sweep().await {
                error!(error = %e, "Recovery sweep failed");
            }

            tokio::time::sleep(self.config.scan_interval).await;
        }
    }

    /// Run a single sweep
    pub async fn sweep(&self) -> Result<usize, TransferError> {
        let recovered = self
            .orchestrator
            .recover_stale(self.config.stale_threshold)
            .await?;
        if recovered > 0 {
            info!(count = recovered, "Recovered stale transfers this sweep");
        } else {
            debug!("Sweep found nothing to recover");
        }
        Ok(recovered)
    }
}
