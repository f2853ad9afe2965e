//! ERP Session Provider
//!
//! Caches the Logo bearer token process-wide. The token has no client-known
//! expiry; staleness is only detected when a call using it is rejected, at
//! which point the caller invalidates it and the next acquisition fetches a
//! fresh one. Reacquiring is always correct, merely wasteful.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::client::RemoteErpClient;
use super::error::ErpError;

/// Cached bearer credential
#[derive(Debug, Clone)]
pub struct ErpSession {
    pub token: String,
    pub acquired_at: DateTime<Utc>,
}

pub struct SessionProvider {
    client: Arc<dyn RemoteErpClient>,
    cached: RwLock<Option<ErpSession>>,
    acquisitions: AtomicUsize,
}

impl SessionProvider {
    pub fn new(client: Arc<dyn RemoteErpClient>) -> Self {
        Self {
            client,
            cached: RwLock::new(None),
            acquisitions: AtomicUsize::new(0),
        }
    }

    /// Cached token, or a freshly acquired one
    pub async fn acquire_token(&self) -> Result<String, ErpError> {
        if let Some(session) = self.cached.read().await.as_ref() {
            return Ok(session.token.clone());
        }

        let token = self.client.request_token().await?;
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        info!(client = self.client.name(), "Logo session acquired");

        *self.cached.write().await = Some(ErpSession {
            token: token.clone(),
            acquired_at: Utc::now(),
        });
        Ok(token)
    }

    /// Drop the cached token if it is still `rejected`
    ///
    /// A newer token cached by a concurrent caller is left alone.
    pub async fn invalidate(&self, rejected: &str) {
        let mut cached = self.cached.write().await;
        if cached.as_ref().is_some_and(|s| s.token == rejected) {
            debug!("Logo session invalidated after rejection");
            *cached = None;
        }
    }

    /// Run `op` with a token, renewing once if the ERP rejects the session
    pub async fn with_token<T, F, Fut>(&self, op: F) -> Result<T, ErpError>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T, ErpError>>,
    {
        let token = self.acquire_token().await?;
        match op(token.clone()).await {
            Err(e) if e.is_session_rejected() => {
                warn!(error = %e, "Logo session rejected, renewing");
                self.invalidate(&token).await;
                let fresh = self.acquire_token().await?;
                op(fresh).await
            }
            other => other,
        }
    }

    /// Number of tokens fetched from the ERP so far
    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }

    /// Snapshot of the cached session
    pub async fn current(&self) -> Option<ErpSession> {
        self.cached.read().await.clone()
    }
}
