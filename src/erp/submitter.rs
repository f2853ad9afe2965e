//! Transfer Submitter
//!
//! One document POST per call. A success without a reference from the ERP
//! still yields a non-empty reference string.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::client::RemoteErpClient;
use super::document::DocumentPayload;
use super::error::ErpError;

/// Prefix of references synthesized when Logo omits one
pub const FALLBACK_REFERENCE_PREFIX: &str = "REF-";

pub struct TransferSubmitter {
    client: Arc<dyn RemoteErpClient>,
}

impl TransferSubmitter {
    pub fn new(client: Arc<dyn RemoteErpClient>) -> Self {
        Self { client }
    }

    /// Submit `document` and return the reference to record
    pub async fn submit(&self, token: &str, document: &DocumentPayload) -> Result<String, ErpError> {
        let result = self.client.create_purchase_invoice(token, document).await?;
        match result.internal_reference {
            Some(reference) => {
                info!(fiche_no = %document.fiche_no, reference = %reference, "Document created in Logo");
                Ok(reference)
            }
            None => {
                let reference = fallback_reference();
                warn!(
                    fiche_no = %document.fiche_no,
                    reference = %reference,
                    "Logo returned no internal reference, using fallback"
                );
                Ok(reference)
            }
        }
    }
}

/// `REF-<unix millis>`
pub fn fallback_reference() -> String {
    format!("{}{}", FALLBACK_REFERENCE_PREFIX, Utc::now().timestamp_millis())
}
