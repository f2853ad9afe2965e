//! Logo ERP integration
//!
//! Session handling, document mapping, submission and reference data for
//! the Logo REST API. The live client and the in-memory fake sit behind
//! [`RemoteErpClient`].

pub mod client;
pub mod document;
pub mod error;
pub mod fake;
pub mod http;
pub mod reference_data;
pub mod session;
pub mod submitter;
pub mod wire;

pub use client::{RemoteDocumentResult, RemoteErpClient};
pub use document::{DateOrder, DocumentMapper, DocumentPayload};
pub use error::ErpError;
pub use fake::{InMemoryErpClient, ReferenceMode};
pub use http::LogoRestClient;
pub use reference_data::{AccountKind, ExpenseCategory, ReferenceDataService, SettlementAccount};
pub use session::SessionProvider;
pub use submitter::TransferSubmitter;
