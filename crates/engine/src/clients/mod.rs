//! Collaborator clients for the catalog and identity domains.
//!
//! The engine consumes these through traits; wire transports live outside
//! this crate. The in-memory implementations carry failure toggles so the
//! degraded-mode paths are testable.

mod product;
mod user;

use thiserror::Error;

pub use product::{InMemoryProductCatalog, ProductCatalog, ProductInfo};
pub use user::{InMemoryUserDirectory, UserDirectory, UserInfo};

/// A collaborator call failed (network, timeout, remote fault).
///
/// During order creation these are absorbed by the degraded-mode policy;
/// during stock checks they fail the reservation.
#[derive(Debug, Clone, Error)]
#[error("collaborator unavailable: {0}")]
pub struct ClientError(pub String);

impl ClientError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
