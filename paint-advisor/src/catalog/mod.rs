//! Catalog boundary: the product records the engine may recommend and the
//! retriever capability that returns a bounded candidate list for a slot set.

pub mod memory;
pub mod types;

use async_trait::async_trait;

use crate::slots::SlotSet;

pub use memory::InMemoryCatalog;
pub use types::{CandidateProduct, ColorAvailability, ProductEnvironment, ProductId, ProductLine};

/// Errors raised by a catalog retriever
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("catalog is unavailable: {0}")]
    Unavailable(String),

    #[error("invalid catalog data: {0}")]
    InvalidCatalog(String),

    #[error("catalog I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// External collaborator that turns slots into catalog candidates.
///
/// Implementations may filter exactly, search semantically, or both. The
/// engine only relies on the shape of the result and on `limit` being honored.
#[async_trait]
pub trait CatalogRetriever: Send + Sync {
    async fn retrieve(
        &self,
        slots: &SlotSet,
        limit: usize,
    ) -> Result<Vec<CandidateProduct>, RetrievalError>;

    /// Colors present in the catalog with their product counts
    async fn available_colors(&self) -> Result<Vec<ColorAvailability>, RetrievalError>;

    /// Every product name the catalog carries, used to reject replies that
    /// mention a product other than the grounded one. Retrievers that cannot
    /// enumerate their catalog return an empty list.
    async fn product_names(&self) -> Result<Vec<String>, RetrievalError> {
        Ok(Vec::new())
    }
}
