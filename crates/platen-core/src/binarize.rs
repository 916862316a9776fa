//! The markup-to-binary-document contract.
//!
//! Rasterization is an external collaborator: the core only specifies the
//! interface. Implementations own their rendering resource (a headless
//! browser engine) with scoped acquisition and guaranteed release on every
//! exit path.

use async_trait::async_trait;

use crate::error::Result;
use crate::page::PageConfig;

/// One rasterization request.
#[derive(Debug, Clone)]
pub struct BinarizeRequest {
    /// Base URL the markup's relative references resolve against
    pub base_url: String,
    /// The markup to rasterize
    pub markup: String,
    /// Resolved page configuration
    pub page: PageConfig,
}

/// Turns markup plus a page configuration into a binary document.
#[async_trait]
pub trait DocumentBinarizer: Send + Sync {
    async fn binarize(&self, request: &BinarizeRequest) -> Result<Vec<u8>>;
}
