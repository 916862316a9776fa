//! Shared state for the server.
//!
//! Owned here rather than in module-level globals so tests can stand up
//! independent registries and caches in one process.

use std::sync::Arc;

use platen_core::{DocumentBinarizer, DocumentRegistry, DownloadCache, TemplateCompiler};

use crate::config::ServerConfig;

/// The server's composition root, shared across request handlers.
pub struct AppContext {
    pub config: ServerConfig,
    pub registry: DocumentRegistry,
    pub downloads: DownloadCache,
    pub binarizer: Arc<dyn DocumentBinarizer>,
}

impl AppContext {
    pub fn new(
        config: ServerConfig,
        compiler: Arc<dyn TemplateCompiler>,
        binarizer: Arc<dyn DocumentBinarizer>,
    ) -> Self {
        let registry = DocumentRegistry::new(config.templates_dir.clone(), compiler);
        AppContext {
            config,
            registry,
            downloads: DownloadCache::new(),
            binarizer,
        }
    }
}

/// Type alias for the shared context used in axum handlers.
pub type SharedContext = Arc<AppContext>;
