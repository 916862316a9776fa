//! The compilation unit producer contract.
//!
//! The registry treats template compilation as a slow function of source
//! path to compiled artifact. The artifact carries explicit, typed metadata
//! (logical id override, preview props) rather than anything probed
//! dynamically off the executable unit.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::Result;

/// Diagnostics mapping from a compiled unit back to its original file.
///
/// `line_offset` is the number of source lines consumed before the
/// executable body begins (front matter, injected prologue); producers add
/// it when reporting execution errors so line numbers point at the file the
/// author edited.
#[derive(Debug, Clone)]
pub struct TemplateOrigin {
    pub source_path: PathBuf,
    pub line_offset: usize,
}

/// The executable render entry point of a compiled template.
#[async_trait]
pub trait RenderUnit: Send + Sync {
    /// Render the unit to markup with the given properties.
    ///
    /// The compiled stylesheet text is passed alongside so the unit can make
    /// it available to the markup; it is also returned to callers as a
    /// separate field by the orchestrator.
    async fn render(&self, props: &Map<String, Value>, stylesheet: Option<&str>)
    -> Result<String>;
}

/// The output of compiling one template source file.
///
/// Immutable once produced; the registry shares it behind `Arc`s and a
/// refresh replaces entries wholesale instead of mutating them.
#[derive(Clone)]
pub struct CompiledDocument {
    /// Executable render entry point
    pub unit: Arc<dyn RenderUnit>,
    /// Compiled stylesheet text, when the template has one
    pub stylesheet: Option<String>,
    /// Explicit logical-id override embedded in the source, if any
    pub document_id: Option<String>,
    /// Default properties used when a caller supplies none
    pub preview_props: Map<String, Value>,
    /// Mapping back to the original file, used only for diagnostics
    pub origin: TemplateOrigin,
}

impl std::fmt::Debug for CompiledDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledDocument")
            .field("stylesheet", &self.stylesheet)
            .field("document_id", &self.document_id)
            .field("preview_props", &self.preview_props)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

/// Produces compiled artifacts from template source paths.
///
/// Failures are surfaced as [`crate::Error::Compilation`] carrying the
/// producer's structured diagnostic verbatim.
#[async_trait]
pub trait TemplateCompiler: Send + Sync {
    async fn compile(&self, source_path: &Path) -> Result<CompiledDocument>;
}
