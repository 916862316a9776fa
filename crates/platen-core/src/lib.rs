//! platen-core: the in-memory heart of the platen document server.
//!
//! This crate provides:
//! - A document registry that discovers template sources, compiles them
//!   through a pluggable producer, and serves concurrent lookups from a
//!   pair of consistent indexes
//! - A rendering orchestrator that turns a logical document id plus caller
//!   props into markup
//! - A download token cache handing out single-use, time-bounded handles to
//!   in-memory binary payloads
//! - Page configuration types shared with the binarizer
//!
//! The expensive collaborators (template compilation, PDF rasterization) are
//! behind traits; implementations live in `platen-compile` and the server
//! binary.

pub mod binarize;
pub mod compiler;
pub mod discovery;
pub mod download;
pub mod error;
pub mod page;
pub mod registry;
pub mod render;

pub use binarize::{BinarizeRequest, DocumentBinarizer};
pub use compiler::{CompiledDocument, RenderUnit, TemplateCompiler, TemplateOrigin};
pub use download::{DEFAULT_DOWNLOAD_TTL, DownloadCache, DownloadPayload};
pub use error::{CompileDiagnostic, Error, Result};
pub use page::{Orientation, PageConfig, PageSize, StandardSize, resolve_page_config};
pub use registry::{DocumentEntry, DocumentRegistry};
pub use render::{RenderedDocument, render_document};
