//! platen-compile: the compilation unit producer.
//!
//! Turns one template source file into an executable render unit:
//! - optional YAML front matter carrying the logical-id override and the
//!   preview properties
//! - a MiniJinja body compiled into an owned environment
//! - an optional sidecar stylesheet (`<stem>.scss` compiled with grass, or
//!   `<stem>.css` read as-is)
//!
//! Compilation failures are reported as structured diagnostics preserving
//! the engine's debug output.

mod compiler;
mod front_matter;
mod style;

pub use compiler::{CompilerOptions, JinjaCompiler};
pub use front_matter::{SplitSource, TemplateMeta, split_front_matter};
pub use style::{load_sidecar_stylesheet, rewrite_static_prefix};
