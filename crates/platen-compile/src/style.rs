//! Sidecar stylesheet resolution.
//!
//! A template `invoice.html` may carry its styles in `invoice.scss`
//! (compiled with grass) or `invoice.css` (read as-is). SCSS takes
//! precedence when both exist.

use std::fs;
use std::path::Path;

use tracing::debug;

use platen_core::CompileDiagnostic;

/// Load and, if needed, compile the stylesheet sitting next to a template
/// source file. Returns `None` when the template has no sidecar.
pub fn load_sidecar_stylesheet(source_path: &Path) -> Result<Option<String>, CompileDiagnostic> {
    let scss = source_path.with_extension("scss");
    if scss.exists() {
        debug!(path = %scss.display(), "compiling sidecar SCSS");
        return grass::from_path(&scss, &grass::Options::default())
            .map(Some)
            .map_err(|e| CompileDiagnostic {
                message: e.to_string(),
                kind: "scss".into(),
                stack: None,
                cause: None,
            });
    }

    let css = source_path.with_extension("css");
    if css.exists() {
        return fs::read_to_string(&css).map(Some).map_err(|e| CompileDiagnostic {
            message: format!("failed to read {}: {e}", css.display()),
            kind: "io".into(),
            stack: None,
            cause: None,
        });
    }

    Ok(None)
}

/// Rewrite absolute `/static/` references to relative ones for packaged
/// deployments, where the document is opened from disk rather than served.
pub fn rewrite_static_prefix(text: &str) -> String {
    text.replace("/static/", "./static/")
}
