//! Rendering orchestrator: logical id plus caller props in, markup out.

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::registry::DocumentRegistry;

/// Markup produced from a compiled template, with its stylesheet text
/// passed through as a separate field.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub markup: String,
    pub stylesheet: Option<String>,
}

/// Render the document registered under `id`.
///
/// When `props` is absent or empty the entry's preview properties are used
/// instead; otherwise the caller's properties are used verbatim. Full
/// override semantics: the two sets are never merged.
pub async fn render_document(
    registry: &DocumentRegistry,
    id: &str,
    props: Option<&Map<String, Value>>,
) -> Result<RenderedDocument> {
    let entry = registry
        .lookup_by_id(id)
        .await?
        .ok_or_else(|| Error::DocumentNotFound(id.to_string()))?;

    let resolved = match props {
        Some(p) if !p.is_empty() => p,
        _ => &entry.preview_props,
    };

    let markup = entry
        .compiled
        .unit
        .render(resolved, entry.compiled.stylesheet.as_deref())
        .await?;

    Ok(RenderedDocument {
        markup,
        stylesheet: entry.compiled.stylesheet.clone(),
    })
}
