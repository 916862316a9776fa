//! YAML front matter handling for template sources.
//!
//! A template may open with a `---`-delimited YAML block:
//!
//! ```text
//! ---
//! document-id: invoice
//! preview-props:
//!   customer: ACME Corp
//! ---
//! <html>...
//! ```
//!
//! The block carries the metadata the registry reads off the compiled
//! artifact. The split also records how many lines the block consumed so
//! execution errors can be mapped back to the author's line numbers.

use serde::Deserialize;
use serde_json::{Map, Value};

use platen_core::CompileDiagnostic;

/// Metadata fields recognized in front matter. Unknown keys are ignored so
/// authors can annotate templates freely.
#[derive(Debug, Default, Deserialize)]
pub struct TemplateMeta {
    /// Explicit logical-id override; the file's base name is used when
    /// absent
    #[serde(rename = "document-id")]
    pub document_id: Option<String>,

    /// Default properties used when a caller supplies none
    #[serde(rename = "preview-props")]
    pub preview_props: Option<Map<String, Value>>,
}

/// A template source split into metadata and executable body.
#[derive(Debug)]
pub struct SplitSource {
    pub meta: TemplateMeta,
    pub body: String,
    /// Number of source lines preceding the body (0 without front matter)
    pub line_offset: usize,
}

/// Split optional front matter off a template source.
pub fn split_front_matter(source: &str) -> Result<SplitSource, CompileDiagnostic> {
    let mut lines = source.lines();

    if lines.next().map(str::trim_end) != Some("---") {
        return Ok(SplitSource {
            meta: TemplateMeta::default(),
            body: source.to_string(),
            line_offset: 0,
        });
    }

    let mut yaml_lines = Vec::new();
    let mut closed = false;
    for line in lines.by_ref() {
        if line.trim_end() == "---" {
            closed = true;
            break;
        }
        yaml_lines.push(line);
    }

    if !closed {
        return Err(CompileDiagnostic {
            message: "unterminated front matter block (missing closing ---)".into(),
            kind: "front-matter".into(),
            stack: None,
            cause: None,
        });
    }

    let yaml = yaml_lines.join("\n");
    let meta: TemplateMeta = serde_yaml::from_str(&yaml).map_err(|e| CompileDiagnostic {
        message: e.to_string(),
        kind: "front-matter".into(),
        stack: None,
        cause: None,
    })?;

    // Opening and closing delimiters plus the YAML itself.
    let line_offset = yaml_lines.len() + 2;
    let body: String = source
        .lines()
        .skip(line_offset)
        .collect::<Vec<_>>()
        .join("\n");

    Ok(SplitSource {
        meta,
        body,
        line_offset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn source_without_front_matter_passes_through() {
        let split = split_front_matter("<html>{{ name }}</html>").unwrap();
        assert!(split.meta.document_id.is_none());
        assert!(split.meta.preview_props.is_none());
        assert_eq!(split.body, "<html>{{ name }}</html>");
        assert_eq!(split.line_offset, 0);
    }

    #[test]
    fn front_matter_is_split_off_the_body() {
        let source = "---\ndocument-id: invoice\npreview-props:\n  customer: ACME\n---\n<html>{{ customer }}</html>";
        let split = split_front_matter(source).unwrap();

        assert_eq!(split.meta.document_id.as_deref(), Some("invoice"));
        let preview = split.meta.preview_props.unwrap();
        assert_eq!(preview.get("customer"), Some(&json!("ACME")));
        assert_eq!(split.body, "<html>{{ customer }}</html>");
        assert_eq!(split.line_offset, 5);
    }

    #[test]
    fn unknown_metadata_keys_are_ignored() {
        let source = "---\nauthor: someone\n---\nbody";
        let split = split_front_matter(source).unwrap();
        assert!(split.meta.document_id.is_none());
        assert_eq!(split.body, "body");
    }

    #[test]
    fn unterminated_front_matter_is_a_diagnostic() {
        let err = split_front_matter("---\ndocument-id: x\nbody").unwrap_err();
        assert_eq!(err.kind, "front-matter");
        assert!(err.message.contains("unterminated"));
    }

    #[test]
    fn malformed_yaml_is_a_diagnostic() {
        let err = split_front_matter("---\ndocument-id: [unclosed\n---\nbody").unwrap_err();
        assert_eq!(err.kind, "front-matter");
    }
}
