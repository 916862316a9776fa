//! MiniJinja-backed implementation of the compilation producer.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use minijinja::Environment;
use serde_json::{Map, Value};
use tracing::debug;

use platen_core::{
    CompileDiagnostic, CompiledDocument, Error, RenderUnit, Result, TemplateCompiler,
    TemplateOrigin,
};

use crate::front_matter::split_front_matter;
use crate::style::{load_sidecar_stylesheet, rewrite_static_prefix};

#[derive(Debug, Clone, Default)]
pub struct CompilerOptions {
    /// Rewrite absolute `/static/` references to relative ones, for
    /// packaged deployments where documents open from disk.
    pub rewrite_static_prefix: bool,
}

/// Compiles template sources into executable MiniJinja render units.
#[derive(Debug, Default)]
pub struct JinjaCompiler {
    options: CompilerOptions,
}

impl JinjaCompiler {
    pub fn new(options: CompilerOptions) -> Self {
        JinjaCompiler { options }
    }
}

#[async_trait]
impl TemplateCompiler for JinjaCompiler {
    async fn compile(&self, source_path: &Path) -> Result<CompiledDocument> {
        let source = tokio::fs::read_to_string(source_path).await?;

        let split = split_front_matter(&source).map_err(|diagnostic| Error::Compilation {
            path: source_path.to_path_buf(),
            diagnostic,
        })?;

        let origin = TemplateOrigin {
            source_path: source_path.to_path_buf(),
            line_offset: split.line_offset,
        };

        let mut body = split.body;
        let mut stylesheet =
            load_sidecar_stylesheet(source_path).map_err(|diagnostic| Error::Compilation {
                path: source_path.to_path_buf(),
                diagnostic,
            })?;

        if self.options.rewrite_static_prefix {
            body = rewrite_static_prefix(&body);
            stylesheet = stylesheet.as_deref().map(rewrite_static_prefix);
        }

        // The file name doubles as the template name so autoescaping picks
        // the right mode from the extension.
        let template_name = source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "template".to_string());

        let mut env: Environment<'static> = Environment::new();
        env.add_template_owned(template_name.clone(), body)
            .map_err(|e| Error::Compilation {
                path: source_path.to_path_buf(),
                diagnostic: jinja_diagnostic(&e, &origin),
            })?;

        // Templates that reference `stylesheet` place the styles themselves;
        // everyone else gets a <style> element injected after rendering.
        let references_stylesheet = {
            let template = env
                .get_template(&template_name)
                .map_err(|e| Error::Compilation {
                    path: source_path.to_path_buf(),
                    diagnostic: jinja_diagnostic(&e, &origin),
                })?;
            template.undeclared_variables(true).contains("stylesheet")
        };

        debug!(
            path = %source_path.display(),
            has_stylesheet = stylesheet.is_some(),
            "compiled template"
        );

        let unit = JinjaUnit {
            env,
            template_name,
            inject_stylesheet: !references_stylesheet,
            origin: origin.clone(),
        };

        Ok(CompiledDocument {
            unit: Arc::new(unit),
            stylesheet,
            document_id: split.meta.document_id,
            preview_props: split.meta.preview_props.unwrap_or_default(),
            origin,
        })
    }
}

/// A compiled template plus the environment that owns its source.
struct JinjaUnit {
    env: Environment<'static>,
    template_name: String,
    inject_stylesheet: bool,
    origin: TemplateOrigin,
}

impl JinjaUnit {
    fn execution_error(&self, err: &minijinja::Error) -> Error {
        Error::Compilation {
            path: self.origin.source_path.clone(),
            diagnostic: jinja_diagnostic(err, &self.origin),
        }
    }
}

#[async_trait]
impl RenderUnit for JinjaUnit {
    async fn render(
        &self,
        props: &Map<String, Value>,
        stylesheet: Option<&str>,
    ) -> Result<String> {
        let template = self
            .env
            .get_template(&self.template_name)
            .map_err(|e| self.execution_error(&e))?;

        let mut context = props.clone();
        if let Some(css) = stylesheet {
            context.insert("stylesheet".to_string(), Value::String(css.to_string()));
        }

        let markup = template
            .render(minijinja::Value::from_serialize(&context))
            .map_err(|e| self.execution_error(&e))?;

        Ok(match (stylesheet, self.inject_stylesheet) {
            (Some(css), true) => inject_style_element(&markup, css),
            _ => markup,
        })
    }
}

/// Map an engine error onto the structured diagnostic, shifting reported
/// line numbers past the front matter so they point at the author's file.
fn jinja_diagnostic(err: &minijinja::Error, origin: &TemplateOrigin) -> CompileDiagnostic {
    let mut message = err.to_string();
    if let Some(line) = err.line() {
        message = format!(
            "{message} (at {}:{})",
            origin.source_path.display(),
            line + origin.line_offset
        );
    }

    CompileDiagnostic {
        message,
        kind: err.kind().to_string(),
        // The alternate form carries MiniJinja's debug printout with the
        // template source context.
        stack: Some(format!("{err:#}")),
        cause: std::error::Error::source(err).map(|c| c.to_string()),
    }
}

fn inject_style_element(markup: &str, css: &str) -> String {
    let style = format!("<style>{css}</style>");
    match markup.find("</head>") {
        Some(pos) => {
            let mut out = String::with_capacity(markup.len() + style.len());
            out.push_str(&markup[..pos]);
            out.push_str(&style);
            out.push_str(&markup[pos..]);
            out
        }
        None => format!("{style}\n{markup}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn compiler() -> JinjaCompiler {
        JinjaCompiler::default()
    }

    fn props(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn compiles_front_matter_and_body() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("invoice.html");
        fs::write(
            &path,
            "---\ndocument-id: invoice-v2\npreview-props:\n  customer: ACME\n---\n<html><body>{{ customer }}</body></html>",
        )
        .unwrap();

        let compiled = compiler().compile(&path).await.unwrap();
        assert_eq!(compiled.document_id.as_deref(), Some("invoice-v2"));
        assert_eq!(compiled.preview_props.get("customer"), Some(&json!("ACME")));
        assert_eq!(compiled.origin.line_offset, 5);

        let markup = compiled
            .unit
            .render(&props(&[("customer", json!("Initech"))]), None)
            .await
            .unwrap();
        assert_eq!(markup, "<html><body>Initech</body></html>");
    }

    #[tokio::test]
    async fn stylesheet_variable_is_available_to_templates() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("styled.html");
        fs::write(
            &path,
            "<html><head><style>{{ stylesheet }}</style></head><body></body></html>",
        )
        .unwrap();
        fs::write(temp.path().join("styled.css"), "body { margin: 0; }").unwrap();

        let compiled = compiler().compile(&path).await.unwrap();
        let css = compiled.stylesheet.clone().unwrap();
        let markup = compiled
            .unit
            .render(&Map::new(), Some(&css))
            .await
            .unwrap();

        // Placed by the template itself, not injected a second time.
        assert_eq!(markup.matches("body { margin: 0; }").count(), 1);
    }

    #[tokio::test]
    async fn unreferenced_stylesheet_is_injected_into_head() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("plain.html");
        fs::write(&path, "<html><head></head><body></body></html>").unwrap();
        fs::write(temp.path().join("plain.scss"), "h1 { color: red; }").unwrap();

        let compiled = compiler().compile(&path).await.unwrap();
        let css = compiled.stylesheet.clone().unwrap();
        let markup = compiled
            .unit
            .render(&Map::new(), Some(&css))
            .await
            .unwrap();

        assert!(markup.contains("<style>"));
        assert!(markup.find("<style>").unwrap() < markup.find("</head>").unwrap());
    }

    #[tokio::test]
    async fn syntax_errors_are_structured_diagnostics() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.html");
        fs::write(&path, "---\ndocument-id: broken\n---\n{% if %}").unwrap();

        let err = compiler().compile(&path).await.unwrap_err();
        match err {
            Error::Compilation { path: p, diagnostic } => {
                assert_eq!(p, path);
                assert_eq!(diagnostic.kind, "syntax error");
                assert!(diagnostic.stack.is_some());
                // Line 1 of the body is line 4 of the file.
                assert!(diagnostic.message.contains(":4"));
            }
            other => panic!("expected compilation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn execution_failures_surface_as_compilation_errors() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("filtered.html");
        fs::write(&path, "{{ name|nonexistent_filter }}").unwrap();

        let compiled = compiler().compile(&path).await.unwrap();
        let err = compiled
            .unit
            .render(&props(&[("name", json!("x"))]), None)
            .await
            .unwrap_err();
        assert!(err.is_compilation());
    }

    #[tokio::test]
    async fn packaged_builds_rewrite_static_references() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("logo.html");
        fs::write(&path, "<img src=\"/static/logo.png\">").unwrap();
        fs::write(temp.path().join("logo.css"), "h1 { background: url(/static/bg.png); }")
            .unwrap();

        let compiled = JinjaCompiler::new(CompilerOptions {
            rewrite_static_prefix: true,
        })
        .compile(&path)
        .await
        .unwrap();

        let markup = compiled.unit.render(&Map::new(), None).await.unwrap();
        assert!(markup.contains("./static/logo.png"));
        assert!(compiled.stylesheet.unwrap().contains("url(./static/bg.png)"));
    }

    #[tokio::test]
    async fn missing_source_is_an_io_error() {
        let temp = TempDir::new().unwrap();
        let err = compiler()
            .compile(&temp.path().join("gone.html"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
