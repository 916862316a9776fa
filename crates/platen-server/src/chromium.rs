//! Headless-Chromium binarizer.
//!
//! The markup is written to a scratch directory together with an injected
//! `@page` rule carrying the resolved page configuration and a `<base>`
//! element for asset resolution, then printed to PDF by a Chromium
//! subprocess. The scratch directory is dropped on every exit path, so the
//! engine's inputs and outputs never outlive the request.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use platen_core::{BinarizeRequest, DocumentBinarizer, Error, Orientation, PageSize, Result};

pub struct ChromiumBinarizer {
    binary: PathBuf,
}

impl ChromiumBinarizer {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        ChromiumBinarizer {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl DocumentBinarizer for ChromiumBinarizer {
    async fn binarize(&self, request: &BinarizeRequest) -> Result<Vec<u8>> {
        let scratch = tempfile::tempdir()?;
        let input = scratch.path().join("document.html");
        let output = scratch.path().join("document.pdf");

        tokio::fs::write(&input, prepare_markup(request)).await?;

        debug!(binary = %self.binary.display(), "printing document to PDF");

        let printed = Command::new(&self.binary)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-pdf-header-footer")
            .arg(format!("--print-to-pdf={}", output.display()))
            .arg(format!("file://{}", input.display()))
            .output()
            .await
            .map_err(|e| {
                Error::Binarize(format!("failed to launch {}: {e}", self.binary.display()))
            })?;

        if !printed.status.success() {
            return Err(Error::Binarize(format!(
                "chromium exited with {}: {}",
                printed.status,
                String::from_utf8_lossy(&printed.stderr).trim()
            )));
        }

        Ok(tokio::fs::read(&output).await?)
    }
}

/// Prepend the base URL and the page rule to the document head.
fn prepare_markup(request: &BinarizeRequest) -> String {
    let prologue = format!(
        "<base href=\"{}\"><style>{}</style>",
        request.base_url,
        page_size_rule(&request.page)
    );

    match request.markup.find("</head>") {
        Some(pos) => {
            let mut out = String::with_capacity(request.markup.len() + prologue.len());
            out.push_str(&request.markup[..pos]);
            out.push_str(&prologue);
            out.push_str(&request.markup[pos..]);
            out
        }
        None => format!("{prologue}\n{}", request.markup),
    }
}

/// Express the page configuration as a CSS `@page` rule.
///
/// Named formats combine with an orientation keyword. Two explicit lengths
/// cannot, so landscape custom sizes swap width and height instead.
fn page_size_rule(page: &platen_core::PageConfig) -> String {
    match &page.size {
        PageSize::Standard(size) => format!(
            "@page {{ size: {} {}; }}",
            size.as_str(),
            page.orientation.as_str()
        ),
        PageSize::Custom { width, height } => {
            let (first, second) = match page.orientation {
                Orientation::Portrait => (width, height),
                Orientation::Landscape => (height, width),
            };
            format!("@page {{ size: {first} {second}; }}")
        }
    }
}
