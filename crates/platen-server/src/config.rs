//! Server configuration from environment variables.
//!
//! The directory layout mirrors a template project checkout:
//!
//! ```text
//! <project root>/
//!   documents/
//!     templates/   <- the template root the registry scans
//!     static/      <- assets served under /static
//! ```

use std::path::PathBuf;

use platen_core::PageConfig;

/// Runtime configuration for the platen server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Template root scanned by the registry
    pub templates_dir: PathBuf,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    /// When set, required verbatim in the `authorization` header for
    /// non-exempt routes
    pub api_key: Option<String>,
    /// Browser binary used by the binarizer
    pub chromium_binary: PathBuf,
    /// Page configuration applied when a request carries no overrides
    pub default_page: PageConfig,
}

impl ServerConfig {
    /// Build a config from `PLATEN_*` environment variables, falling back
    /// to the conventional layout relative to the current directory.
    pub fn from_env() -> Self {
        let project_root = std::env::var_os("PLATEN_TEMPLATES_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let documents_dir = std::env::var_os("PLATEN_DOCUMENTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| project_root.join("documents"));

        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(4000);

        ServerConfig {
            host: "127.0.0.1".to_string(),
            port,
            templates_dir: documents_dir.join("templates"),
            static_dir: documents_dir.join("static"),
            api_key: std::env::var("PLATEN_API_KEY").ok(),
            chromium_binary: std::env::var_os("PLATEN_CHROMIUM")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("chromium")),
            default_page: PageConfig::default(),
        }
    }

    /// Re-anchor the documents layout under a different project root.
    pub fn set_project_root(&mut self, root: PathBuf) {
        let documents_dir = root.join("documents");
        self.templates_dir = documents_dir.join("templates");
        self.static_dir = documents_dir.join("static");
    }
}
