//! platen-server: HTTP boundary for the platen document pipeline.
//!
//! This crate provides:
//! - Environment/CLI configuration bootstrap
//! - The axum REST surface (document generation, token downloads, static
//!   files)
//! - The Chromium-subprocess binarizer

pub mod chromium;
pub mod config;
pub mod context;
pub mod server;

pub use chromium::ChromiumBinarizer;
pub use config::ServerConfig;
pub use context::{AppContext, SharedContext};
