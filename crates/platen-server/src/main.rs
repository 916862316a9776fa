//! Platen binary - template-to-PDF document server

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use platen_compile::{CompilerOptions, JinjaCompiler};
use platen_server::{AppContext, ChromiumBinarizer, ServerConfig, server};

#[derive(Parser, Debug)]
#[command(name = "platen")]
#[command(about = "Serves document templates as rendered PDFs over HTTP")]
struct Args {
    /// Template project root (defaults to PLATEN_TEMPLATES_ROOT or the
    /// current directory)
    #[arg(short, long)]
    project: Option<PathBuf>,

    /// Port to listen on
    #[arg(short = 'P', long)]
    port: Option<u16>,

    /// Host to bind to
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Browser binary used for PDF printing
    #[arg(long)]
    chromium: Option<PathBuf>,

    /// Rewrite absolute /static/ references for packaged deployments
    #[arg(long)]
    packaged: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "platen=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = ServerConfig::from_env();
    if let Some(project) = args.project {
        config.set_project_root(project);
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(chromium) = args.chromium {
        config.chromium_binary = chromium;
    }

    info!(
        templates_dir = %config.templates_dir.display(),
        static_dir = %config.static_dir.display(),
        "Starting platen"
    );

    let compiler = Arc::new(JinjaCompiler::new(CompilerOptions {
        rewrite_static_prefix: args.packaged,
    }));
    let binarizer = Arc::new(ChromiumBinarizer::new(config.chromium_binary.clone()));
    let ctx = Arc::new(AppContext::new(config, compiler, binarizer));

    server::run_server(ctx).await?;

    Ok(())
}
