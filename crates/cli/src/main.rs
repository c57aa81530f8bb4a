//! Portal entry point.
//!
//! This binary is the composition root for the entire system:
//!
//! 1. **Parse configuration**: load `portal.toml` (or `--config`) and
//!    validate it.
//! 2. **Wire observability**: install a `tracing-subscriber` registry with a
//!    plain or JSON `fmt` layer and, when `telemetry.otlp_endpoint` is set, an
//!    OpenTelemetry OTLP exporter. Every span and event emitted by the
//!    workspace flows through it.
//! 3. **Construct infrastructure**: build the `WordPressClient` (when `[cms]`
//!    is present) and the `CkanClient`, and inject them into `SiteState`.
//! 4. **Serve** the `site` router until Ctrl-C or SIGTERM, then drain and
//!    flush pending spans.

mod config;
mod telemetry;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use ckan::CkanClient;
use clap::Parser;
use portal::ContentStore;
use site::SiteState;
use tokio::net::TcpListener;
use tracing::{info, warn};
use wordpress::WordPressClient;

use crate::config::Config;

#[derive(Debug, Parser)]
#[command(name = "portal", version, about = "Open-data portal frontend")]
struct Args {
    /// Configuration file.
    #[arg(long, env = "PORTAL_CONFIG", default_value = "portal.toml")]
    config: PathBuf,

    /// Listen address, overriding `server.listen`.
    #[arg(long)]
    listen: Option<String>,

    /// Log filter directive, overriding `RUST_LOG` and `logging.level`.
    #[arg(long)]
    log_level: Option<String>,

    /// Load and validate the configuration, then exit.
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::load(&args.config)?;
    if let Some(listen) = args.listen {
        config.server.listen = listen;
    }
    let addr = config.listen_addr()?;
    if args.check_config {
        println!("{}: ok", args.config.display());
        return Ok(());
    }

    let provider = telemetry::init(&config.logging, &config.telemetry, args.log_level.as_deref())?;

    let result = serve(config, addr).await;

    if let Some(provider) = provider {
        if let Err(e) = provider.shutdown() {
            warn!(error = %e, "tracer provider shutdown failed");
        }
    }
    result
}

async fn serve(config: Config, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let cms: Option<Arc<dyn ContentStore>> = match config.cms_config()? {
        Some(cms_config) => {
            info!(site = %cms_config.site, "CMS enabled");
            let client = WordPressClient::new(cms_config).context("building CMS client")?;
            Some(Arc::new(client) as Arc<dyn ContentStore>)
        }
        None => {
            info!("no [cms] section; running without a CMS");
            None
        }
    };
    let ckan = CkanClient::new(config.dms_config()?).context("building DMS client")?;
    let dms_api_url = ckan.api_url().clone();

    let state = SiteState::new(config.site, dms_api_url, cms, Arc::new(ckan))
        .context("building site state")?;
    let app = site::router(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "portal listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
        .context("server failed")?;
    info!("portal stopped");
    Ok(())
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = tokio::signal::ctrl_c() => {}
                }
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable; waiting for Ctrl-C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("shutdown signal received");
}
