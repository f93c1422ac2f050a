//! Product catalog server.
//!
//! Usage:
//!   catalog --config catalog.toml --bind 0.0.0.0:3000
//!
//! Try:
//!   curl 'http://localhost:3000/api/products?search=desk&sortBy=price&order=desc'
//!   curl http://localhost:3000/api/products/stats
//!   curl -X POST http://localhost:3000/api/products \
//!        -H 'x-api-key: dev-api-key' -H 'content-type: application/json' \
//!        -d '{"name":"Pen","price":2.5,"category":"office"}'

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use catalog::{Config, MemoryStore, ProductStore, Server, app, telemetry};
use clap::Parser;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "catalog")]
#[command(about = "Product catalog HTTP service")]
struct Args {
    /// Path to a TOML config file (default: ./catalog.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overriding the config file
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Start with an empty catalog
    #[arg(long)]
    no_seed: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref()).context("loading configuration")?;
    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    if args.no_seed {
        config.seed = false;
    }

    telemetry::init(&config)?;
    if config.uses_default_api_key() {
        warn!("using the built-in development API key; set CATALOG_API_KEY in production");
    }

    let store: Arc<dyn ProductStore> = if config.seed {
        Arc::new(MemoryStore::seeded())
    } else {
        Arc::new(MemoryStore::new())
    };
    info!(products = store.list()?.len(), "store ready");

    let router = app::build(&config, store);
    Server::bind(config.bind)
        .body_limit(config.max_body_bytes)
        .serve(router)
        .await
        .context("server error")?;
    Ok(())
}
