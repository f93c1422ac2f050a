//! Configuration management using Figment.
//!
//! Sources, lowest to highest precedence:
//! 1. Built-in defaults
//! 2. TOML file (`catalog.toml` in the working directory, or an explicit path)
//! 3. Environment variables prefixed `CATALOG_` (e.g. `CATALOG_API_KEY`)

use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::query::QueryConfig;
use crate::server::Server;

pub const DEFAULT_CONFIG_FILE: &str = "catalog.toml";
pub const ENV_PREFIX: &str = "CATALOG_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Address the HTTP server listens on.
    pub bind: SocketAddr,

    /// Shared secret required on write routes.
    pub api_key: String,

    /// Header carrying the secret.
    pub api_key_header: String,

    /// `EnvFilter` directive, e.g. `info` or `catalog=debug`.
    pub log_level: String,

    /// Emit JSON log lines instead of human-readable ones.
    pub log_json: bool,

    /// Page size when `limit` is absent or malformed.
    pub default_page_size: usize,

    /// Upper bound on `limit`.
    pub max_page_size: usize,

    /// Largest request body accepted, in bytes.
    pub max_body_bytes: usize,

    /// Preload a handful of demo products.
    pub seed: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 3000)),
            api_key: "dev-api-key".to_owned(),
            api_key_header: "x-api-key".to_owned(),
            log_level: "info".to_owned(),
            log_json: false,
            default_page_size: QueryConfig::DEFAULT_LIMIT,
            max_page_size: QueryConfig::MAX_LIMIT,
            max_body_bytes: Server::DEFAULT_BODY_LIMIT,
            seed: true,
        }
    }
}

impl Config {
    /// Loads defaults, then `path` (or [`DEFAULT_CONFIG_FILE`]) if it exists,
    /// then `CATALOG_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        Self::figment(file).extract().map_err(Error::from)
    }

    fn figment(file: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    /// `true` when the shipped development secret is still in use.
    pub fn uses_default_api_key(&self) -> bool {
        self.api_key == Config::default().api_key
    }
}
