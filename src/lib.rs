//! # catalog
//!
//! A product catalog over HTTP: create, read, update, delete, plus
//! search, filtering, sorting, pagination and aggregate statistics on the
//! listing route.
//!
//! ## Request pipeline
//!
//! ```text
//! hyper ─▶ Router ─▶ RequestLogger ─▶ RequireApiKey* ─▶ ValidateBody† ─▶ handler
//!                         (all)       (writes only)    (create/update)
//! ```
//!
//! Any stage may halt with an [`ApiError`]; the router renders it as
//! `{"success": false, "error": "..."}` with the matching status. Handlers
//! return [`Envelope`]s rendered as `{"success": true, "data": ...}`.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use catalog::{Config, MemoryStore, Server, app};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), catalog::Error> {
//!     let config = Config::load(None)?;
//!     let router = app::build(&config, Arc::new(MemoryStore::seeded()));
//!     Server::bind(config.bind).serve(router).await
//! }
//! ```
//!
//! The query engine, validator, authenticator and statistics are plain
//! functions over owned snapshots. They hold no state and never log.

mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod app;
pub mod config;
pub mod handlers;
pub mod health;
pub mod middleware;
pub mod product;
pub mod query;
pub mod stats;
pub mod store;
pub mod telemetry;
pub mod validate;

pub use app::AppState;
pub use config::Config;
pub use error::{ApiError, Error};
pub use handler::{Handler, with_state};
pub use method::Method;
pub use product::{NewProduct, Product, ProductPatch};
pub use query::{Page, PageMetadata, QueryParams};
pub use request::Request;
pub use response::{Envelope, IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
pub use stats::StatsSummary;
pub use status::Status;
pub use store::{MemoryStore, ProductStore};
