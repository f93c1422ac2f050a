//! Route table and shared state.

use std::sync::Arc;

use crate::config::Config;
use crate::handler::with_state;
use crate::handlers;
use crate::health;
use crate::method::Method;
use crate::middleware::{Chain, RequestLogger, RequireApiKey, ValidateBody};
use crate::product::Product;
use crate::query::QueryConfig;
use crate::router::Router;
use crate::store::ProductStore;

/// Everything handlers need, shared across requests.
pub struct AppState {
    pub store: Arc<dyn ProductStore>,
    pub query: QueryConfig,
}

impl AppState {
    pub fn new(config: &Config, store: Arc<dyn ProductStore>) -> Self {
        Self {
            store,
            query: Product::QUERY.with_limits(config.default_page_size, config.max_page_size),
        }
    }
}

/// Builds the full router.
///
/// | Route | Stages after logging |
/// |---|---|
/// | `GET /api/products`, `/stats`, `/{id}` | none |
/// | `POST /api/products` | API key, create validation |
/// | `PUT`/`PATCH /api/products/{id}` | API key, update validation |
/// | `DELETE /api/products/{id}` | API key |
pub fn build(config: &Config, store: Arc<dyn ProductStore>) -> Router {
    let state = Arc::new(AppState::new(config, store));

    let guarded = Chain::new().stage(RequireApiKey::new(&config.api_key_header, &config.api_key));
    let creating = guarded.clone().stage(ValidateBody::create(Product::SCHEMA));
    let updating = guarded.clone().stage(ValidateBody::update(Product::SCHEMA));

    Router::new()
        .layer(RequestLogger)
        .on(Method::Get, "/", with_state(state.clone(), handlers::index))
        .on(Method::Get, "/healthz", health::liveness)
        .on(Method::Get, "/readyz", with_state(state.clone(), health::readiness))
        .on(Method::Get, "/api/products", with_state(state.clone(), handlers::list))
        .on(Method::Get, "/api/products/stats", with_state(state.clone(), handlers::stats))
        .on(Method::Get, "/api/products/{id}", with_state(state.clone(), handlers::show))
        .route(Method::Post, "/api/products", creating, with_state(state.clone(), handlers::create))
        .route(Method::Put, "/api/products/{id}", updating.clone(), with_state(state.clone(), handlers::update))
        .route(Method::Patch, "/api/products/{id}", updating, with_state(state.clone(), handlers::update))
        .route(Method::Delete, "/api/products/{id}", guarded, with_state(state, handlers::remove))
}
