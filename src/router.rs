//! Radix-tree request router with per-route middleware chains.
//!
//! One tree per HTTP method, O(path-length) lookup. Every request first runs
//! the router-wide layers, then the matched route's own chain, then the
//! handler. Unmatched requests still run the router-wide layers so they get
//! logged like everything else.

use std::collections::HashMap;
use std::sync::Arc;

use matchit::Router as MatchitRouter;
use tracing::{debug, error, warn};

use crate::error::ApiError;
use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::middleware::{Chain, Outcome, Stage};
use crate::request::Request;
use crate::response::Response;

#[derive(Clone)]
struct Route {
    chain: Arc<Chain>,
    handler: BoxedHandler,
}

/// The application router.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
pub struct Router {
    routes: HashMap<Method, MatchitRouter<Route>>,
    layers: Chain,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new(), layers: Chain::new() }
    }

    /// Adds a stage that runs before every route's own chain, including for
    /// requests that match no route.
    pub fn layer(mut self, stage: impl Stage) -> Self {
        self.layers = self.layers.stage(stage);
        self
    }

    /// Registers a handler with no route-specific stages.
    ///
    /// Path parameters use `{name}` syntax; `req.param("name")` retrieves them.
    pub fn on(self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.route(method, path, Chain::new(), handler)
    }

    /// Registers a handler guarded by `chain`.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route pattern or conflicts with an
    /// existing one. Routes are fixed at startup, so this is a programming
    /// error rather than a runtime condition.
    pub fn route(mut self, method: Method, path: &str, chain: Chain, handler: impl Handler) -> Self {
        let route = Route { chain: Arc::new(chain), handler: handler.into_boxed_handler() };
        self.routes
            .entry(method)
            .or_default()
            .insert(path, route)
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    fn lookup(&self, method: Method, path: &str) -> Option<(Route, HashMap<String, String>)> {
        let tree = self.routes.get(&method)?;
        let matched = tree.at(path).ok()?;
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((matched.value.clone(), params))
    }

    fn served_by_other_method(&self, method: Method, path: &str) -> bool {
        self.routes.iter().any(|(m, tree)| *m != method && tree.at(path).is_ok())
    }

    /// Routes one request through layers, route chain and handler.
    pub(crate) async fn handle(&self, mut req: Request) -> Response {
        let method = req.method();
        let path = req.path().to_owned();

        let outcome = match self.lookup(method, &path) {
            Some((route, params)) => {
                req.params = params;
                route.chain.execute(&self.layers, req, &route.handler).await
            }
            None => match self.layers.check(&mut req) {
                Err((stage, error)) => Outcome::Halted { stage, error },
                Ok(()) => {
                    let error = if self.served_by_other_method(method, &path) {
                        ApiError::MethodNotAllowed
                    } else {
                        ApiError::not_found("Route not found")
                    };
                    Outcome::Halted { stage: "router", error }
                }
            },
        };

        match &outcome {
            Outcome::Halted { stage, error } if error.status().is_server_error() => {
                error!(%method, path = %path, stage, status = error.status().as_u16(), "{error}");
            }
            Outcome::Halted { stage, error } => {
                warn!(%method, path = %path, stage, status = error.status().as_u16(), "{error}");
            }
            Outcome::Completed(resp) => {
                debug!(%method, path = %path, status = resp.status_code().as_u16(), "handled");
            }
        }
        outcome.into_response()
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}
