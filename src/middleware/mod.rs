//! Middleware layer.
//!
//! A [`Chain`] is an ordered list of [`Stage`]s run before a handler. Each
//! stage looks at the request and either lets it through ([`Flow::Next`]) or
//! stops it with an [`ApiError`] ([`Flow::Halt`]). Once a stage halts, no
//! later stage and no handler runs.
//!
//! ```text
//! Pending ─▶ stage 0 ─Next─▶ stage 1 ─Next─▶ … ─Next─▶ handler ─▶ Completed
//!               │               │
//!               └─Halt(err)─────┴──────────────────────────────▶ Halted
//! ```
//!
//! Built-in stages:
//! - [`RequestLogger`]: one log line per request, never halts
//! - [`RequireApiKey`]: shared-secret header check for write routes
//! - [`ValidateBody`]: schema validation of the JSON body

use std::sync::Arc;

use crate::error::ApiError;
use crate::handler::BoxedHandler;
use crate::request::Request;
use crate::response::Response;

mod auth;
mod logger;
mod validate;

pub use auth::{RequireApiKey, authenticate};
pub use logger::RequestLogger;
pub use validate::ValidateBody;

/// Decision of a single stage.
#[derive(Debug, PartialEq)]
pub enum Flow {
    Next,
    Halt(ApiError),
}

/// One cross-cutting check run before the handler.
pub trait Stage: Send + Sync + 'static {
    /// Short name used in logs when the stage halts.
    fn name(&self) -> &'static str;

    fn run(&self, req: &mut Request) -> Flow;
}

/// Terminal state of a chain run.
#[derive(Debug)]
pub enum Outcome {
    /// Every stage passed and the handler produced a response.
    Completed(Response),
    /// A stage stopped the request.
    Halted { stage: &'static str, error: ApiError },
}

impl Outcome {
    pub fn into_response(self) -> Response {
        match self {
            Self::Completed(resp) => resp,
            Self::Halted { error, .. } => Response::failure(&error),
        }
    }
}

/// Ordered, cheaply clonable list of stages.
#[derive(Clone, Default)]
pub struct Chain {
    stages: Vec<Arc<dyn Stage>>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage. Returns `self` for chaining.
    pub fn stage(mut self, stage: impl Stage) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    /// Runs the stages in order, stopping at the first halt.
    pub fn check(&self, req: &mut Request) -> Result<(), (&'static str, ApiError)> {
        run_stages(&self.stages, req)
    }

    /// Runs `prefix`, then `self`, then `handler`.
    pub(crate) async fn execute(&self, prefix: &Chain, mut req: Request, handler: &BoxedHandler) -> Outcome {
        let stages = prefix.stages.iter().chain(self.stages.iter());
        if let Err((stage, error)) = run_stages(stages, &mut req) {
            return Outcome::Halted { stage, error };
        }
        Outcome::Completed(handler.call(req).await)
    }
}

fn run_stages<'a>(
    stages: impl IntoIterator<Item = &'a Arc<dyn Stage>>,
    req: &mut Request,
) -> Result<(), (&'static str, ApiError)> {
    for stage in stages {
        match stage.run(req) {
            Flow::Next => continue,
            Flow::Halt(error) => return Err((stage.name(), error)),
        }
    }
    Ok(())
}
