//! Kubernetes health-check handlers.
//!
//! | Probe | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? |
//! | **Readiness** | `/readyz` | Can the store answer reads? |

use std::sync::Arc;

use crate::app::AppState;
use crate::{Request, Response, Status};

/// Always `200 OK` with body `"ok"`.
pub async fn liveness(_req: Request) -> Response {
    Response::text("ok")
}

/// `200 OK` with `"ready"` when the store can be read, `503` otherwise.
pub async fn readiness(state: Arc<AppState>, _req: Request) -> Response {
    match state.store.list() {
        Ok(_) => Response::text("ready"),
        Err(e) => Response::builder()
            .status(Status::ServiceUnavailable)
            .text(e.to_string()),
    }
}
