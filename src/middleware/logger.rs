use chrono::{SecondsFormat, Utc};
use tracing::info;

use super::{Flow, Stage};
use crate::request::Request;

/// Logs method, path and arrival time. Always passes the request on.
#[derive(Clone, Copy, Debug, Default)]
pub struct RequestLogger;

impl Stage for RequestLogger {
    fn name(&self) -> &'static str {
        "logger"
    }

    fn run(&self, req: &mut Request) -> Flow {
        info!(
            method = %req.method(),
            path = req.path(),
            timestamp = %Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            "request"
        );
        Flow::Next
    }
}
