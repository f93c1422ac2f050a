//! Outgoing HTTP response type, the JSON envelope, and the [`IntoResponse`]
//! conversion trait.
//!
//! Every API answer uses one of two envelope shapes:
//!
//! ```text
//! { "success": true,  "data": <payload>, "pagination"?: <PageMetadata> }
//! { "success": false, "error": "<message>" }
//! ```
//!
//! Handlers return [`Envelope`] on success and [`ApiError`] on failure; the
//! `Result` impl of [`IntoResponse`] picks the right shape.

use bytes::Bytes;
use http_body_util::Full;
use serde::Serialize;

use crate::error::ApiError;
use crate::query::PageMetadata;
use crate::status::Status;

const JSON: &str = "application/json";
const TEXT: &str = "text/plain; charset=utf-8";

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// ```rust
/// use catalog::{Response, Status};
///
/// Response::json(br#"{"id":1}"#.to_vec());
/// Response::text("hello");
/// Response::status(Status::NoContent);
/// ```
#[derive(Debug)]
pub struct Response {
    pub(crate) body: Vec<u8>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) status: Status,
}

impl Response {
    /// `200 OK`: `application/json`.
    pub fn json(body: Vec<u8>) -> Self {
        Self::builder().json(body)
    }

    /// `200 OK`: `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::builder().text(body)
    }

    /// Response with no body.
    pub fn status(code: Status) -> Self {
        Self { body: Vec::new(), headers: Vec::new(), status: code }
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: Vec::new(), status: Status::Ok }
    }

    /// Renders `err` as a failure envelope with its mapped status.
    pub fn failure(err: &ApiError) -> Self {
        let message = err.to_string();
        let body = FailureBody { success: false, error: &message };
        match serde_json::to_vec(&body) {
            Ok(bytes) => Self::builder().status(err.status()).json(bytes),
            Err(_) => Self::status(Status::InternalServerError),
        }
    }

    pub fn status_code(&self) -> Status { self.status }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub(crate) fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut builder = http::Response::builder().status(http::StatusCode::from(self.status));
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
            .body(Full::new(Bytes::from(self.body)))
            .unwrap_or_else(|_| {
                let mut fallback = http::Response::new(Full::new(Bytes::new()));
                *fallback.status_mut() = http::StatusCode::INTERNAL_SERVER_ERROR;
                fallback
            })
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `Status::Ok` (200).
pub struct ResponseBuilder {
    headers: Vec<(String, String)>,
    status: Status,
}

impl ResponseBuilder {
    pub fn status(mut self, code: Status) -> Self {
        self.status = code;
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Terminate with a JSON body (`application/json`).
    pub fn json(self, body: Vec<u8>) -> Response {
        self.finish(JSON, body)
    }

    /// Terminate with a plain-text body (`text/plain; charset=utf-8`).
    pub fn text(self, body: impl Into<String>) -> Response {
        self.finish(TEXT, body.into().into_bytes())
    }

    fn finish(self, content_type: &str, body: Vec<u8>) -> Response {
        let mut headers = vec![("content-type".to_owned(), content_type.to_owned())];
        headers.extend(self.headers);
        Response { body, headers, status: self.status }
    }
}

// ── Envelope ──────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct SuccessBody<'a, T> {
    success: bool,
    data: &'a T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pagination: Option<&'a PageMetadata>,
}

#[derive(Serialize)]
struct FailureBody<'a> {
    success: bool,
    error: &'a str,
}

/// A successful API answer: `{ "success": true, "data": ..., "pagination"? }`.
#[derive(Debug)]
pub struct Envelope<T> {
    status: Status,
    data: T,
    pagination: Option<PageMetadata>,
}

impl<T: Serialize> Envelope<T> {
    /// `200 OK`.
    pub fn ok(data: T) -> Self {
        Self { status: Status::Ok, data, pagination: None }
    }

    /// `201 Created`.
    pub fn created(data: T) -> Self {
        Self { status: Status::Created, data, pagination: None }
    }

    pub fn with_pagination(mut self, meta: PageMetadata) -> Self {
        self.pagination = Some(meta);
        self
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        let body = SuccessBody {
            success: true,
            data: &self.data,
            pagination: self.pagination.as_ref(),
        };
        match serde_json::to_vec(&body) {
            Ok(bytes) => Response::builder().status(self.status).json(bytes),
            Err(e) => Response::failure(&ApiError::internal(format!("failed to encode response: {e}"))),
        }
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
///
/// Implemented for [`Response`], [`Envelope`], [`ApiError`], [`Status`],
/// strings, and `Result`s of those, so handlers can use `?` freely.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response { Response::text(self) }
}

impl IntoResponse for String {
    fn into_response(self) -> Response { Response::text(self) }
}

/// Return a [`Status`] directly from a handler: `return Status::NoContent`
impl IntoResponse for Status {
    fn into_response(self) -> Response { Response::status(self) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response { Response::failure(&self) }
}

impl<T, E> IntoResponse for Result<T, E>
where
    T: IntoResponse,
    E: IntoResponse,
{
    fn into_response(self) -> Response {
        match self {
            Ok(v) => v.into_response(),
            Err(e) => e.into_response(),
        }
    }
}
