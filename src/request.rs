//! Incoming HTTP request type.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::method::Method;
use crate::query::QueryParams;

/// An incoming HTTP request with its body fully buffered.
///
/// Middleware stages get `&mut Request`; the body validation stage parks the
/// normalized payload here so the handler never re-parses the raw bytes.
pub struct Request {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: QueryParams,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Vec<u8>,
    pub(crate) params: HashMap<String, String>,
    pub(crate) payload: Option<Map<String, Value>>,
}

impl Request {
    pub(crate) fn new(
        method: Method,
        path: String,
        query: QueryParams,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
        params: HashMap<String, String>,
    ) -> Self {
        Self { method, path, query, headers, body, params, payload: None }
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn query(&self) -> &QueryParams { &self.query }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/api/products/{id}`, `req.param("id")` on `/api/products/42`
    /// returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// The body as normalized by the validation stage, if one ran.
    pub fn validated(&self) -> Option<&Map<String, Value>> {
        self.payload.as_ref()
    }

    /// Takes ownership of the validated payload.
    pub fn take_validated(&mut self) -> Option<Map<String, Value>> {
        self.payload.take()
    }

    pub(crate) fn set_validated(&mut self, fields: Map<String, Value>) {
        self.payload = Some(fields);
    }
}

#[cfg(test)]
impl Request {
    /// Builds a request without going through the server, for stage and
    /// handler tests.
    pub(crate) fn mock(method: Method, path: &str) -> Self {
        Self::new(
            method,
            path.to_owned(),
            QueryParams::default(),
            Vec::new(),
            Vec::new(),
            HashMap::new(),
        )
    }

    pub(crate) fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    pub(crate) fn with_body(mut self, body: &str) -> Self {
        self.body = body.as_bytes().to_vec();
        self
    }

    pub(crate) fn with_param(mut self, key: &str, value: &str) -> Self {
        self.params.insert(key.to_owned(), value.to_owned());
        self
    }

    pub(crate) fn with_query(mut self, raw: &str) -> Self {
        self.query = QueryParams::parse(raw);
        self
    }
}
