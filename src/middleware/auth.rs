//! Shared-secret API key check.

use super::{Flow, Stage};
use crate::error::ApiError;
use crate::request::Request;

/// Compares the presented credential with the configured secret.
///
/// Absent (or blank) credential → "API key is required"; mismatch →
/// "Invalid API key". The comparison does not short-circuit on the first
/// differing byte.
pub fn authenticate(presented: Option<&str>, secret: &str) -> Result<(), ApiError> {
    let presented = presented
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| ApiError::unauthenticated("API key is required"))?;
    if constant_time_eq(presented.as_bytes(), secret.as_bytes()) {
        Ok(())
    } else {
        Err(ApiError::unauthenticated("Invalid API key"))
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Halts with `Unauthenticated` unless the configured header carries the
/// secret.
#[derive(Clone)]
pub struct RequireApiKey {
    header: String,
    secret: String,
}

impl RequireApiKey {
    pub fn new(header: impl Into<String>, secret: impl Into<String>) -> Self {
        Self { header: header.into(), secret: secret.into() }
    }
}

impl Stage for RequireApiKey {
    fn name(&self) -> &'static str {
        "auth"
    }

    fn run(&self, req: &mut Request) -> Flow {
        match authenticate(req.header(&self.header), &self.secret) {
            Ok(()) => Flow::Next,
            Err(e) => Flow::Halt(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::Method;

    #[test]
    fn missing_key_is_required() {
        assert_eq!(authenticate(None, "s3cret"), Err(ApiError::unauthenticated("API key is required")));
        assert_eq!(authenticate(Some("  "), "s3cret"), Err(ApiError::unauthenticated("API key is required")));
    }

    #[test]
    fn wrong_key_is_invalid() {
        assert_eq!(authenticate(Some("guess"), "s3cret"), Err(ApiError::unauthenticated("Invalid API key")));
        assert_eq!(authenticate(Some("s3cres"), "s3cret"), Err(ApiError::unauthenticated("Invalid API key")));
    }

    #[test]
    fn matching_key_is_allowed() {
        assert_eq!(authenticate(Some("s3cret"), "s3cret"), Ok(()));
    }

    #[test]
    fn stage_reads_header_case_insensitively() {
        let stage = RequireApiKey::new("x-api-key", "s3cret");
        let mut req = Request::mock(Method::Post, "/api/products").with_header("X-API-Key", "s3cret");
        assert_eq!(stage.run(&mut req), Flow::Next);
        assert_eq!(req.header("x-api-key"), Some("s3cret"));

        let mut bare = Request::mock(Method::Post, "/api/products");
        assert_eq!(stage.run(&mut bare), Flow::Halt(ApiError::unauthenticated("API key is required")));
    }
}
