//! Field-level validation of JSON request bodies.
//!
//! A schema is an ordered slice of [`FieldSpec`]s. [`validate`] checks every
//! field, collects every violation in schema order, and either returns the
//! normalized fields or a single [`ApiError::ValidationFailed`] listing all of
//! them.
//!
//! Normalization: strings are trimmed (and lower-cased where asked), numbers
//! given as numeric strings are parsed. Only fields named in the schema are
//! copied into the output, so unknown keys and `id` are dropped silently.
//! Defaults for absent optional fields are the caller's business.

use serde_json::{Map, Value};

use crate::error::ApiError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Boolean,
}

/// Rules for one input field. For text, `min`/`max` bound the character
/// count; for numbers they bound the value.
#[derive(Clone, Copy, Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub trim: bool,
    pub lowercase: bool,
}

impl FieldSpec {
    const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind, required: false, min: None, max: None, trim: false, lowercase: false }
    }

    pub const fn text(name: &'static str) -> Self { Self::new(name, FieldKind::Text) }
    pub const fn number(name: &'static str) -> Self { Self::new(name, FieldKind::Number) }
    pub const fn boolean(name: &'static str) -> Self { Self::new(name, FieldKind::Boolean) }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub const fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub const fn trim(mut self) -> Self {
        self.trim = true;
        self
    }

    pub const fn lowercase(mut self) -> Self {
        self.lowercase = true;
        self
    }
}

/// Whether absent required fields are violations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Every required field must be present.
    Create,
    /// Absent fields are fine; present fields are checked as usual.
    Update,
}

/// Parses a raw body and validates it. An empty body counts as `{}`.
pub fn validate_body(body: &[u8], schema: &[FieldSpec], mode: Mode) -> Result<Map<String, Value>, ApiError> {
    let input: Value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Object(Map::new())
    } else {
        serde_json::from_slice(body).map_err(|_| ApiError::invalid("Request body must be valid JSON"))?
    };
    validate(&input, schema, mode)
}

/// Checks `input` against `schema`, reporting every violation at once.
pub fn validate(input: &Value, schema: &[FieldSpec], mode: Mode) -> Result<Map<String, Value>, ApiError> {
    let Some(object) = input.as_object() else {
        return Err(ApiError::invalid("Request body must be a JSON object"));
    };

    let mut normalized = Map::new();
    let mut errors = Vec::new();

    for spec in schema {
        match object.get(spec.name) {
            None | Some(Value::Null) => {
                if spec.required && mode == Mode::Create {
                    errors.push(format!("{} is required", spec.name));
                }
            }
            Some(raw) => match check(spec, raw) {
                Ok(value) => {
                    normalized.insert(spec.name.to_owned(), value);
                }
                Err(message) => errors.push(message),
            },
        }
    }

    if errors.is_empty() {
        Ok(normalized)
    } else {
        Err(ApiError::ValidationFailed(errors))
    }
}

fn check(spec: &FieldSpec, raw: &Value) -> Result<Value, String> {
    let name = spec.name;
    match spec.kind {
        FieldKind::Text => {
            let Some(s) = raw.as_str() else {
                return Err(format!("{name} must be a string"));
            };
            let mut s = if spec.trim { s.trim().to_owned() } else { s.to_owned() };
            if spec.lowercase {
                s = s.to_lowercase();
            }
            let len = s.chars().count() as f64;
            if spec.required && len == 0.0 {
                return Err(format!("{name} cannot be empty"));
            }
            if let Some(min) = spec.min.filter(|m| len < *m) {
                return Err(format!("{name} must be at least {min} characters"));
            }
            if let Some(max) = spec.max.filter(|m| len > *m) {
                return Err(format!("{name} must be at most {max} characters"));
            }
            Ok(Value::String(s))
        }
        FieldKind::Number => {
            let n = match raw {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            let Some(n) = n.filter(|n| n.is_finite()) else {
                return Err(format!("{name} must be a number"));
            };
            if let Some(min) = spec.min.filter(|m| n < *m) {
                return Err(if min == 0.0 {
                    format!("{name} must be a non-negative number")
                } else {
                    format!("{name} must be at least {min}")
                });
            }
            if let Some(max) = spec.max.filter(|m| n > *m) {
                return Err(format!("{name} must be at most {max}"));
            }
            Ok(Value::from(n))
        }
        FieldKind::Boolean => match raw {
            Value::Bool(b) => Ok(Value::Bool(*b)),
            _ => Err(format!("{name} must be a boolean")),
        },
    }
}
