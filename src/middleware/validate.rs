use super::{Flow, Stage};
use crate::request::Request;
use crate::validate::{FieldSpec, Mode, validate_body};

/// Validates the JSON body against a schema and parks the normalized fields
/// on the request for the handler.
#[derive(Clone, Copy)]
pub struct ValidateBody {
    schema: &'static [FieldSpec],
    mode: Mode,
}

impl ValidateBody {
    /// All required fields must be present.
    pub fn create(schema: &'static [FieldSpec]) -> Self {
        Self { schema, mode: Mode::Create }
    }

    /// Partial body: only the fields present are checked.
    pub fn update(schema: &'static [FieldSpec]) -> Self {
        Self { schema, mode: Mode::Update }
    }
}

impl Stage for ValidateBody {
    fn name(&self) -> &'static str {
        "validate"
    }

    fn run(&self, req: &mut Request) -> Flow {
        match validate_body(req.body(), self.schema, self.mode) {
            Ok(fields) => {
                req.set_validated(fields);
                Flow::Next
            }
            Err(e) => Flow::Halt(e),
        }
    }
}
