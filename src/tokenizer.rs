//! Tokenizer seam: turns raw diagram and field-list text into field primitives.
//!
//! The extractor only depends on [`Tokenizer`]; [`crate::parser::PestTokenizer`] is the
//! grammar-based implementation shipped with the crate. Entry points are independent
//! and keep no state between calls.

use crate::ast::{ArtField, Attributes, Field, RelLoc};
use std::fmt;

/// Which entry point failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPoint {
    Diagram,
    FieldTitle,
    ControlFields,
    FieldBody,
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntryPoint::Diagram => "diagram",
            EntryPoint::FieldTitle => "field title",
            EntryPoint::ControlFields => "control fields",
            EntryPoint::FieldBody => "field body",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TokenizeError {
    #[error("{entry} parse error: {message}")]
    Syntax { entry: EntryPoint, message: String },
    #[error("diagram line {line}: {message}")]
    Diagram { line: usize, message: String },
    #[error("{entry}: {message}")]
    Invalid { entry: EntryPoint, message: String },
}

pub trait Tokenizer {
    /// Ordered field cells of one packet diagram.
    fn diagram(&self, text: &str) -> Result<Vec<ArtField>, TokenizeError>;

    /// Field from a title line such as `Source Port (SP): 16 bits`.
    fn field_title(&self, text: &str) -> Result<(Field, Attributes), TokenizeError>;

    /// Sub-bit fields listed in the body of a control-bit group.
    fn control_fields(&self, text: &str) -> Result<Vec<Field>, TokenizeError>;

    /// Parse a field's description into `field` (description, constraints) and
    /// return any relative-location directives it contains.
    fn field_body(&self, field: &mut Field, text: &str) -> Result<Vec<RelLoc>, TokenizeError>;
}

impl<T: Tokenizer + ?Sized> Tokenizer for &T {
    fn diagram(&self, text: &str) -> Result<Vec<ArtField>, TokenizeError> {
        (**self).diagram(text)
    }

    fn field_title(&self, text: &str) -> Result<(Field, Attributes), TokenizeError> {
        (**self).field_title(text)
    }

    fn control_fields(&self, text: &str) -> Result<Vec<Field>, TokenizeError> {
        (**self).control_fields(text)
    }

    fn field_body(&self, field: &mut Field, text: &str) -> Result<Vec<RelLoc>, TokenizeError> {
        (**self).field_body(field, text)
    }
}
