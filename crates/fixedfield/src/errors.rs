//! Error types for schema compilation, decoding and encoding.

use thiserror::Error;

use crate::field::ScalarType;

/// Errors produced when compiling a [crate::field::RecordLayout] into a [crate::schema::Schema].
///
/// Every variant indicates a defect in how the layout was authored.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// An annotation that must hold a non-negative integer could not be parsed.
    #[error("invalid {annotation} annotation {value:?} on {record}.{field}")]
    InvalidInteger {
        record: String,
        field: String,
        annotation: &'static str,
        value: String,
    },
    /// The encoding is not one the field's category understands.
    #[error(
        "failure compiling {category} field '{record}.{field}': encoding {encoding:?} is not supported, expected one of {expected}"
    )]
    UnsupportedEncoding {
        record: String,
        field: String,
        category: ScalarType,
        encoding: String,
        expected: &'static str,
    },
    /// The declared length cannot hold a value of this category in the chosen encoding.
    #[error("{category} field '{record}.{field}' cannot be {length} bytes long, expected {expected}")]
    InvalidLength {
        record: String,
        field: String,
        category: ScalarType,
        length: usize,
        expected: &'static str,
    },
    /// A repeat count was declared on a field that holds a single value.
    #[error("field '{record}.{field}' declares repeat {repeat} but is not a repeated field")]
    UnexpectedRepeat {
        record: String,
        field: String,
        repeat: usize,
    },
    /// The padding annotation must be exactly one byte.
    #[error("padding {padding:?} on {record}.{field} must be a single byte")]
    InvalidPadding {
        record: String,
        field: String,
        padding: String,
    },
    /// Two fields of the same record share a name.
    #[error("duplicate field '{record}.{field}'")]
    DuplicateField { record: String, field: String },
    /// A nested record field refers to a layout with no fields.
    #[error("nested record '{record}.{field}' of type {nested} has no fields")]
    EmptyRecord {
        record: String,
        field: String,
        nested: String,
    },
    /// The byte size of a field or record does not fit in `usize`.
    #[error("size of '{record}.{field}' overflows")]
    SizeOverflow { record: String, field: String },
}

/// Errors produced while decoding bytes into a [crate::value::Record].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    /// The stream ended before a field's bytes were available.
    #[error("buffer underrun, {delivered} of {requested} bytes read")]
    Underrun { requested: usize, delivered: usize },
    /// ASCII text did not parse as the field's type.
    #[error("failure parsing {category} field '{record}.{field}' from {text:?}")]
    Parse {
        record: String,
        field: String,
        category: ScalarType,
        text: String,
    },
    /// A binary block has a width the field's category cannot be read from.
    #[error("{category} field '{record}.{field}' cannot be read from {length} bytes")]
    InvalidWidth {
        record: String,
        field: String,
        category: ScalarType,
        length: usize,
    },
    /// A decoded record did not contain a field the caller asked for.
    #[error("missing field '{record}.{field}'")]
    MissingField { record: String, field: String },
    /// A decoded value could not be converted into the requested native type.
    #[error("field '{record}.{field}' does not hold a value of type {expected}")]
    TypeMismatch {
        record: String,
        field: String,
        expected: &'static str,
    },
}

/// Errors produced while encoding a [crate::value::Record] into bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WriteError {
    /// The rendered value does not fit in the declared field length.
    #[error("{record}.{field}: value {text:?} does not fit in {length} bytes")]
    Overflow {
        record: String,
        field: String,
        text: String,
        length: usize,
    },
    /// A binary block has a width the field's category cannot be written to.
    #[error("{category} field '{record}.{field}' cannot be written to {length} bytes")]
    InvalidWidth {
        record: String,
        field: String,
        category: ScalarType,
        length: usize,
    },
    /// The value has no byte representation in the field's encoding.
    #[error("{record}.{field}: {value} cannot be represented")]
    Unrepresentable {
        record: String,
        field: String,
        value: String,
    },
    /// The record has no value for a field of the schema.
    #[error("missing field '{record}.{field}'")]
    MissingField { record: String, field: String },
    /// The record holds a value of a different kind than the schema declares.
    #[error("field '{record}.{field}' expects a {expected} value")]
    TypeMismatch {
        record: String,
        field: String,
        expected: String,
    },
    /// A repeated field holds a different number of elements than declared.
    #[error("field '{record}.{field}' holds {found} elements, expected {expected}")]
    RepeatMismatch {
        record: String,
        field: String,
        expected: usize,
        found: usize,
    },
}

/// Any error produced by [crate::unmarshal] or [crate::marshal].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Read(#[from] ReadError),
    #[error(transparent)]
    Write(#[from] WriteError),
}
