//! JSON-deserializable layout description.
//!
//! These types describe a record layout so that it can ship as a file next to
//! the data it describes, then be converted into a [crate::field::RecordLayout]
//! and compiled like a layout written in code.
//!
//! ```json
//! {
//!   "name": "Person",
//!   "fields": [
//!     { "name": "Name", "type": "scalar", "scalar": "string", "length": "5" },
//!     { "name": "Age", "type": "scalar", "scalar": "int", "length": "2", "encoding": "ascii" }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

/// Top-level description of one record type.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RecordDef {
    /// Type name reported in error messages.
    pub name: String,
    /// Fields in byte order.
    pub fields: Vec<FieldDef>,
}

/// Description of a single field.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FieldDef {
    pub name: String,
    #[serde(flatten)]
    pub ty: FieldTypeDef,
    #[serde(flatten)]
    pub annotations: AnnotationsDef,
}

/// Shape of a field.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldTypeDef {
    /// A single value.
    Scalar { scalar: ScalarDef },
    /// A fixed number of values; the count comes from the `repeat` annotation.
    Repeated { scalar: ScalarDef },
    /// A nested record whose bytes follow on directly.
    Record { record: RecordDef },
}

/// Native category of a value.
#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum ScalarDef {
    String,
    Int,
    Uint,
    Float32,
    Float64,
    Bool,
}

/// Layout annotations, written as strings exactly like annotations in code.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AnnotationsDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(
        default,
        rename = "trueChars",
        skip_serializing_if = "Option::is_none"
    )]
    pub true_chars: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding: Option<String>,
}
