//! Definition of record layouts: the fields of a record and the annotations
//! that describe how each one is laid out in bytes.

use std::fmt;

use crate::value::{FieldValue, FixedRecord};

/// Layout annotations attached to a single field, kept exactly as written.
///
/// Values are parsed when the layout is compiled, so a malformed annotation
/// surfaces as a [crate::errors::CompileError] rather than here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotations {
    /// Bytes per element. Defaults to 1.
    pub length: Option<String>,
    /// Number of elements for repeated fields. Defaults to 1.
    pub repeat: Option<String>,
    /// `ascii`, `bigendian`/`be`, `littleendian`/`le` or `byte`. Defaults to `LE`.
    pub encoding: Option<String>,
    /// Bytes that decode as `true` for ASCII booleans. Defaults to `Yy`.
    pub true_chars: Option<String>,
    /// Fill character for ASCII numerics. Defaults to a space.
    pub padding: Option<String>,
}

/// The native category of a single value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    String,
    SignedInteger,
    UnsignedInteger,
    Float32,
    Float64,
    Boolean,
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarType::String => "string",
            ScalarType::SignedInteger => "signed integer",
            ScalarType::UnsignedInteger => "unsigned integer",
            ScalarType::Float32 => "float32",
            ScalarType::Float64 => "float64",
            ScalarType::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

/// The shape of a field: one value, a fixed number of values, or a nested record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Scalar(ScalarType),
    Repeated(ScalarType),
    Record(RecordLayout),
}

/// A single named field of a [RecordLayout].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Name used in the decoded [crate::value::Record] and in error messages.
    pub name: String,
    pub ty: FieldType,
    pub annotations: Annotations,
}

impl Field {
    /// Creates a field whose type follows the native Rust type `T`.
    ///
    /// ```
    /// use fixedfield::field::{Field, FieldType, ScalarType};
    ///
    /// let age = Field::new::<i32>("Age").length("2").encoding("ascii");
    /// assert_eq!(age.ty, FieldType::Scalar(ScalarType::SignedInteger));
    /// ```
    pub fn new<T: FieldValue>(name: impl Into<String>) -> Self {
        Self::with_type(name, T::field_type())
    }

    /// Creates a field holding the nested record `R`.
    pub fn record<R: FixedRecord>(name: impl Into<String>) -> Self {
        Self::with_type(name, FieldType::Record(R::layout()))
    }

    pub fn with_type(name: impl Into<String>, ty: FieldType) -> Self {
        Field {
            name: name.into(),
            ty,
            annotations: Annotations::default(),
        }
    }

    pub fn length(mut self, length: impl Into<String>) -> Self {
        self.annotations.length = Some(length.into());
        self
    }

    pub fn repeat(mut self, repeat: impl Into<String>) -> Self {
        self.annotations.repeat = Some(repeat.into());
        self
    }

    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.annotations.encoding = Some(encoding.into());
        self
    }

    pub fn true_chars(mut self, true_chars: impl Into<String>) -> Self {
        self.annotations.true_chars = Some(true_chars.into());
        self
    }

    pub fn padding(mut self, padding: impl Into<String>) -> Self {
        self.annotations.padding = Some(padding.into());
        self
    }
}

#[cfg(feature = "serde")]
impl From<crate::serde::FieldDef> for Field {
    fn from(value: crate::serde::FieldDef) -> Self {
        Field {
            name: value.name,
            ty: value.ty.into(),
            annotations: value.annotations.into(),
        }
    }
}

#[cfg(feature = "serde")]
impl From<crate::serde::AnnotationsDef> for Annotations {
    fn from(value: crate::serde::AnnotationsDef) -> Self {
        Annotations {
            length: value.length,
            repeat: value.repeat,
            encoding: value.encoding,
            true_chars: value.true_chars,
            padding: value.padding,
        }
    }
}

#[cfg(feature = "serde")]
impl From<crate::serde::FieldTypeDef> for FieldType {
    fn from(value: crate::serde::FieldTypeDef) -> Self {
        use crate::serde::FieldTypeDef;

        match value {
            FieldTypeDef::Scalar { scalar } => FieldType::Scalar(scalar.into()),
            FieldTypeDef::Repeated { scalar } => FieldType::Repeated(scalar.into()),
            FieldTypeDef::Record { record } => FieldType::Record(record.into()),
        }
    }
}

#[cfg(feature = "serde")]
impl From<crate::serde::ScalarDef> for ScalarType {
    fn from(value: crate::serde::ScalarDef) -> Self {
        use crate::serde::ScalarDef;

        match value {
            ScalarDef::String => ScalarType::String,
            ScalarDef::Int => ScalarType::SignedInteger,
            ScalarDef::Uint => ScalarType::UnsignedInteger,
            ScalarDef::Float32 => ScalarType::Float32,
            ScalarDef::Float64 => ScalarType::Float64,
            ScalarDef::Bool => ScalarType::Boolean,
        }
    }
}

/// The ordered fields of one record type.
///
/// Field order is the byte order of the layout: the first field occupies the
/// first bytes of the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordLayout {
    /// Type name reported in error messages.
    pub name: String,
    pub fields: Vec<Field>,
}

impl RecordLayout {
    pub fn new(name: impl Into<String>) -> Self {
        RecordLayout {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Appends a field after the ones already declared.
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }
}

#[cfg(feature = "serde")]
impl From<crate::serde::RecordDef> for RecordLayout {
    fn from(value: crate::serde::RecordDef) -> Self {
        RecordLayout {
            name: value.name,
            fields: value.fields.into_iter().map(Into::into).collect(),
        }
    }
}
