//! Decoded values and the bridge between them and native Rust types.

use bytes::Bytes;

use crate::{
    errors::ReadError,
    field::{FieldType, RecordLayout, ScalarType},
};

/// A value decoded from, or to be encoded into, a field's bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    /// A string block that is not valid UTF-8, kept byte for byte.
    Bytes(Bytes),
    Int(i64),
    UInt(u64),
    Float32(f32),
    Float64(f64),
    Bool(bool),
    /// The elements of a repeated field, in stream order.
    Array(Vec<Value>),
    /// A nested record.
    Record(Record),
}

/// Named values of one record, in layout order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    name: String,
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new(name: impl Into<String>) -> Self {
        Record {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets `name` to `value`, replacing any previous value for that name.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Builder form of [Record::insert] for native values.
    pub fn with<T: FieldValue>(mut self, name: impl Into<String>, value: T) -> Self {
        self.insert(name, value.into_value());
        self
    }

    /// Builder form of [Record::insert] for nested records.
    pub fn with_record<R: FixedRecord>(mut self, name: impl Into<String>, record: &R) -> Self {
        self.insert(name, Value::Record(record.to_record()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Removes `name` from the record and converts it into `T`.
    pub fn take<T: FieldValue>(&mut self, name: &str) -> Result<T, ReadError> {
        let value = self.remove(name)?;
        T::from_value(value).ok_or_else(|| ReadError::TypeMismatch {
            record: self.name.clone(),
            field: name.to_string(),
            expected: std::any::type_name::<T>(),
        })
    }

    /// Removes the nested record `name` and converts it into `R`.
    pub fn take_record<R: FixedRecord>(&mut self, name: &str) -> Result<R, ReadError> {
        match self.remove(name)? {
            Value::Record(record) => R::from_record(record),
            _ => Err(ReadError::TypeMismatch {
                record: self.name.clone(),
                field: name.to_string(),
                expected: std::any::type_name::<R>(),
            }),
        }
    }

    fn remove(&mut self, name: &str) -> Result<Value, ReadError> {
        let index = self
            .fields
            .iter()
            .position(|(n, _)| n == name)
            .ok_or_else(|| ReadError::MissingField {
                record: self.name.clone(),
                field: name.to_string(),
            })?;
        Ok(self.fields.remove(index).1)
    }
}

/// A native Rust type that can occupy a field.
///
/// Implemented for `String`, [Bytes], the primitive integers up to 64 bits,
/// `f32`, `f64`, `bool`, and `Vec` of any of those.
pub trait FieldValue: Sized {
    /// The layout type a field of this native type has.
    fn field_type() -> FieldType;

    fn into_value(self) -> Value;

    /// Converts back from a decoded value. Returns `None` when the variant
    /// differs or the value does not fit in `Self`.
    fn from_value(value: Value) -> Option<Self>;
}

/// A [FieldValue] holding exactly one value, usable as a repeated element.
pub trait Scalar: FieldValue {
    const SCALAR: ScalarType;
}

macro_rules! impl_scalar {
    ($type:ty, $scalar:ident, $variant:ident, $wide:ty) => {
        impl FieldValue for $type {
            fn field_type() -> FieldType {
                FieldType::Scalar(ScalarType::$scalar)
            }

            fn into_value(self) -> Value {
                Value::$variant(<$wide>::from(self))
            }

            fn from_value(value: Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => <$type>::try_from(v).ok(),
                    _ => None,
                }
            }
        }

        impl Scalar for $type {
            const SCALAR: ScalarType = ScalarType::$scalar;
        }
    };
}

impl_scalar!(i8, SignedInteger, Int, i64);
impl_scalar!(i16, SignedInteger, Int, i64);
impl_scalar!(i32, SignedInteger, Int, i64);
impl_scalar!(i64, SignedInteger, Int, i64);
impl_scalar!(u8, UnsignedInteger, UInt, u64);
impl_scalar!(u16, UnsignedInteger, UInt, u64);
impl_scalar!(u32, UnsignedInteger, UInt, u64);
impl_scalar!(u64, UnsignedInteger, UInt, u64);
impl_scalar!(f32, Float32, Float32, f32);
impl_scalar!(f64, Float64, Float64, f64);
impl_scalar!(bool, Boolean, Bool, bool);

impl FieldValue for String {
    fn field_type() -> FieldType {
        FieldType::Scalar(ScalarType::String)
    }

    fn into_value(self) -> Value {
        Value::String(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(text) => Some(text),
            Value::Bytes(raw) => String::from_utf8(raw.to_vec()).ok(),
            _ => None,
        }
    }
}

impl Scalar for String {
    const SCALAR: ScalarType = ScalarType::String;
}

/// Raw string blocks, for extracts whose text is not UTF-8.
impl FieldValue for Bytes {
    fn field_type() -> FieldType {
        FieldType::Scalar(ScalarType::String)
    }

    fn into_value(self) -> Value {
        Value::Bytes(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(text) => Some(Bytes::from(text)),
            Value::Bytes(raw) => Some(raw),
            _ => None,
        }
    }
}

impl Scalar for Bytes {
    const SCALAR: ScalarType = ScalarType::String;
}

impl<T: Scalar> FieldValue for Vec<T> {
    fn field_type() -> FieldType {
        FieldType::Repeated(T::SCALAR)
    }

    fn into_value(self) -> Value {
        Value::Array(self.into_iter().map(FieldValue::into_value).collect())
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Array(items) => items.into_iter().map(T::from_value).collect(),
            _ => None,
        }
    }
}

/// A record type with a statically declared layout.
///
/// ```
/// use fixedfield::{Field, FixedRecord, ReadError, Record, RecordLayout};
///
/// struct Person {
///     name: String,
///     age: i64,
/// }
///
/// impl FixedRecord for Person {
///     fn layout() -> RecordLayout {
///         RecordLayout::new("Person")
///             .field(Field::new::<String>("Name").length("5"))
///             .field(Field::new::<i64>("Age").length("1"))
///     }
///
///     fn to_record(&self) -> Record {
///         Record::new("Person")
///             .with("Name", self.name.clone())
///             .with("Age", self.age)
///     }
///
///     fn from_record(mut record: Record) -> Result<Self, ReadError> {
///         Ok(Person {
///             name: record.take("Name")?,
///             age: record.take("Age")?,
///         })
///     }
/// }
///
/// let person: Person = fixedfield::unmarshal(b"Geoff\x25").unwrap();
/// assert_eq!(person.name, "Geoff");
/// assert_eq!(person.age, 37);
/// ```
pub trait FixedRecord: Sized {
    fn layout() -> RecordLayout;

    fn to_record(&self) -> Record;

    fn from_record(record: Record) -> Result<Self, ReadError>;
}
