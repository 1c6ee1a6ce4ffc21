//! # fixedfield
//!
//! Converts records to and from fixed-width byte layouts, as found in
//! mainframe extracts and other legacy fixed-field files.
//!
//! Each field of a record occupies a known number of bytes, described by
//! annotations: its `length`, a `repeat` count for repeated fields, an
//! `encoding` (`ascii`, big-endian or little-endian binary), the `trueChars`
//! of ASCII booleans, and the `padding` used for ASCII numerics. Fields may
//! themselves be records, whose bytes follow on directly in the stream.
//!
//! A [RecordLayout] is compiled into a [Schema] of field descriptors, which
//! then decodes bytes into a [Record] and encodes a [Record] back into bytes.
//! Types implementing [FixedRecord] can skip the intermediate record with
//! [unmarshal] and [marshal].
//!
//! ## Example
//!
//! ```
//! use fixedfield::{Field, RecordLayout, Schema, Value};
//!
//! let layout = RecordLayout::new("Person")
//!     .field(Field::new::<String>("Name").length("5"))
//!     .field(Field::new::<i64>("Age").length("2").encoding("ascii"));
//! let schema = Schema::compile(&layout).unwrap();
//!
//! let record = schema.unmarshal(b"Geoff36").unwrap();
//! assert_eq!(record.get("Age"), Some(&Value::Int(36)));
//! assert_eq!(schema.marshal(&record).unwrap(), b"Geoff36");
//! ```

pub mod decode;
pub mod descriptor;
pub mod encode;
pub mod encoding;
pub mod errors;
pub mod field;
pub mod schema;
#[cfg(feature = "serde")]
pub mod serde;
pub mod value;

pub use encoding::Encoding;
pub use errors::{CompileError, Error, ReadError, WriteError};
pub use field::{Annotations, Field, FieldType, RecordLayout, ScalarType};
pub use schema::Schema;
pub use value::{FieldValue, FixedRecord, Record, Value};

/// Decodes a `R` from the start of `data`.
pub fn unmarshal<R: FixedRecord>(data: &[u8]) -> Result<R, Error> {
    let schema = Schema::compile(&R::layout())?;
    let record = schema.unmarshal(data)?;
    Ok(R::from_record(record)?)
}

/// Encodes `record` into a new buffer.
pub fn marshal<R: FixedRecord>(record: &R) -> Result<Vec<u8>, Error> {
    let schema = Schema::compile(&R::layout())?;
    Ok(schema.marshal(&record.to_record())?)
}
