//! Encode engine: writes a record's fields in descriptor order.
//!
//! Every category and encoding the decode engine reads can be written back,
//! so decoding the output of a successful encode yields the same record.
//! Strings are the exception to length enforcement: they are written
//! verbatim, whatever their length.

use bytes::BufMut;
use tracing::{debug, trace};

use crate::{
    descriptor::{Descriptor, DescriptorKind, Leaf},
    encoding::Encoding,
    errors::WriteError,
    field::ScalarType,
    value::{Record, Value},
};

/// Bytes tried, in order, to represent `false` in an ASCII boolean.
const FALSE_CANDIDATES: &[u8] = b"Nn0 \0";

/// Writes every field of `record` described by `descriptors` into `buf`.
pub fn encode_record(
    record: &Record,
    descriptors: &[Descriptor],
    buf: &mut impl BufMut,
) -> Result<(), WriteError> {
    for descriptor in descriptors {
        let value = record
            .get(&descriptor.name)
            .ok_or_else(|| WriteError::MissingField {
                record: descriptor.record.clone(),
                field: descriptor.name.clone(),
            })?;
        encode_field(descriptor, value, buf)?;
    }
    Ok(())
}

fn encode_field(
    descriptor: &Descriptor,
    value: &Value,
    buf: &mut impl BufMut,
) -> Result<(), WriteError> {
    let result = match (&descriptor.kind, value) {
        (DescriptorKind::Scalar(leaf), _) => encode_scalar(descriptor, leaf, value, buf),
        (DescriptorKind::Repeated(leaf), Value::Array(items)) => {
            encode_repeated(descriptor, leaf, items, buf)
        }
        (DescriptorKind::Nested { children, .. }, Value::Record(nested)) => {
            return encode_record(nested, children, buf);
        }
        (DescriptorKind::Repeated(_), _) => Err(mismatch(descriptor, "array")),
        (DescriptorKind::Nested { record, .. }, _) => Err(mismatch(descriptor, record)),
    };

    match &result {
        Ok(()) => trace!(
            record = %descriptor.record,
            field = %descriptor.name,
            size = descriptor.size(),
            "encoded field"
        ),
        Err(err) => debug!(
            record = %descriptor.record,
            field = %descriptor.name,
            ?err,
            "failed to encode field"
        ),
    }
    result
}

fn encode_repeated(
    descriptor: &Descriptor,
    leaf: &Leaf,
    items: &[Value],
    buf: &mut impl BufMut,
) -> Result<(), WriteError> {
    if items.len() != leaf.repeat {
        return Err(WriteError::RepeatMismatch {
            record: descriptor.record.clone(),
            field: descriptor.name.clone(),
            expected: leaf.repeat,
            found: items.len(),
        });
    }
    for item in items {
        encode_scalar(descriptor, leaf, item, buf)?;
    }
    Ok(())
}

fn encode_scalar(
    descriptor: &Descriptor,
    leaf: &Leaf,
    value: &Value,
    buf: &mut impl BufMut,
) -> Result<(), WriteError> {
    match (leaf.scalar, leaf.encoding, value) {
        (ScalarType::String, _, Value::String(s)) => {
            buf.put_slice(s.as_bytes());
            Ok(())
        }
        (ScalarType::String, _, Value::Bytes(raw)) => {
            buf.put_slice(raw);
            Ok(())
        }

        (ScalarType::SignedInteger, Encoding::Ascii, Value::Int(v)) => {
            write_ascii(descriptor, leaf, v.to_string(), buf)
        }
        (ScalarType::SignedInteger, encoding, Value::Int(v)) => {
            write_signed(descriptor, leaf, *v, encoding, buf)
        }

        (ScalarType::UnsignedInteger, Encoding::Ascii, Value::UInt(v)) => {
            write_ascii(descriptor, leaf, v.to_string(), buf)
        }
        (ScalarType::UnsignedInteger, encoding, Value::UInt(v)) => {
            write_unsigned(descriptor, leaf, *v, encoding, buf)
        }

        (ScalarType::Float32, Encoding::Ascii, Value::Float32(v)) => {
            write_ascii(descriptor, leaf, v.to_string(), buf)
        }
        (ScalarType::Float64, Encoding::Ascii, Value::Float64(v)) => {
            write_ascii(descriptor, leaf, v.to_string(), buf)
        }
        (ScalarType::Float32, encoding, Value::Float32(v)) => {
            write_float(descriptor, leaf, *v as f64, encoding, buf)
        }
        (ScalarType::Float64, encoding, Value::Float64(v)) => {
            write_float(descriptor, leaf, *v, encoding, buf)
        }

        (ScalarType::Boolean, _, Value::Bool(_)) if leaf.length != 1 => {
            Err(width_error(descriptor, leaf))
        }
        (ScalarType::Boolean, Encoding::Ascii, Value::Bool(v)) => {
            let byte = if *v {
                leaf.true_bytes.first().copied()
            } else {
                FALSE_CANDIDATES
                    .iter()
                    .copied()
                    .find(|b| !leaf.true_bytes.contains(b))
            };
            let byte = byte.ok_or_else(|| WriteError::Unrepresentable {
                record: descriptor.record.clone(),
                field: descriptor.name.clone(),
                value: v.to_string(),
            })?;
            buf.put_u8(byte);
            Ok(())
        }
        (ScalarType::Boolean, _, Value::Bool(v)) => {
            buf.put_u8(u8::from(*v));
            Ok(())
        }

        _ => Err(mismatch(descriptor, &leaf.scalar.to_string())),
    }
}

/// Right-justifies `text` in a field of exactly `leaf.length` bytes.
///
/// A digit padding puts the sign in front of the fill, as `%010d` does.
fn write_ascii(
    descriptor: &Descriptor,
    leaf: &Leaf,
    text: String,
    buf: &mut impl BufMut,
) -> Result<(), WriteError> {
    if text.len() > leaf.length {
        return Err(WriteError::Overflow {
            record: descriptor.record.clone(),
            field: descriptor.name.clone(),
            text,
            length: leaf.length,
        });
    }
    let fill = leaf.length - text.len();

    if leaf.padding.is_ascii_digit() {
        let (sign, digits) = match text.strip_prefix('-') {
            Some(digits) => ("-", digits),
            None => ("", text.as_str()),
        };
        buf.put_slice(sign.as_bytes());
        buf.put_bytes(leaf.padding, fill);
        buf.put_slice(digits.as_bytes());
    } else {
        buf.put_bytes(leaf.padding, fill);
        buf.put_slice(text.as_bytes());
    }
    Ok(())
}

fn write_signed(
    descriptor: &Descriptor,
    leaf: &Leaf,
    value: i64,
    encoding: Encoding,
    buf: &mut impl BufMut,
) -> Result<(), WriteError> {
    let little = encoding == Encoding::LittleEndian;
    let overflow = || overflow_error(descriptor, leaf, value.to_string());
    match (leaf.length, little) {
        (1, _) => buf.put_i8(i8::try_from(value).map_err(|_| overflow())?),
        (2, false) => buf.put_i16(i16::try_from(value).map_err(|_| overflow())?),
        (2, true) => buf.put_i16_le(i16::try_from(value).map_err(|_| overflow())?),
        (4, false) => buf.put_i32(i32::try_from(value).map_err(|_| overflow())?),
        (4, true) => buf.put_i32_le(i32::try_from(value).map_err(|_| overflow())?),
        (8, false) => buf.put_i64(value),
        (8, true) => buf.put_i64_le(value),
        _ => return Err(width_error(descriptor, leaf)),
    }
    Ok(())
}

fn write_unsigned(
    descriptor: &Descriptor,
    leaf: &Leaf,
    value: u64,
    encoding: Encoding,
    buf: &mut impl BufMut,
) -> Result<(), WriteError> {
    let little = encoding == Encoding::LittleEndian;
    let overflow = || overflow_error(descriptor, leaf, value.to_string());
    match (leaf.length, little) {
        (1, _) => buf.put_u8(u8::try_from(value).map_err(|_| overflow())?),
        (2, false) => buf.put_u16(u16::try_from(value).map_err(|_| overflow())?),
        (2, true) => buf.put_u16_le(u16::try_from(value).map_err(|_| overflow())?),
        (4, false) => buf.put_u32(u32::try_from(value).map_err(|_| overflow())?),
        (4, true) => buf.put_u32_le(u32::try_from(value).map_err(|_| overflow())?),
        (8, false) => buf.put_u64(value),
        (8, true) => buf.put_u64_le(value),
        _ => return Err(width_error(descriptor, leaf)),
    }
    Ok(())
}

fn write_float(
    descriptor: &Descriptor,
    leaf: &Leaf,
    value: f64,
    encoding: Encoding,
    buf: &mut impl BufMut,
) -> Result<(), WriteError> {
    let little = encoding == Encoding::LittleEndian;
    match (leaf.length, little) {
        (4, false) => buf.put_f32(value as f32),
        (4, true) => buf.put_f32_le(value as f32),
        (8, false) => buf.put_f64(value),
        (8, true) => buf.put_f64_le(value),
        _ => return Err(width_error(descriptor, leaf)),
    }
    Ok(())
}

fn overflow_error(descriptor: &Descriptor, leaf: &Leaf, text: String) -> WriteError {
    WriteError::Overflow {
        record: descriptor.record.clone(),
        field: descriptor.name.clone(),
        text,
        length: leaf.length,
    }
}

fn width_error(descriptor: &Descriptor, leaf: &Leaf) -> WriteError {
    WriteError::InvalidWidth {
        record: descriptor.record.clone(),
        field: descriptor.name.clone(),
        category: leaf.scalar,
        length: leaf.length,
    }
}

fn mismatch(descriptor: &Descriptor, expected: &str) -> WriteError {
    WriteError::TypeMismatch {
        record: descriptor.record.clone(),
        field: descriptor.name.clone(),
        expected: expected.to_string(),
    }
}
