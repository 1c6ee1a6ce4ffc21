//! Decode engine: reads fields off a byte cursor in descriptor order.
//!
//! Nested records read from the same cursor as their parent, so their bytes
//! are simply the next bytes of the stream. Decoding stops at the first
//! failing field.

use bytes::{Buf, Bytes};
use tracing::{debug, trace};

use crate::{
    descriptor::{Descriptor, DescriptorKind, Leaf},
    encoding::Encoding,
    errors::ReadError,
    field::ScalarType,
    value::{Record, Value},
};

/// Decodes a record named `name` from `buf`, one descriptor at a time.
pub fn decode_record(
    name: &str,
    descriptors: &[Descriptor],
    buf: &mut impl Buf,
) -> Result<Record, ReadError> {
    let mut record = Record::new(name);
    for descriptor in descriptors {
        let value = decode_field(descriptor, buf)?;
        record.insert(descriptor.name.clone(), value);
    }
    Ok(record)
}

fn decode_field(descriptor: &Descriptor, buf: &mut impl Buf) -> Result<Value, ReadError> {
    let result = match &descriptor.kind {
        DescriptorKind::Scalar(leaf) => {
            read_block(buf, leaf.length).and_then(|block| decode_scalar(descriptor, leaf, &block))
        }
        DescriptorKind::Repeated(leaf) => decode_repeated(descriptor, leaf, buf),
        DescriptorKind::Nested { record, children } => {
            return decode_record(record, children, buf).map(Value::Record);
        }
    };

    match &result {
        Ok(_) => trace!(
            record = %descriptor.record,
            field = %descriptor.name,
            size = descriptor.size(),
            "decoded field"
        ),
        Err(err) => debug!(
            record = %descriptor.record,
            field = %descriptor.name,
            ?err,
            "failed to decode field"
        ),
    }
    result
}

fn decode_repeated(
    descriptor: &Descriptor,
    leaf: &Leaf,
    buf: &mut impl Buf,
) -> Result<Value, ReadError> {
    if leaf.length == 0 {
        return Err(width_error(descriptor, leaf));
    }
    // Check the whole field up front so an underrun consumes none of it.
    ensure(buf.remaining(), leaf.size())?;

    let mut items = Vec::with_capacity(leaf.repeat);
    for _ in 0..leaf.repeat {
        let block = read_block(buf, leaf.length)?;
        items.push(decode_scalar(descriptor, leaf, &block)?);
    }
    Ok(Value::Array(items))
}

fn ensure(delivered: usize, requested: usize) -> Result<(), ReadError> {
    if delivered < requested {
        return Err(ReadError::Underrun {
            requested,
            delivered,
        });
    }
    Ok(())
}

/// Takes exactly `length` bytes off the cursor.
fn read_block(buf: &mut impl Buf, length: usize) -> Result<Bytes, ReadError> {
    ensure(buf.remaining(), length)?;
    Ok(buf.copy_to_bytes(length))
}

/// Decodes one element's block according to the leaf's category and encoding.
fn decode_scalar(
    descriptor: &Descriptor,
    leaf: &Leaf,
    block: &[u8],
) -> Result<Value, ReadError> {
    match (leaf.scalar, leaf.encoding) {
        (ScalarType::String, _) => Ok(match String::from_utf8(block.to_vec()) {
            Ok(text) => Value::String(text),
            Err(err) => Value::Bytes(Bytes::from(err.into_bytes())),
        }),

        (ScalarType::SignedInteger, Encoding::Ascii) => ascii_text(block, leaf.padding)
            .and_then(|text| text.parse::<i64>().ok())
            .map(Value::Int)
            .ok_or_else(|| parse_error(descriptor, leaf, block)),
        (ScalarType::SignedInteger, encoding) => read_signed(block, encoding)
            .map(Value::Int)
            .ok_or_else(|| width_error(descriptor, leaf)),

        (ScalarType::UnsignedInteger, Encoding::Ascii) => ascii_text(block, leaf.padding)
            .and_then(|text| text.parse::<u64>().ok())
            .map(Value::UInt)
            .ok_or_else(|| parse_error(descriptor, leaf, block)),
        (ScalarType::UnsignedInteger, encoding) => read_unsigned(block, encoding)
            .map(Value::UInt)
            .ok_or_else(|| width_error(descriptor, leaf)),

        (ScalarType::Float32, Encoding::Ascii) => ascii_text(block, leaf.padding)
            .and_then(|text| text.parse::<f32>().ok())
            .map(Value::Float32)
            .ok_or_else(|| parse_error(descriptor, leaf, block)),
        (ScalarType::Float64, Encoding::Ascii) => ascii_text(block, leaf.padding)
            .and_then(|text| text.parse::<f64>().ok())
            .map(Value::Float64)
            .ok_or_else(|| parse_error(descriptor, leaf, block)),
        (ScalarType::Float32, encoding) => read_float(block, encoding)
            .map(|v| Value::Float32(v as f32))
            .ok_or_else(|| width_error(descriptor, leaf)),
        (ScalarType::Float64, encoding) => read_float(block, encoding)
            .map(Value::Float64)
            .ok_or_else(|| width_error(descriptor, leaf)),

        (ScalarType::Boolean, _) if block.len() != 1 => Err(width_error(descriptor, leaf)),
        (ScalarType::Boolean, Encoding::Ascii) => {
            Ok(Value::Bool(leaf.true_bytes.contains(&block[0])))
        }
        (ScalarType::Boolean, _) => Ok(Value::Bool(block[0] != 0)),
    }
}

/// Returns the numeral inside an ASCII block: surrounding whitespace is
/// dropped, and so is leading padding unless the padding is itself a digit.
fn ascii_text(block: &[u8], padding: u8) -> Option<&str> {
    let text = std::str::from_utf8(block).ok()?.trim();
    if padding.is_ascii_digit() || padding == b'-' {
        return Some(text);
    }
    Some(text.trim_start_matches(padding as char).trim_start())
}

/// Reads a two's-complement integer of width 1, 2, 4 or 8.
fn read_signed(mut block: &[u8], encoding: Encoding) -> Option<i64> {
    let little = encoding == Encoding::LittleEndian;
    let value = match (block.len(), little) {
        (1, _) => block.get_i8() as i64,
        (2, false) => block.get_i16() as i64,
        (2, true) => block.get_i16_le() as i64,
        (4, false) => block.get_i32() as i64,
        (4, true) => block.get_i32_le() as i64,
        (8, false) => block.get_i64(),
        (8, true) => block.get_i64_le(),
        _ => return None,
    };
    Some(value)
}

/// Reads an unsigned integer of width 1, 2, 4 or 8.
fn read_unsigned(mut block: &[u8], encoding: Encoding) -> Option<u64> {
    let little = encoding == Encoding::LittleEndian;
    let value = match (block.len(), little) {
        (1, _) => block.get_u8() as u64,
        (2, false) => block.get_u16() as u64,
        (2, true) => block.get_u16_le() as u64,
        (4, false) => block.get_u32() as u64,
        (4, true) => block.get_u32_le() as u64,
        (8, false) => block.get_u64(),
        (8, true) => block.get_u64_le(),
        _ => return None,
    };
    Some(value)
}

/// Reads an IEEE-754 single (width 4) or double (width 8).
fn read_float(mut block: &[u8], encoding: Encoding) -> Option<f64> {
    let little = encoding == Encoding::LittleEndian;
    let value = match (block.len(), little) {
        (4, false) => block.get_f32() as f64,
        (4, true) => block.get_f32_le() as f64,
        (8, false) => block.get_f64(),
        (8, true) => block.get_f64_le(),
        _ => return None,
    };
    Some(value)
}

fn parse_error(descriptor: &Descriptor, leaf: &Leaf, block: &[u8]) -> ReadError {
    ReadError::Parse {
        record: descriptor.record.clone(),
        field: descriptor.name.clone(),
        category: leaf.scalar,
        text: String::from_utf8_lossy(block).into_owned(),
    }
}

fn width_error(descriptor: &Descriptor, leaf: &Leaf) -> ReadError {
    ReadError::InvalidWidth {
        record: descriptor.record.clone(),
        field: descriptor.name.clone(),
        category: leaf.scalar,
        length: leaf.length,
    }
}
