//! Schema: the compiled descriptors of a record layout, used to decode and
//! encode records.

use bytes::{Buf, BufMut};
use tracing::debug;

use crate::{
    decode::decode_record,
    descriptor::{Descriptor, build_descriptors, total_size},
    encode::encode_record,
    errors::{CompileError, ReadError, WriteError},
    field::RecordLayout,
    value::Record,
};

/// A compiled record layout. Use [Schema::compile] to build it from a
/// [RecordLayout], then [Schema::unmarshal] and [Schema::marshal] as many
/// times as needed.
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    size: usize,
    descriptors: Vec<Descriptor>,
}

impl Schema {
    /// Compiles `layout`. Fails if any annotation is malformed or unsupported.
    pub fn compile(layout: &RecordLayout) -> Result<Self, CompileError> {
        let descriptors = build_descriptors(layout)?;
        let size = total_size(&descriptors)?;

        debug!(
            record = %layout.name,
            fields = descriptors.len(),
            size,
            "compiled schema"
        );

        Ok(Self {
            name: layout.name.clone(),
            size,
            descriptors,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of bytes a record of this layout occupies.
    ///
    /// String fields are written verbatim, so an encoded record only has
    /// this size when its strings match their declared lengths.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Descriptors in layout order.
    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    /// Decodes one record from `buf`, leaving any bytes after it unread.
    pub fn decode(&self, buf: &mut impl Buf) -> Result<Record, ReadError> {
        decode_record(&self.name, &self.descriptors, buf)
    }

    /// Decodes one record from the start of `data`.
    pub fn unmarshal(&self, data: &[u8]) -> Result<Record, ReadError> {
        let mut buf = data;
        self.decode(&mut buf)
    }

    /// Appends the encoding of `record` to `buf`.
    pub fn encode(&self, record: &Record, buf: &mut impl BufMut) -> Result<(), WriteError> {
        encode_record(record, &self.descriptors, buf)
    }

    /// Encodes `record` into a new buffer.
    pub fn marshal(&self, record: &Record) -> Result<Vec<u8>, WriteError> {
        let mut buf = Vec::with_capacity(self.size);
        self.encode(record, &mut buf)?;
        Ok(buf)
    }
}
