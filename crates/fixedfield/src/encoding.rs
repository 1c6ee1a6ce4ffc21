//! On-the-wire representations of scalar values.

use std::fmt;

/// Encoding used when a field carries no `encoding` annotation.
pub const DEFAULT_ENCODING: &str = "LE";

/// How a scalar value is represented in its byte block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// Decimal text (numerics) or a truth-set byte (booleans).
    Ascii,
    /// Fixed-width binary, most significant byte first.
    BigEndian,
    /// Fixed-width binary, least significant byte first.
    LittleEndian,
    /// A single raw byte. Only booleans accept it.
    Byte,
}

impl Encoding {
    /// Parses an encoding name, ignoring case. Returns `None` for unknown names.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "ascii" => Some(Encoding::Ascii),
            "bigendian" | "be" => Some(Encoding::BigEndian),
            "littleendian" | "le" => Some(Encoding::LittleEndian),
            "byte" => Some(Encoding::Byte),
            _ => None,
        }
    }
}

impl Default for Encoding {
    fn default() -> Self {
        Encoding::LittleEndian
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Encoding::Ascii => "ascii",
            Encoding::BigEndian => "bigendian",
            Encoding::LittleEndian => "littleendian",
            Encoding::Byte => "byte",
        };
        f.write_str(name)
    }
}
