//! Field descriptors: the compiled, validated form of a [RecordLayout].
//!
//! Descriptors are built from the layout's annotations, in declaration order,
//! recursing into nested records. Everything that can be checked without data
//! (integer annotations, encoding names, binary widths) is checked here, so the
//! decode and encode engines only ever see combinations they support.

use std::{collections::HashSet, fmt};

use tracing::trace;

use crate::{
    encoding::Encoding,
    errors::CompileError,
    field::{Annotations, Field, FieldType, RecordLayout, ScalarType},
};

const DEFAULT_TRUE_CHARS: &str = "Yy";
const DEFAULT_PADDING: u8 = b' ';

const NUMERIC_ENCODINGS: &str = "BigEndian, LittleEndian or ASCII";
const BOOLEAN_ENCODINGS: &str = "BigEndian, LittleEndian, Byte or ASCII";

/// Layout of a scalar or repeated field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    pub scalar: ScalarType,
    /// Bytes per element.
    pub length: usize,
    /// Number of elements. Always 1 for scalar descriptors.
    pub repeat: usize,
    pub encoding: Encoding,
    /// Bytes that decode as `true` for ASCII booleans.
    pub true_bytes: Vec<u8>,
    /// Fill byte for right-justified ASCII numerics.
    pub padding: u8,
}

impl Leaf {
    pub fn size(&self) -> usize {
        self.length.saturating_mul(self.repeat)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorKind {
    Scalar(Leaf),
    Repeated(Leaf),
    /// A nested record; its children carry the byte accounting.
    Nested {
        /// Type name of the nested record.
        record: String,
        children: Vec<Descriptor>,
    },
}

/// A compiled field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    /// Name of the record type that declares the field.
    pub record: String,
    pub name: String,
    pub kind: DescriptorKind,
}

impl Descriptor {
    /// Bytes per element; 0 for nested records.
    pub fn length(&self) -> usize {
        match &self.kind {
            DescriptorKind::Scalar(leaf) | DescriptorKind::Repeated(leaf) => leaf.length,
            DescriptorKind::Nested { .. } => 0,
        }
    }

    /// Element count; 0 for nested records.
    pub fn repeat(&self) -> usize {
        match &self.kind {
            DescriptorKind::Scalar(leaf) | DescriptorKind::Repeated(leaf) => leaf.repeat,
            DescriptorKind::Nested { .. } => 0,
        }
    }

    /// Number of bytes this field occupies in the stream.
    pub fn size(&self) -> usize {
        match &self.kind {
            DescriptorKind::Scalar(leaf) | DescriptorKind::Repeated(leaf) => leaf.size(),
            DescriptorKind::Nested { children, .. } => children
                .iter()
                .fold(0, |total, child| total.saturating_add(child.size())),
        }
    }

    pub fn children(&self) -> &[Descriptor] {
        match &self.kind {
            DescriptorKind::Nested { children, .. } => children,
            _ => &[],
        }
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DescriptorKind::Scalar(leaf) | DescriptorKind::Repeated(leaf) => write!(
                f,
                "{}.{}: {} length {} repeat {} encoding {} true bytes {:?}",
                self.record,
                self.name,
                leaf.scalar,
                leaf.length,
                leaf.repeat,
                leaf.encoding,
                String::from_utf8_lossy(&leaf.true_bytes),
            ),
            DescriptorKind::Nested { record, children } => {
                write!(f, "{}.{}: {} [", self.record, self.name, record)?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{child}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Builds the descriptors for every field of `layout`, in declaration order.
pub fn build_descriptors(layout: &RecordLayout) -> Result<Vec<Descriptor>, CompileError> {
    let mut seen = HashSet::new();
    layout
        .fields
        .iter()
        .map(|field| {
            if !seen.insert(field.name.as_str()) {
                return Err(CompileError::DuplicateField {
                    record: layout.name.clone(),
                    field: field.name.clone(),
                });
            }
            build_descriptor(field, &layout.name)
        })
        .collect()
}

/// Sums the sizes of `descriptors`, failing instead of wrapping.
pub fn total_size(descriptors: &[Descriptor]) -> Result<usize, CompileError> {
    descriptors.iter().try_fold(0usize, |total, descriptor| {
        total
            .checked_add(descriptor.size())
            .ok_or_else(|| CompileError::SizeOverflow {
                record: descriptor.record.clone(),
                field: descriptor.name.clone(),
            })
    })
}

fn build_descriptor(field: &Field, record: &str) -> Result<Descriptor, CompileError> {
    let context = Context {
        record,
        field: &field.name,
    };
    let annotations = &field.annotations;

    let length = context.integer("length", &annotations.length)?;
    let repeat = context.integer("repeat", &annotations.repeat)?;

    let kind = match &field.ty {
        FieldType::Scalar(scalar) => {
            if repeat != 1 {
                return Err(CompileError::UnexpectedRepeat {
                    record: record.to_string(),
                    field: field.name.clone(),
                    repeat,
                });
            }
            DescriptorKind::Scalar(context.leaf(*scalar, length, 1, annotations)?)
        }
        FieldType::Repeated(scalar) => {
            DescriptorKind::Repeated(context.leaf(*scalar, length, repeat, annotations)?)
        }
        FieldType::Record(nested) => {
            if nested.fields.is_empty() {
                return Err(CompileError::EmptyRecord {
                    record: record.to_string(),
                    field: field.name.clone(),
                    nested: nested.name.clone(),
                });
            }
            let children = build_descriptors(nested)?;
            total_size(&children)?;
            DescriptorKind::Nested {
                record: nested.name.clone(),
                children,
            }
        }
    };

    trace!(record, field = %field.name, "built descriptor");

    Ok(Descriptor {
        record: record.to_string(),
        name: field.name.clone(),
        kind,
    })
}

/// Returns the annotation text, treating an empty annotation as absent.
fn annotation(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

struct Context<'a> {
    record: &'a str,
    field: &'a str,
}

impl Context<'_> {
    fn integer(
        &self,
        name: &'static str,
        value: &Option<String>,
    ) -> Result<usize, CompileError> {
        match annotation(value) {
            None => Ok(1),
            Some(text) => text
                .trim()
                .parse::<usize>()
                .map_err(|_| CompileError::InvalidInteger {
                    record: self.record.to_string(),
                    field: self.field.to_string(),
                    annotation: name,
                    value: text.to_string(),
                }),
        }
    }

    fn leaf(
        &self,
        scalar: ScalarType,
        length: usize,
        repeat: usize,
        annotations: &Annotations,
    ) -> Result<Leaf, CompileError> {
        if length == 0 {
            return Err(CompileError::InvalidLength {
                record: self.record.to_string(),
                field: self.field.to_string(),
                category: scalar,
                length,
                expected: "at least 1",
            });
        }
        if length.checked_mul(repeat).is_none() {
            return Err(CompileError::SizeOverflow {
                record: self.record.to_string(),
                field: self.field.to_string(),
            });
        }
        let encoding = self.encoding(scalar, length, &annotations.encoding)?;

        let true_bytes = annotation(&annotations.true_chars)
            .unwrap_or(DEFAULT_TRUE_CHARS)
            .as_bytes()
            .to_vec();

        let padding = match annotation(&annotations.padding) {
            None => DEFAULT_PADDING,
            Some(text) if text.len() == 1 => text.as_bytes()[0],
            Some(text) => {
                return Err(CompileError::InvalidPadding {
                    record: self.record.to_string(),
                    field: self.field.to_string(),
                    padding: text.to_string(),
                });
            }
        };

        Ok(Leaf {
            scalar,
            length,
            repeat,
            encoding,
            true_bytes,
            padding,
        })
    }

    /// Resolves the encoding annotation and checks it, and the element width,
    /// against the field's category.
    fn encoding(
        &self,
        scalar: ScalarType,
        length: usize,
        value: &Option<String>,
    ) -> Result<Encoding, CompileError> {
        let name = annotation(value);
        let parsed = match name {
            None => Some(Encoding::default()),
            Some(name) => Encoding::parse(name),
        };

        // Strings are copied verbatim whatever the annotation says.
        if scalar == ScalarType::String {
            return Ok(parsed.unwrap_or_default());
        }

        let (allowed, expected) = match scalar {
            ScalarType::Boolean => (parsed.is_some(), BOOLEAN_ENCODINGS),
            _ => (
                matches!(
                    parsed,
                    Some(Encoding::Ascii | Encoding::BigEndian | Encoding::LittleEndian)
                ),
                NUMERIC_ENCODINGS,
            ),
        };
        let encoding = match parsed {
            Some(encoding) if allowed => encoding,
            _ => {
                return Err(CompileError::UnsupportedEncoding {
                    record: self.record.to_string(),
                    field: self.field.to_string(),
                    category: scalar,
                    encoding: name.unwrap_or_default().to_string(),
                    expected,
                });
            }
        };

        let (valid, widths) = match (scalar, encoding) {
            (ScalarType::Boolean, _) => (length == 1, "1"),
            (_, Encoding::Ascii) => (true, ""),
            (ScalarType::Float32 | ScalarType::Float64, _) => {
                (matches!(length, 4 | 8), "4 or 8")
            }
            _ => (matches!(length, 1 | 2 | 4 | 8), "1, 2, 4 or 8"),
        };
        if !valid {
            return Err(CompileError::InvalidLength {
                record: self.record.to_string(),
                field: self.field.to_string(),
                category: scalar,
                length,
                expected: widths,
            });
        }

        Ok(encoding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> RecordLayout {
        RecordLayout::new("Person")
            .field(Field::new::<String>("Name").length("5"))
            .field(Field::new::<i64>("Age").length("1"))
    }

    #[test]
    fn test_defaults() {
        let descriptors =
            build_descriptors(&RecordLayout::new("T").field(Field::new::<bool>("Enrolled")))
                .unwrap();

        assert_eq!(
            descriptors,
            vec![Descriptor {
                record: "T".to_string(),
                name: "Enrolled".to_string(),
                kind: DescriptorKind::Scalar(Leaf {
                    scalar: ScalarType::Boolean,
                    length: 1,
                    repeat: 1,
                    encoding: Encoding::LittleEndian,
                    true_bytes: b"Yy".to_vec(),
                    padding: b' ',
                }),
            }]
        );
    }

    #[test]
    fn test_annotations_are_read() {
        let layout = RecordLayout::new("Target")
            .field(Field::new::<i64>("Age").length("12").encoding("ascii").padding("0"))
            .field(Field::new::<bool>("Dispatched").encoding("ascii").true_chars("jJ"))
            .field(Field::new::<Vec<i64>>("Ratings").length("1").repeat("10").encoding("ascii"));
        let descriptors = build_descriptors(&layout).unwrap();

        assert_eq!(descriptors[0].length(), 12);
        assert_eq!(descriptors[0].size(), 12);
        let DescriptorKind::Scalar(age) = &descriptors[0].kind else {
            panic!("expected scalar");
        };
        assert_eq!(age.encoding, Encoding::Ascii);
        assert_eq!(age.padding, b'0');

        let DescriptorKind::Scalar(dispatched) = &descriptors[1].kind else {
            panic!("expected scalar");
        };
        assert_eq!(dispatched.true_bytes, b"jJ".to_vec());

        assert!(matches!(descriptors[2].kind, DescriptorKind::Repeated(_)));
        assert_eq!(descriptors[2].length(), 1);
        assert_eq!(descriptors[2].repeat(), 10);
        assert_eq!(descriptors[2].size(), 10);
    }

    #[test]
    fn test_nested_records() {
        let layout = RecordLayout::new("Transaction")
            .field(Field::with_type("Buyer", FieldType::Record(person())))
            .field(Field::with_type("Seller", FieldType::Record(person())));
        let descriptors = build_descriptors(&layout).unwrap();

        assert_eq!(descriptors.len(), 2);
        for (descriptor, name) in descriptors.iter().zip(["Buyer", "Seller"]) {
            assert_eq!(descriptor.record, "Transaction");
            assert_eq!(descriptor.name, name);
            assert_eq!(descriptor.length(), 0);
            assert_eq!(descriptor.repeat(), 0);
            assert_eq!(descriptor.size(), 6);

            let children = descriptor.children();
            assert_eq!(children.len(), 2);
            assert_eq!(children[0].record, "Person");
            assert_eq!(children[0].name, "Name");
            assert_eq!(children[0].length(), 5);
            assert_eq!(children[1].record, "Person");
            assert_eq!(children[1].name, "Age");
            assert_eq!(children[1].length(), 1);
        }
    }

    #[test]
    fn test_invalid_length_annotation() {
        let layout = RecordLayout::new("T").field(Field::new::<String>("Name").length("five"));
        assert_eq!(
            build_descriptors(&layout),
            Err(CompileError::InvalidInteger {
                record: "T".to_string(),
                field: "Name".to_string(),
                annotation: "length",
                value: "five".to_string(),
            })
        );
    }

    #[test]
    fn test_negative_repeat_annotation() {
        let layout = RecordLayout::new("T").field(Field::new::<Vec<u8>>("Bytes").repeat("-1"));
        assert!(matches!(
            build_descriptors(&layout),
            Err(CompileError::InvalidInteger { annotation: "repeat", .. })
        ));
    }

    #[test]
    fn test_unknown_integer_encoding() {
        let layout = RecordLayout::new("T").field(Field::new::<i64>("Value").encoding("ebcdic"));
        let err = build_descriptors(&layout).unwrap_err();

        assert!(matches!(
            &err,
            CompileError::UnsupportedEncoding { category: ScalarType::SignedInteger, .. }
        ));
        assert!(err.to_string().contains("BigEndian, LittleEndian or ASCII"));
        assert!(err.to_string().contains("T.Value"));
    }

    #[test]
    fn test_byte_encoding_only_for_booleans() {
        let flag = RecordLayout::new("T").field(Field::new::<bool>("Flag").encoding("byte"));
        assert!(build_descriptors(&flag).is_ok());

        let number = RecordLayout::new("T").field(Field::new::<u8>("Count").encoding("byte"));
        assert!(matches!(
            build_descriptors(&number),
            Err(CompileError::UnsupportedEncoding { .. })
        ));
    }

    #[test]
    fn test_string_ignores_encoding() {
        let layout = RecordLayout::new("T")
            .field(Field::new::<String>("Name").length("3").encoding("whatever"));
        assert!(build_descriptors(&layout).is_ok());
    }

    #[test]
    fn test_binary_widths() {
        for length in ["1", "2", "4", "8"] {
            let layout = RecordLayout::new("T").field(Field::new::<i32>("V").length(length));
            assert!(build_descriptors(&layout).is_ok());
        }

        let layout = RecordLayout::new("T").field(Field::new::<i32>("V").length("3"));
        assert!(matches!(
            build_descriptors(&layout),
            Err(CompileError::InvalidLength { length: 3, .. })
        ));

        let layout = RecordLayout::new("T").field(Field::new::<f64>("V").length("2").encoding("be"));
        assert!(matches!(
            build_descriptors(&layout),
            Err(CompileError::InvalidLength { length: 2, .. })
        ));

        let layout = RecordLayout::new("T").field(Field::new::<bool>("V").length("2"));
        assert!(matches!(
            build_descriptors(&layout),
            Err(CompileError::InvalidLength { length: 2, .. })
        ));
    }

    #[test]
    fn test_ascii_numerics_accept_any_width() {
        let layout = RecordLayout::new("T")
            .field(Field::new::<i64>("V").length("3").encoding("ascii"))
            .field(Field::new::<f32>("F").length("6").encoding("ascii"));
        assert!(build_descriptors(&layout).is_ok());
    }

    #[test]
    fn test_repeat_on_scalar() {
        let layout = RecordLayout::new("T").field(Field::new::<i64>("V").repeat("3"));
        assert!(matches!(
            build_descriptors(&layout),
            Err(CompileError::UnexpectedRepeat { repeat: 3, .. })
        ));
    }

    #[test]
    fn test_invalid_padding() {
        let layout = RecordLayout::new("T")
            .field(Field::new::<i64>("V").length("4").encoding("ascii").padding("ab"));
        assert!(matches!(
            build_descriptors(&layout),
            Err(CompileError::InvalidPadding { .. })
        ));
    }

    #[test]
    fn test_duplicate_field_names() {
        let layout = RecordLayout::new("Extract")
            .field(Field::new::<String>("Filler").length("2"))
            .field(Field::new::<i64>("Age").length("2").encoding("ascii"))
            .field(Field::new::<String>("Filler").length("2"));
        assert_eq!(
            build_descriptors(&layout),
            Err(CompileError::DuplicateField {
                record: "Extract".to_string(),
                field: "Filler".to_string(),
            })
        );

        let nested = RecordLayout::new("Outer").field(Field::with_type(
            "Inner",
            FieldType::Record(
                RecordLayout::new("Inner")
                    .field(Field::new::<bool>("Flag"))
                    .field(Field::new::<bool>("Flag")),
            ),
        ));
        assert!(matches!(
            build_descriptors(&nested),
            Err(CompileError::DuplicateField { record, .. }) if record == "Inner"
        ));
    }

    #[test]
    fn test_same_name_in_different_records() {
        let layout = RecordLayout::new("Transaction")
            .field(Field::new::<String>("Name").length("3"))
            .field(Field::with_type("Buyer", FieldType::Record(person())));
        assert!(build_descriptors(&layout).is_ok());
    }

    #[test]
    fn test_empty_nested_record() {
        let layout = RecordLayout::new("Outer")
            .field(Field::with_type("Inner", FieldType::Record(RecordLayout::new("Nothing"))));
        assert_eq!(
            build_descriptors(&layout),
            Err(CompileError::EmptyRecord {
                record: "Outer".to_string(),
                field: "Inner".to_string(),
                nested: "Nothing".to_string(),
            })
        );
    }

    #[test]
    fn test_zero_length() {
        let layout = RecordLayout::new("T").field(Field::new::<String>("Name").length("0"));
        assert!(matches!(
            build_descriptors(&layout),
            Err(CompileError::InvalidLength { length: 0, .. })
        ));

        let layout = RecordLayout::new("T")
            .field(Field::new::<Vec<String>>("V").length("0").repeat("1000000"));
        assert!(matches!(
            build_descriptors(&layout),
            Err(CompileError::InvalidLength { length: 0, .. })
        ));
    }

    #[test]
    fn test_field_size_overflow() {
        let huge = usize::MAX.to_string();
        let layout = RecordLayout::new("T")
            .field(Field::new::<Vec<String>>("V").length("2").repeat(huge));
        assert_eq!(
            build_descriptors(&layout),
            Err(CompileError::SizeOverflow {
                record: "T".to_string(),
                field: "V".to_string(),
            })
        );
    }

    #[test]
    fn test_record_size_overflow() {
        let half = (usize::MAX / 2).to_string();
        let inner = RecordLayout::new("Inner")
            .field(Field::new::<Vec<String>>("A").length("2").repeat(half.clone()))
            .field(Field::new::<Vec<String>>("B").length("2").repeat(half));
        let layout = RecordLayout::new("Outer")
            .field(Field::with_type("Inner", FieldType::Record(inner.clone())));

        assert!(build_descriptors(&inner).is_ok());
        assert_eq!(
            total_size(&build_descriptors(&inner).unwrap()),
            Err(CompileError::SizeOverflow {
                record: "Inner".to_string(),
                field: "B".to_string(),
            })
        );
        assert!(matches!(
            build_descriptors(&layout),
            Err(CompileError::SizeOverflow { field, .. }) if field == "B"
        ));
    }

    #[test]
    fn test_display() {
        let descriptors = build_descriptors(&person()).unwrap();
        assert_eq!(
            descriptors[1].to_string(),
            "Person.Age: signed integer length 1 repeat 1 encoding littleendian true bytes \"Yy\""
        );
    }
}
