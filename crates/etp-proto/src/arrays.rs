//! Numeric array payloads.
//!
//! A data array travels the wire as an `AnyArray` union; the variant is
//! selected by the semantic element kind of the flattened buffer:
//!
//! | element kind              | wire variant     |
//! |---------------------------|------------------|
//! | signed 8/16/32-bit int    | `ArrayOfInt`     |
//! | signed 64-bit int         | `ArrayOfLong`    |
//! | 32-bit IEEE float         | `ArrayOfFloat`   |
//! | 64-bit IEEE float         | `ArrayOfDouble`  |
//! | boolean                   | `ArrayOfBoolean` |
//! | unsigned 8-bit            | `Bytes`          |
//! | UTF-8 string              | `ArrayOfString`  |

use thiserror::Error;

/// Raised when a caller supplies a buffer whose element kind has no wire
/// representation.
#[derive(Debug, Error)]
#[error("unsupported element kind: {0}")]
pub struct UnsupportedElementKind(pub String);

/// Semantic element kind of a flattened buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Boolean,
    Int,
    Long,
    Float,
    Double,
    Bytes,
    String,
}

/// Wire-level array transport type, as reported by
/// `GetDataArrayMetadataResponse`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnyArrayType {
    ArrayOfBoolean,
    ArrayOfInt,
    ArrayOfLong,
    ArrayOfFloat,
    ArrayOfDouble,
    ArrayOfString,
    Bytes,
}

impl AnyArrayType {
    /// Wire name of the enum symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            AnyArrayType::ArrayOfBoolean => "arrayOfBoolean",
            AnyArrayType::ArrayOfInt => "arrayOfInt",
            AnyArrayType::ArrayOfLong => "arrayOfLong",
            AnyArrayType::ArrayOfFloat => "arrayOfFloat",
            AnyArrayType::ArrayOfDouble => "arrayOfDouble",
            AnyArrayType::ArrayOfString => "arrayOfString",
            AnyArrayType::Bytes => "bytes",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "arrayOfBoolean" => AnyArrayType::ArrayOfBoolean,
            "arrayOfInt" => AnyArrayType::ArrayOfInt,
            "arrayOfLong" => AnyArrayType::ArrayOfLong,
            "arrayOfFloat" => AnyArrayType::ArrayOfFloat,
            "arrayOfDouble" => AnyArrayType::ArrayOfDouble,
            "arrayOfString" => AnyArrayType::ArrayOfString,
            "bytes" => AnyArrayType::Bytes,
            _ => return None,
        })
    }

    pub fn element_kind(self) -> ElementKind {
        match self {
            AnyArrayType::ArrayOfBoolean => ElementKind::Boolean,
            AnyArrayType::ArrayOfInt => ElementKind::Int,
            AnyArrayType::ArrayOfLong => ElementKind::Long,
            AnyArrayType::ArrayOfFloat => ElementKind::Float,
            AnyArrayType::ArrayOfDouble => ElementKind::Double,
            AnyArrayType::ArrayOfString => ElementKind::String,
            AnyArrayType::Bytes => ElementKind::Bytes,
        }
    }
}

/// A flattened array payload.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyArray {
    Boolean(Vec<bool>),
    Int(Vec<i32>),
    Long(Vec<i64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    String(Vec<String>),
    Bytes(Vec<u8>),
}

impl AnyArray {
    /// Element kind of the payload.
    pub fn kind(&self) -> ElementKind {
        match self {
            AnyArray::Boolean(_) => ElementKind::Boolean,
            AnyArray::Int(_) => ElementKind::Int,
            AnyArray::Long(_) => ElementKind::Long,
            AnyArray::Float(_) => ElementKind::Float,
            AnyArray::Double(_) => ElementKind::Double,
            AnyArray::String(_) => ElementKind::String,
            AnyArray::Bytes(_) => ElementKind::Bytes,
        }
    }

    pub fn transport_type(&self) -> AnyArrayType {
        match self.kind() {
            ElementKind::Boolean => AnyArrayType::ArrayOfBoolean,
            ElementKind::Int => AnyArrayType::ArrayOfInt,
            ElementKind::Long => AnyArrayType::ArrayOfLong,
            ElementKind::Float => AnyArrayType::ArrayOfFloat,
            ElementKind::Double => AnyArrayType::ArrayOfDouble,
            ElementKind::String => AnyArrayType::ArrayOfString,
            ElementKind::Bytes => AnyArrayType::Bytes,
        }
    }

    /// Number of elements in the flattened buffer.
    pub fn len(&self) -> usize {
        match self {
            AnyArray::Boolean(v) => v.len(),
            AnyArray::Int(v) => v.len(),
            AnyArray::Long(v) => v.len(),
            AnyArray::Float(v) => v.len(),
            AnyArray::Double(v) => v.len(),
            AnyArray::String(v) => v.len(),
            AnyArray::Bytes(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// An empty array of the given kind, used as the accumulator when
    /// stitching subarray windows back together.
    pub fn empty_of(kind: ElementKind) -> Self {
        match kind {
            ElementKind::Boolean => AnyArray::Boolean(Vec::new()),
            ElementKind::Int => AnyArray::Int(Vec::new()),
            ElementKind::Long => AnyArray::Long(Vec::new()),
            ElementKind::Float => AnyArray::Float(Vec::new()),
            ElementKind::Double => AnyArray::Double(Vec::new()),
            ElementKind::String => AnyArray::String(Vec::new()),
            ElementKind::Bytes => AnyArray::Bytes(Vec::new()),
        }
    }

    /// Copy a contiguous range of `self` into a new array of the same kind.
    ///
    /// Used by the tiler, which only ever produces windows that are
    /// contiguous in row-major order.
    pub fn slice(&self, start: usize, len: usize) -> Self {
        match self {
            AnyArray::Boolean(v) => AnyArray::Boolean(v[start..start + len].to_vec()),
            AnyArray::Int(v) => AnyArray::Int(v[start..start + len].to_vec()),
            AnyArray::Long(v) => AnyArray::Long(v[start..start + len].to_vec()),
            AnyArray::Float(v) => AnyArray::Float(v[start..start + len].to_vec()),
            AnyArray::Double(v) => AnyArray::Double(v[start..start + len].to_vec()),
            AnyArray::String(v) => AnyArray::String(v[start..start + len].to_vec()),
            AnyArray::Bytes(v) => AnyArray::Bytes(v[start..start + len].to_vec()),
        }
    }

    /// Append another array of the same kind.  Mismatched kinds are a
    /// caller bug and reported as an error value.
    pub fn extend(&mut self, other: AnyArray) -> Result<(), UnsupportedElementKind> {
        match (self, other) {
            (AnyArray::Boolean(a), AnyArray::Boolean(b)) => a.extend(b),
            (AnyArray::Int(a), AnyArray::Int(b)) => a.extend(b),
            (AnyArray::Long(a), AnyArray::Long(b)) => a.extend(b),
            (AnyArray::Float(a), AnyArray::Float(b)) => a.extend(b),
            (AnyArray::Double(a), AnyArray::Double(b)) => a.extend(b),
            (AnyArray::String(a), AnyArray::String(b)) => a.extend(b),
            (AnyArray::Bytes(a), AnyArray::Bytes(b)) => a.extend(b),
            (a, b) => {
                return Err(UnsupportedElementKind(format!(
                    "cannot stitch {:?} into {:?}",
                    b.kind(),
                    a.kind()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_mapping_is_exhaustive_and_stable() {
        let cases: Vec<(AnyArray, ElementKind, AnyArrayType)> = vec![
            (AnyArray::Boolean(vec![true]), ElementKind::Boolean, AnyArrayType::ArrayOfBoolean),
            (AnyArray::Int(vec![1]), ElementKind::Int, AnyArrayType::ArrayOfInt),
            (AnyArray::Long(vec![1]), ElementKind::Long, AnyArrayType::ArrayOfLong),
            (AnyArray::Float(vec![1.0]), ElementKind::Float, AnyArrayType::ArrayOfFloat),
            (AnyArray::Double(vec![1.0]), ElementKind::Double, AnyArrayType::ArrayOfDouble),
            (AnyArray::String(vec!["x".into()]), ElementKind::String, AnyArrayType::ArrayOfString),
            (AnyArray::Bytes(vec![0xff]), ElementKind::Bytes, AnyArrayType::Bytes),
        ];
        for (array, kind, transport) in cases {
            assert_eq!(array.kind(), kind);
            assert_eq!(array.transport_type(), transport);
            assert_eq!(transport.element_kind(), kind);
            assert_eq!(AnyArrayType::from_symbol(transport.symbol()), Some(transport));
        }
    }

    #[test]
    fn slice_and_extend_round_trip() {
        let full = AnyArray::Long((0..100).collect());
        let mut rebuilt = AnyArray::empty_of(ElementKind::Long);
        rebuilt.extend(full.slice(0, 40)).unwrap();
        rebuilt.extend(full.slice(40, 60)).unwrap();
        assert_eq!(rebuilt, full);
    }

    #[test]
    fn extend_rejects_kind_mismatch() {
        let mut a = AnyArray::Long(vec![1]);
        assert!(a.extend(AnyArray::Double(vec![1.0])).is_err());
    }
}
