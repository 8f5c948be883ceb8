//! Typed field metadata and the [`Value`] codec.
//!
//! A [`FieldType`] describes how a column's values are encoded and ordered;
//! a [`Value`] is the typed runtime representation. Both are the building
//! blocks `Schema` and `Record` compose into a full tuple.

use std::cmp::Ordering;

use crate::error::{Result, StorageError};

/// One of the five supported column types, each carrying a nullability flag.
/// Variable-length types additionally carry their declared maximum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Integer { nullable: bool },
    Float { nullable: bool },
    Boolean { nullable: bool },
    /// Fixed-length binary of exactly `length` bytes. `length` must be >= 1.
    Binary { length: usize, nullable: bool },
    /// Variable-length text, up to `max_length` Unicode scalar values.
    /// `max_length` must be >= 1.
    Varchar { max_length: usize, nullable: bool },
}

impl FieldType {
    pub fn integer(nullable: bool) -> Self {
        FieldType::Integer { nullable }
    }

    pub fn float(nullable: bool) -> Self {
        FieldType::Float { nullable }
    }

    pub fn boolean(nullable: bool) -> Self {
        FieldType::Boolean { nullable }
    }

    pub fn binary(length: usize, nullable: bool) -> Result<Self> {
        if length == 0 {
            return Err(StorageError::InvalidLength);
        }
        Ok(FieldType::Binary { length, nullable })
    }

    pub fn varchar(max_length: usize, nullable: bool) -> Result<Self> {
        if max_length == 0 {
            return Err(StorageError::InvalidLength);
        }
        Ok(FieldType::Varchar {
            max_length,
            nullable,
        })
    }

    pub fn nullable(&self) -> bool {
        match self {
            FieldType::Integer { nullable }
            | FieldType::Float { nullable }
            | FieldType::Boolean { nullable }
            | FieldType::Binary { nullable, .. }
            | FieldType::Varchar { nullable, .. } => *nullable,
        }
    }

    /// True for types whose encoded byte length never changes.
    pub fn is_fixed_length(&self) -> bool {
        !matches!(self, FieldType::Varchar { .. })
    }

    /// Byte length of a non-null value of this type, for fixed-length types.
    pub fn fixed_byte_size(&self) -> Option<usize> {
        match self {
            FieldType::Integer { .. } => Some(4),
            FieldType::Float { .. } => Some(4),
            FieldType::Boolean { .. } => Some(1),
            FieldType::Binary { length, .. } => Some(*length),
            FieldType::Varchar { .. } => None,
        }
    }
}

/// A typed runtime value. `Key` (§3 DATA MODEL) is simply an alias for this
/// type restricted to the value stored in a record's first column.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i32),
    Float(f32),
    Boolean(bool),
    Binary(Vec<u8>),
    Varchar(String),
}

/// `Key` is an alias for a typed value; ordering on keys is the ordering of
/// the underlying type.
pub type Key = Value;

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Encoded byte length, not counting the variable-length length-prefix
    /// table entry (that belongs to the record header, not the value).
    pub fn byte_len(&self) -> usize {
        match self {
            Value::Null => 0,
            Value::Integer(_) => 4,
            Value::Float(_) => 4,
            Value::Boolean(_) => 1,
            Value::Binary(bytes) => bytes.len(),
            Value::Varchar(s) => s.chars().count() * 4,
        }
    }

    /// Encodes this value per §6 EXTERNAL INTERFACES. Null values encode to
    /// an empty slice; callers must track nullness separately (the record
    /// format tracks it via the variable-length table / fixed-width absence
    /// is inferred from the schema).
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Value::Null => Vec::new(),
            Value::Integer(i) => i.to_le_bytes().to_vec(),
            Value::Float(f) => f.to_le_bytes().to_vec(),
            Value::Boolean(b) => vec![if *b { 1 } else { 0 }],
            Value::Binary(bytes) => bytes.clone(),
            Value::Varchar(s) => {
                let mut buf = Vec::with_capacity(s.chars().count() * 4);
                for c in s.chars() {
                    buf.extend_from_slice(&(c as u32).to_le_bytes());
                }
                buf
            }
        }
    }

    /// Decodes a non-null value of `field_type` from exactly its encoded
    /// byte range. `bytes` must be exactly the right length for fixed-size
    /// types; for varchar, `bytes.len()` must be a multiple of 4.
    pub fn from_bytes(field_type: &FieldType, bytes: &[u8]) -> Result<Value> {
        match field_type {
            FieldType::Integer { .. } => {
                if bytes.len() != 4 {
                    return Err(StorageError::BytesizeMismatch {
                        expected: 4,
                        actual: bytes.len(),
                    });
                }
                let mut buf = [0u8; 4];
                buf.copy_from_slice(bytes);
                Ok(Value::Integer(i32::from_le_bytes(buf)))
            }
            FieldType::Float { .. } => {
                if bytes.len() != 4 {
                    return Err(StorageError::BytesizeMismatch {
                        expected: 4,
                        actual: bytes.len(),
                    });
                }
                let mut buf = [0u8; 4];
                buf.copy_from_slice(bytes);
                Ok(Value::Float(f32::from_le_bytes(buf)))
            }
            FieldType::Boolean { .. } => {
                if bytes.len() != 1 {
                    return Err(StorageError::BytesizeMismatch {
                        expected: 1,
                        actual: bytes.len(),
                    });
                }
                Ok(Value::Boolean(bytes[0] != 0))
            }
            FieldType::Binary { length, .. } => {
                if bytes.len() != *length {
                    return Err(StorageError::BytesizeMismatch {
                        expected: *length,
                        actual: bytes.len(),
                    });
                }
                Ok(Value::Binary(bytes.to_vec()))
            }
            FieldType::Varchar { .. } => {
                if bytes.len() % 4 != 0 {
                    return Err(StorageError::BytesizeMismatch {
                        expected: (bytes.len() / 4 + 1) * 4,
                        actual: bytes.len(),
                    });
                }
                let mut s = String::with_capacity(bytes.len() / 4);
                for chunk in bytes.chunks_exact(4) {
                    let mut buf = [0u8; 4];
                    buf.copy_from_slice(chunk);
                    let scalar = u32::from_le_bytes(buf);
                    let c = char::from_u32(scalar).ok_or(StorageError::BytesizeMismatch {
                        expected: 4,
                        actual: 4,
                    })?;
                    s.push(c);
                }
                Ok(Value::Varchar(s))
            }
        }
    }
}

impl Eq for Value {}

/// Integer and float order numerically; booleans order false < true; binary
/// orders lexicographically; varchar orders by code-point sequence
/// lexicographically. `Null` sorts before every non-null value of its type.
impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Less,
            (_, Value::Null) => Ordering::Greater,
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (Value::Binary(a), Value::Binary(b)) => a.cmp(b),
            (Value::Varchar(a), Value::Varchar(b)) => {
                a.chars().cmp(b.chars())
            }
            _ => panic!("cannot compare values of different field types"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_round_trip() {
        let v = Value::Integer(-42);
        let bytes = v.to_bytes();
        assert_eq!(bytes.len(), 4);
        let back = Value::from_bytes(&FieldType::integer(false), &bytes).unwrap();
        assert_eq!(v, back);
    }

    #[test]
    fn float_round_trip() {
        let v = Value::Float(3.5);
        let bytes = v.to_bytes();
        let back = Value::from_bytes(&FieldType::float(false), &bytes).unwrap();
        assert_eq!(v, back);
    }

    #[test]
    fn boolean_orders_false_before_true() {
        assert!(Value::Boolean(false) < Value::Boolean(true));
    }

    #[test]
    fn varchar_round_trip_and_order() {
        let v = Value::Varchar("héllo".to_string());
        let bytes = v.to_bytes();
        assert_eq!(bytes.len(), 5 * 4);
        let back = Value::from_bytes(&FieldType::varchar(16, false).unwrap(), &bytes).unwrap();
        assert_eq!(v, back);

        assert!(Value::Varchar("a".into()) < Value::Varchar("b".into()));
        assert!(Value::Varchar("a".into()) < Value::Varchar("aa".into()));
    }

    #[test]
    fn binary_round_trip_and_order() {
        let v = Value::Binary(vec![1, 2, 3]);
        let bytes = v.to_bytes();
        let back = Value::from_bytes(&FieldType::binary(3, false).unwrap(), &bytes).unwrap();
        assert_eq!(v, back);
        assert!(Value::Binary(vec![1, 2]) < Value::Binary(vec![1, 3]));
    }

    #[test]
    fn null_sorts_before_non_null() {
        assert!(Value::Null < Value::Integer(i32::MIN));
    }

    #[test]
    fn bytesize_mismatch_is_reported() {
        let err = Value::from_bytes(&FieldType::integer(false), &[0u8; 3]);
        assert!(matches!(err, Err(StorageError::BytesizeMismatch { .. })));
    }

    #[test]
    fn invalid_length_rejected_at_construction() {
        assert!(matches!(
            FieldType::varchar(0, false),
            Err(StorageError::InvalidLength)
        ));
        assert!(matches!(
            FieldType::binary(0, false),
            Err(StorageError::InvalidLength)
        ));
    }
}
