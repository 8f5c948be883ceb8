//! The on-page record format: a 5-byte header, a variable-length-field
//! length table, a null bitmap, and the non-null value bytes themselves.
//!
//! Byte placement beyond "deleted flag" and "record type" is left
//! implementation-defined by §6; this crate places `heap_number` as a
//! little-endian `u16` at bytes 2..4 and reserves byte 4 (see SPEC_FULL.md
//! §9 for the resolution).

use crate::error::{Result, StorageError};
use crate::field::Value;
use crate::storage::schema::Schema;

pub const RECORD_HEADER_SIZE: usize = 5;

/// Distinguishes ordinary data records from the synthetic infimum/supremum
/// sentinels bookending a leaf's key range, and from internal
/// (key, child-page) pairs held by inner nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    Data = 0,
    Internal = 1,
    Infimum = 2,
    Supremum = 3,
}

impl RecordType {
    fn from_u8(tag: u8) -> Result<Self> {
        match tag {
            0 => Ok(RecordType::Data),
            1 => Ok(RecordType::Internal),
            2 => Ok(RecordType::Infimum),
            3 => Ok(RecordType::Supremum),
            _ => Err(StorageError::BytesizeMismatch {
                expected: 1,
                actual: tag as usize,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub deleted: bool,
    pub record_type: RecordType,
    pub heap_number: u16,
}

impl RecordHeader {
    fn to_bytes(&self) -> [u8; RECORD_HEADER_SIZE] {
        let mut buf = [0u8; RECORD_HEADER_SIZE];
        buf[0] = self.deleted as u8;
        buf[1] = self.record_type as u8;
        buf[2..4].copy_from_slice(&self.heap_number.to_le_bytes());
        // buf[4] reserved
        buf
    }

    fn from_bytes(buf: &[u8]) -> Result<Self> {
        if buf.len() < RECORD_HEADER_SIZE {
            return Err(StorageError::BytesizeMismatch {
                expected: RECORD_HEADER_SIZE,
                actual: buf.len(),
            });
        }
        Ok(Self {
            deleted: buf[0] != 0,
            record_type: RecordType::from_u8(buf[1])?,
            heap_number: u16::from_le_bytes([buf[2], buf[3]]),
        })
    }
}

/// A record: its header plus one value per field of the schema it was
/// encoded or decoded against.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub header: RecordHeader,
    pub values: Vec<Value>,
}

impl Record {
    pub fn new(record_type: RecordType, heap_number: u16, values: Vec<Value>) -> Self {
        Self {
            header: RecordHeader {
                deleted: false,
                record_type,
                heap_number,
            },
            values,
        }
    }

    pub fn data(heap_number: u16, values: Vec<Value>) -> Self {
        Self::new(RecordType::Data, heap_number, values)
    }

    pub fn key(&self) -> &Value {
        &self.values[0]
    }

    pub fn is_deleted(&self) -> bool {
        self.header.deleted
    }

    pub fn mark_deleted(&mut self) {
        self.header.deleted = true;
    }

    fn null_bitmap_len(schema: &Schema) -> usize {
        (schema.len() + 7) / 8
    }

    /// Encodes this record: header, then one `u32` length per
    /// variable-length field (in schema field order), then a null bitmap
    /// (one bit per field, LSB first), then the non-null values
    /// back-to-back in schema field order.
    pub fn to_bytes(&self, schema: &Schema) -> Vec<u8> {
        let mut buf = Vec::with_capacity(schema.byte_size() + RECORD_HEADER_SIZE);
        buf.extend_from_slice(&self.header.to_bytes());

        for (i, (_, field_type)) in schema.fields().iter().enumerate() {
            if field_type.is_fixed_length() {
                continue;
            }
            let len = if self.values[i].is_null() {
                0u32
            } else {
                self.values[i].byte_len() as u32
            };
            buf.extend_from_slice(&len.to_le_bytes());
        }

        let mut bitmap = vec![0u8; Self::null_bitmap_len(schema)];
        for (i, value) in self.values.iter().enumerate() {
            if value.is_null() {
                bitmap[i / 8] |= 1 << (i % 8);
            }
        }
        buf.extend_from_slice(&bitmap);

        for value in &self.values {
            if !value.is_null() {
                buf.extend_from_slice(&value.to_bytes());
            }
        }

        buf
    }

    /// Decodes one record from the front of `buf`, returning it along with
    /// the number of bytes consumed so the caller can advance to the next
    /// record in a densely-packed page body.
    pub fn from_bytes(schema: &Schema, buf: &[u8]) -> Result<(Self, usize)> {
        let header = RecordHeader::from_bytes(buf)?;
        let mut offset = RECORD_HEADER_SIZE;

        let var_field_count = schema.variable_length_field_count();
        let mut var_lengths = Vec::with_capacity(var_field_count);
        for _ in 0..var_field_count {
            let end = offset + 4;
            if buf.len() < end {
                return Err(StorageError::BytesizeMismatch {
                    expected: end,
                    actual: buf.len(),
                });
            }
            var_lengths.push(u32::from_le_bytes(buf[offset..end].try_into().unwrap()) as usize);
            offset = end;
        }

        let bitmap_len = Self::null_bitmap_len(schema);
        if buf.len() < offset + bitmap_len {
            return Err(StorageError::BytesizeMismatch {
                expected: offset + bitmap_len,
                actual: buf.len(),
            });
        }
        let bitmap = &buf[offset..offset + bitmap_len];
        offset += bitmap_len;

        let mut values = Vec::with_capacity(schema.len());
        let mut var_idx = 0;
        for (i, (_, field_type)) in schema.fields().iter().enumerate() {
            let is_null = bitmap[i / 8] & (1 << (i % 8)) != 0;
            if is_null {
                values.push(crate::field::Value::Null);
                if !field_type.is_fixed_length() {
                    var_idx += 1;
                }
                continue;
            }
            let len = if field_type.is_fixed_length() {
                field_type.fixed_byte_size().unwrap()
            } else {
                let l = var_lengths[var_idx];
                var_idx += 1;
                l
            };
            let end = offset + len;
            if buf.len() < end {
                return Err(StorageError::BytesizeMismatch {
                    expected: end,
                    actual: buf.len(),
                });
            }
            values.push(crate::field::Value::from_bytes(field_type, &buf[offset..end])?);
            offset = end;
        }

        Ok((Self { header, values }, offset))
    }
}
