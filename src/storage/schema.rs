//! A record's shape: an ordered list of named, typed fields.

use crate::field::FieldType;

/// An ordered list of `(name, type)` pairs. The first field is always the
/// key field for a clustered table (§3 DATA MODEL).
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<(String, FieldType)>,
}

impl Schema {
    pub fn new(fields: Vec<(String, FieldType)>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[(String, FieldType)] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field_type(&self, index: usize) -> &FieldType {
        &self.fields[index].1
    }

    /// The type of the first field, which §3 DATA MODEL fixes as the
    /// primary key for a clustered table.
    pub fn key_field_type(&self) -> &FieldType {
        &self.fields[0].1
    }

    /// The schema inner (non-leaf) B+ tree pages encode their records
    /// against (§4.7): a separator key of the table's key type, paired
    /// with a 4-byte fixed-binary child page number. The first record on
    /// an inner page stores a null key (its slot is unused, §3) and is
    /// encoded against this same schema.
    pub fn inner_index_schema(&self) -> Schema {
        Schema::new(vec![
            ("key".to_string(), self.key_field_type().clone()),
            (
                "child".to_string(),
                FieldType::binary(4, false).expect("4 is a valid binary length"),
            ),
        ])
    }

    /// Sum of each field's component byte size: the fixed encoded size for
    /// fixed-length fields, or the declared maximum (4 bytes per Unicode
    /// scalar) for variable-length fields. Used to size fixed-capacity
    /// buffers; it is not the actual encoded length of any particular
    /// record, which may be smaller for variable-length fields.
    pub fn byte_size(&self) -> usize {
        self.fields
            .iter()
            .map(|(_, ty)| match ty {
                FieldType::Varchar { max_length, .. } => max_length * 4,
                _ => ty.fixed_byte_size().unwrap_or(0),
            })
            .sum()
    }

    /// Number of variable-length fields, i.e. the number of entries in a
    /// record's length-prefix table.
    pub fn variable_length_field_count(&self) -> usize {
        self.fields.iter().filter(|(_, ty)| !ty.is_fixed_length()).count()
    }

    /// Concatenates two schemas field-for-field, in order. Used when a
    /// split promotes a key into a parent whose schema is key-only.
    pub fn concat(&self, other: &Schema) -> Schema {
        let mut fields = self.fields.clone();
        fields.extend(other.fields.clone());
        Schema::new(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Schema {
        Schema::new(vec![
            ("id".into(), FieldType::integer(false)),
            ("name".into(), FieldType::varchar(16, true).unwrap()),
        ])
    }

    #[test]
    fn byte_size_sums_fixed_and_declared_max() {
        let schema = sample();
        assert_eq!(schema.byte_size(), 4 + 16 * 4);
    }

    #[test]
    fn variable_length_count() {
        let schema = sample();
        assert_eq!(schema.variable_length_field_count(), 1);
    }

    #[test]
    fn inner_index_schema_pairs_key_type_with_a_4_byte_child() {
        let schema = sample();
        let inner = schema.inner_index_schema();
        assert_eq!(inner.len(), 2);
        assert_eq!(inner.field_type(0), &FieldType::integer(false));
        assert_eq!(inner.field_type(1), &FieldType::binary(4, false).unwrap());
    }

    #[test]
    fn concat_appends_fields() {
        let a = Schema::new(vec![("id".into(), FieldType::integer(false))]);
        let b = Schema::new(vec![("flag".into(), FieldType::boolean(false))]);
        let c = a.concat(&b);
        assert_eq!(c.len(), 2);
        assert_eq!(c.fields()[1].0, "flag");
    }
}
