use std::sync::Arc;

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{DbError, DbResult};
use crate::field::{Field, FieldType, TupleDesc, STRING_MAX_LEN};
use crate::ids::RecordId;

/// A row: a fixed-arity, schema-typed sequence of field values plus the
/// slot it was read from (if any — freshly constructed tuples have none
/// until `insert_tuple` stamps one on).
#[derive(Debug, Clone)]
pub struct Tuple {
    desc: Arc<TupleDesc>,
    fields: Vec<Field>,
    record_id: Option<RecordId>,
}

impl Tuple {
    pub fn new(desc: Arc<TupleDesc>, fields: Vec<Field>) -> DbResult<Tuple> {
        if fields.len() != desc.num_fields() {
            return Err(DbError::illegal_argument(format!(
                "expected {} fields, got {}",
                desc.num_fields(),
                fields.len()
            )));
        }
        for (i, field) in fields.iter().enumerate() {
            if field.field_type() != desc.field_type(i)? {
                return Err(DbError::illegal_argument(format!(
                    "field {} has type {:?}, schema expects {:?}",
                    i,
                    field.field_type(),
                    desc.field_type(i)?
                )));
            }
        }
        Ok(Tuple {
            desc,
            fields,
            record_id: None,
        })
    }

    pub fn tuple_desc(&self) -> Arc<TupleDesc> {
        self.desc.clone()
    }

    pub fn field(&self, i: usize) -> DbResult<&Field> {
        self.fields
            .get(i)
            .ok_or_else(|| DbError::no_such_element(format!("no field at index {}", i)))
    }

    pub fn set_field(&mut self, i: usize, value: Field) -> DbResult<()> {
        if i >= self.fields.len() {
            return Err(DbError::no_such_element(format!("no field at index {}", i)));
        }
        self.fields[i] = value;
        Ok(())
    }

    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    pub fn set_record_id(&mut self, rid: RecordId) {
        self.record_id = Some(rid);
    }

    pub fn clear_record_id(&mut self) {
        self.record_id = None;
    }

    /// Concatenates two tuples field-for-field; duplicated columns (e.g.
    /// both sides of a join carrying the join key) are preserved, not
    /// deduplicated.
    pub fn merge(left: &Tuple, right: &Tuple) -> Tuple {
        let desc = Arc::new(TupleDesc::merge(&left.desc, &right.desc));
        let mut fields = left.fields.clone();
        fields.extend(right.fields.iter().cloned());
        Tuple {
            desc,
            fields,
            record_id: None,
        }
    }

    pub(crate) fn encode(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(self.desc.tuple_size());
        for field in &self.fields {
            match field {
                Field::Int(v) => buf.put_i32(*v),
                Field::Str(s) => {
                    let bytes = s.as_bytes();
                    let len = bytes.len().min(STRING_MAX_LEN);
                    buf.put_i32(len as i32);
                    buf.put_slice(&bytes[..len]);
                    buf.put_bytes(0, STRING_MAX_LEN - len);
                }
            }
        }
        buf.to_vec()
    }

    pub(crate) fn decode(desc: Arc<TupleDesc>, bytes: &[u8]) -> DbResult<Tuple> {
        let mut cursor = bytes;
        let mut fields = Vec::with_capacity(desc.num_fields());
        for i in 0..desc.num_fields() {
            match desc.field_type(i)? {
                FieldType::Int => fields.push(Field::Int(cursor.get_i32())),
                FieldType::Str => {
                    let len = (cursor.get_i32() as usize).min(STRING_MAX_LEN);
                    let raw = &cursor[..STRING_MAX_LEN];
                    let s = String::from_utf8_lossy(&raw[..len]).into_owned();
                    cursor.advance(STRING_MAX_LEN);
                    fields.push(Field::Str(s));
                }
            }
        }
        Ok(Tuple {
            desc,
            fields,
            record_id: None,
        })
    }
}

impl PartialEq for Tuple {
    /// Content equality, ignoring `record_id`: two tuples read from
    /// different slots with the same field values are still "equal" for
    /// delete-time slot verification.
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

impl std::fmt::Display for Tuple {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let rendered: Vec<String> = self.fields.iter().map(|v| v.to_string()).collect();
        write!(f, "({})", rendered.join(", "))
    }
}
