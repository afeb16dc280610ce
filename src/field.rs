use std::cmp::Ordering;
use std::sync::Arc;

use crate::error::{DbError, DbResult};

/// Fixed maximum width, in bytes, of a STRING field's content. The wire
/// format always reserves this many bytes regardless of actual string
/// length (see `Field::encode`).
pub const STRING_MAX_LEN: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Int,
    Str,
}

impl FieldType {
    /// Bytes occupied on disk: 4 for INT, 4 (length prefix) + 128 for STRING.
    pub fn byte_width(&self) -> usize {
        match self {
            FieldType::Int => 4,
            FieldType::Str => 4 + STRING_MAX_LEN,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanOrEq,
    LessThan,
    LessThanOrEq,
}

/// A typed, immutable field value. Comparisons between mismatched variants
/// are a caller bug (predicates and join keys are built against a known
/// schema); `partial_cmp` returns `None` for them rather than panicking.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Int(i32),
    Str(String),
}

impl Field {
    pub fn field_type(&self) -> FieldType {
        match self {
            Field::Int(_) => FieldType::Int,
            Field::Str(_) => FieldType::Str,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Field::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Field::Str(v) => Some(v),
            _ => None,
        }
    }

    /// Evaluates `self <op> other`, e.g. `Field::Int(3).matches(Op::LessThan,
    /// &Field::Int(5))`.
    pub fn matches(&self, op: Op, other: &Field) -> bool {
        let ord = self
            .partial_cmp(other)
            .expect("predicate compared fields of different types");
        match op {
            Op::Equals => ord == Ordering::Equal,
            Op::NotEquals => ord != Ordering::Equal,
            Op::GreaterThan => ord == Ordering::Greater,
            Op::GreaterThanOrEq => ord != Ordering::Less,
            Op::LessThan => ord == Ordering::Less,
            Op::LessThanOrEq => ord != Ordering::Greater,
        }
    }
}

impl PartialOrd for Field {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Field::Int(a), Field::Int(b)) => a.partial_cmp(b),
            (Field::Str(a), Field::Str(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Field::Int(v) => write!(f, "{}", v),
            Field::Str(v) => write!(f, "{}", v),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub field_type: FieldType,
    pub name: Option<String>,
}

/// An ordered schema: field count never changes once built.
#[derive(Debug, Clone, PartialEq)]
pub struct TupleDesc {
    fields: Vec<FieldSpec>,
}

impl TupleDesc {
    pub fn new(types: Vec<FieldType>, names: Vec<Option<String>>) -> DbResult<TupleDesc> {
        if types.len() != names.len() {
            return Err(DbError::illegal_argument(
                "field type and field name counts must match",
            ));
        }
        if types.is_empty() {
            return Err(DbError::illegal_argument(
                "a tuple descriptor must have at least one field",
            ));
        }
        let fields = types
            .into_iter()
            .zip(names)
            .map(|(field_type, name)| FieldSpec { field_type, name })
            .collect();
        Ok(TupleDesc { fields })
    }

    pub fn from_types(types: Vec<FieldType>) -> DbResult<TupleDesc> {
        let n = types.len();
        TupleDesc::new(types, vec![None; n])
    }

    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    pub fn field_type(&self, i: usize) -> DbResult<FieldType> {
        self.fields
            .get(i)
            .map(|f| f.field_type)
            .ok_or_else(|| DbError::no_such_element(format!("no field at index {}", i)))
    }

    pub fn field_name(&self, i: usize) -> DbResult<Option<&str>> {
        self.fields
            .get(i)
            .map(|f| f.name.as_deref())
            .ok_or_else(|| DbError::no_such_element(format!("no field at index {}", i)))
    }

    pub fn index_for_name(&self, name: &str) -> DbResult<usize> {
        self.fields
            .iter()
            .position(|f| f.name.as_deref() == Some(name))
            .ok_or_else(|| DbError::no_such_element(format!("no field named {}", name)))
    }

    /// Total on-disk byte width of one tuple under this schema.
    pub fn tuple_size(&self) -> usize {
        self.fields.iter().map(|f| f.field_type.byte_width()).sum()
    }

    pub fn merge(left: &TupleDesc, right: &TupleDesc) -> TupleDesc {
        let mut fields = left.fields.clone();
        fields.extend(right.fields.iter().cloned());
        TupleDesc { fields }
    }
}

pub fn arc_desc(desc: TupleDesc) -> Arc<TupleDesc> {
    Arc::new(desc)
}
