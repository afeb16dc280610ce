use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{DbError, DbResult};
use crate::field::{Field, FieldType, TupleDesc};
use crate::tuple::Tuple;

use super::{OpIterator, TupleListIterator};

/// Sentinel `group_field` value meaning "no GROUP BY": every input tuple
/// folds into a single accumulator.
pub const NO_GROUPING: usize = usize::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateOp {
    Count,
    Sum,
    Min,
    Max,
    Avg,
}

#[derive(Debug, Clone, PartialEq, Hash, Eq)]
enum GroupKey {
    None,
    Int(i32),
    Str(String),
}

struct IntAccumulator {
    count: i64,
    sum: i64,
    min: i32,
    max: i32,
}

impl IntAccumulator {
    fn new() -> IntAccumulator {
        IntAccumulator {
            count: 0,
            sum: 0,
            min: i32::MAX,
            max: i32::MIN,
        }
    }

    fn merge(&mut self, v: i32) {
        self.count += 1;
        self.sum += v as i64;
        self.min = self.min.min(v);
        self.max = self.max.max(v);
    }

    fn value(&self, op: AggregateOp) -> i32 {
        match op {
            AggregateOp::Count => self.count as i32,
            AggregateOp::Sum => self.sum as i32,
            AggregateOp::Min => self.min,
            AggregateOp::Max => self.max,
            AggregateOp::Avg => (self.sum / self.count.max(1)) as i32,
        }
    }
}

/// Accumulates an integer-valued aggregate, optionally grouped by another
/// field. Supports COUNT, SUM, MIN, MAX, AVG (AVG is carried as a running
/// `(count, sum)` pair and divided only when read out).
struct IntegerAggregator {
    group_field: usize,
    agg_field: usize,
    op: AggregateOp,
    groups: HashMap<GroupKey, IntAccumulator>,
    order: Vec<GroupKey>,
}

impl IntegerAggregator {
    fn new(group_field: usize, agg_field: usize, op: AggregateOp) -> Self {
        IntegerAggregator {
            group_field,
            agg_field,
            op,
            groups: HashMap::new(),
            order: Vec::new(),
        }
    }

    fn merge_tuple(&mut self, tuple: &Tuple) -> DbResult<()> {
        let key = if self.group_field == NO_GROUPING {
            GroupKey::None
        } else {
            match tuple.field(self.group_field)? {
                Field::Int(v) => GroupKey::Int(*v),
                Field::Str(s) => GroupKey::Str(s.clone()),
            }
        };
        let v = tuple
            .field(self.agg_field)?
            .as_int()
            .ok_or_else(|| DbError::illegal_argument("integer aggregate over a non-int field"))?;
        if !self.groups.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.groups.entry(key).or_insert_with(IntAccumulator::new).merge(v);
        Ok(())
    }

    fn tuples(&self, desc: Arc<TupleDesc>) -> DbResult<Vec<Tuple>> {
        let mut out = Vec::with_capacity(self.order.len());
        for key in &self.order {
            let acc = &self.groups[key];
            let value = Field::Int(acc.value(self.op));
            let fields = match key {
                GroupKey::None => vec![value],
                GroupKey::Int(v) => vec![Field::Int(*v), value],
                GroupKey::Str(s) => vec![Field::Str(s.clone()), value],
            };
            out.push(Tuple::new(desc.clone(), fields)?);
        }
        Ok(out)
    }
}

/// Accumulates a COUNT over a string-valued field; any other aggregate op
/// is rejected at construction.
struct StringAggregator {
    group_field: usize,
    counts: HashMap<GroupKey, i64>,
    order: Vec<GroupKey>,
}

impl StringAggregator {
    fn new(group_field: usize, op: AggregateOp) -> DbResult<Self> {
        if op != AggregateOp::Count {
            return Err(DbError::illegal_argument(
                "string aggregation supports only COUNT",
            ));
        }
        Ok(StringAggregator {
            group_field,
            counts: HashMap::new(),
            order: Vec::new(),
        })
    }

    fn merge_tuple(&mut self, tuple: &Tuple) -> DbResult<()> {
        let key = if self.group_field == NO_GROUPING {
            GroupKey::None
        } else {
            match tuple.field(self.group_field)? {
                Field::Int(v) => GroupKey::Int(*v),
                Field::Str(s) => GroupKey::Str(s.clone()),
            }
        };
        if !self.counts.contains_key(&key) {
            self.order.push(key.clone());
        }
        *self.counts.entry(key).or_insert(0) += 1;
        Ok(())
    }

    fn tuples(&self, desc: Arc<TupleDesc>) -> DbResult<Vec<Tuple>> {
        let mut out = Vec::with_capacity(self.order.len());
        for key in &self.order {
            let value = Field::Int(self.counts[key] as i32);
            let fields = match key {
                GroupKey::None => vec![value],
                GroupKey::Int(v) => vec![Field::Int(*v), value],
                GroupKey::Str(s) => vec![Field::Str(s.clone()), value],
            };
            out.push(Tuple::new(desc.clone(), fields)?);
        }
        Ok(out)
    }
}

enum Inner {
    Int(IntegerAggregator),
    Str(StringAggregator),
}

/// Groups the child's output by `group_field` (or folds it all into one
/// row, if `group_field == NO_GROUPING`) and computes `op` over
/// `agg_field`. Dispatches on the aggregated field's type to an
/// `IntegerAggregator` or `StringAggregator`, mirroring the two
/// concrete accumulators the aggregate field's type determines.
pub struct Aggregate {
    child: Box<dyn OpIterator>,
    group_field: usize,
    agg_field: usize,
    op: AggregateOp,
    desc: Arc<TupleDesc>,
    inner: Option<Inner>,
    output: Option<TupleListIterator>,
}

impl Aggregate {
    pub fn new(
        child: Box<dyn OpIterator>,
        group_field: usize,
        agg_field: usize,
        op: AggregateOp,
    ) -> DbResult<Aggregate> {
        let child_desc = child.tuple_desc();
        let agg_type = child_desc.field_type(agg_field)?;

        let desc = if group_field == NO_GROUPING {
            Arc::new(TupleDesc::from_types(vec![FieldType::Int])?)
        } else {
            let group_type = child_desc.field_type(group_field)?;
            Arc::new(TupleDesc::from_types(vec![group_type, FieldType::Int])?)
        };

        if agg_type == FieldType::Str && op != AggregateOp::Count {
            return Err(DbError::illegal_argument(
                "string aggregation supports only COUNT",
            ));
        }

        Ok(Aggregate {
            child,
            group_field,
            agg_field,
            op,
            desc,
            inner: None,
            output: None,
        })
    }
}

impl OpIterator for Aggregate {
    fn open(&mut self) -> DbResult<()> {
        self.child.open()?;
        let child_desc = self.child.tuple_desc();
        let agg_type = child_desc.field_type(self.agg_field)?;

        let mut inner = match agg_type {
            FieldType::Int => {
                Inner::Int(IntegerAggregator::new(self.group_field, self.agg_field, self.op))
            }
            FieldType::Str => Inner::Str(StringAggregator::new(self.group_field, self.op)?),
        };

        while let Some(tuple) = self.child.next()? {
            match &mut inner {
                Inner::Int(a) => a.merge_tuple(&tuple)?,
                Inner::Str(a) => a.merge_tuple(&tuple)?,
            }
        }

        let tuples = match &inner {
            Inner::Int(a) => a.tuples(self.desc.clone())?,
            Inner::Str(a) => a.tuples(self.desc.clone())?,
        };
        self.inner = Some(inner);
        self.output = Some(TupleListIterator::new(self.desc.clone(), tuples));
        Ok(())
    }

    fn has_next(&mut self) -> DbResult<bool> {
        match &self.output {
            Some(o) => Ok(o.has_next()),
            None => Err(DbError::no_such_element("aggregate not open")),
        }
    }

    fn next(&mut self) -> DbResult<Option<Tuple>> {
        match &mut self.output {
            Some(o) => Ok(o.next()),
            None => Err(DbError::no_such_element("aggregate not open")),
        }
    }

    fn rewind(&mut self) -> DbResult<()> {
        if let Some(o) = &mut self.output {
            o.rewind();
        }
        Ok(())
    }

    fn close(&mut self) {
        self.inner = None;
        self.output = None;
        self.child.close();
    }

    fn tuple_desc(&self) -> Arc<TupleDesc> {
        self.desc.clone()
    }

    fn children(&self) -> Vec<&dyn OpIterator> {
        vec![self.child.as_ref()]
    }

    fn set_children(&mut self, mut children: Vec<Box<dyn OpIterator>>) -> DbResult<()> {
        if children.len() != 1 {
            return Err(DbError::illegal_argument("aggregate takes exactly one child"));
        }
        self.child = children.remove(0);
        Ok(())
    }
}
