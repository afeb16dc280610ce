mod aggregate;
mod delete;
mod filter;
mod insert;
mod join;
mod project;
mod seq_scan;

pub use aggregate::{Aggregate, AggregateOp, NO_GROUPING};
pub use delete::Delete;
pub use filter::Filter;
pub use insert::Insert;
pub use join::Join;
pub use project::Project;
pub use seq_scan::SequentialScan;

use std::sync::Arc;

use crate::error::DbResult;
use crate::field::TupleDesc;
use crate::tuple::Tuple;

/// The pull-based contract every query operator implements. `open` may do
/// real work (materializing, sorting); `next`/`has_next` must not be
/// called before `open`. `close` releases per-run state so the operator
/// can be `open`ed again, but does not consume the operator itself.
pub trait OpIterator {
    fn open(&mut self) -> DbResult<()>;
    fn has_next(&mut self) -> DbResult<bool>;
    fn next(&mut self) -> DbResult<Option<Tuple>>;
    fn rewind(&mut self) -> DbResult<()>;
    fn close(&mut self);
    fn tuple_desc(&self) -> Arc<TupleDesc>;
    fn children(&self) -> Vec<&dyn OpIterator>;
    fn set_children(&mut self, children: Vec<Box<dyn OpIterator>>) -> DbResult<()>;
}

/// Buffers an already-materialized sequence of tuples behind the
/// `OpIterator` contract. Several operators (`Filter`, `Join`'s
/// sort-merge path) build their entire output up front during `open` and
/// just need something to hand it back out through.
pub(crate) struct TupleListIterator {
    desc: Arc<TupleDesc>,
    tuples: Vec<Tuple>,
    pos: usize,
}

impl TupleListIterator {
    pub(crate) fn new(desc: Arc<TupleDesc>, tuples: Vec<Tuple>) -> TupleListIterator {
        TupleListIterator {
            desc,
            tuples,
            pos: 0,
        }
    }

    pub(crate) fn tuple_desc(&self) -> Arc<TupleDesc> {
        self.desc.clone()
    }

    pub(crate) fn has_next(&self) -> bool {
        self.pos < self.tuples.len()
    }

    pub(crate) fn next(&mut self) -> Option<Tuple> {
        if self.pos < self.tuples.len() {
            let t = self.tuples[self.pos].clone();
            self.pos += 1;
            Some(t)
        } else {
            None
        }
    }

    pub(crate) fn rewind(&mut self) {
        self.pos = 0;
    }
}
