use std::sync::Arc;

use crate::error::{DbError, DbResult};
use crate::field::TupleDesc;
use crate::predicate::Predicate;
use crate::tuple::Tuple;

use super::{OpIterator, TupleListIterator};

/// Materializes every tuple its child produces that satisfies `predicate`
/// during `open`, so `rewind` is a cheap pointer reset rather than
/// re-running the child.
pub struct Filter {
    predicate: Predicate,
    child: Box<dyn OpIterator>,
    buffered: Option<TupleListIterator>,
}

impl Filter {
    pub fn new(predicate: Predicate, child: Box<dyn OpIterator>) -> Filter {
        Filter {
            predicate,
            child,
            buffered: None,
        }
    }
}

impl OpIterator for Filter {
    fn open(&mut self) -> DbResult<()> {
        self.child.open()?;
        let desc = self.child.tuple_desc();
        let mut out = Vec::new();
        while let Some(tuple) = self.child.next()? {
            if self.predicate.is_satisfied_by(&tuple) {
                out.push(tuple);
            }
        }
        self.buffered = Some(TupleListIterator::new(desc, out));
        Ok(())
    }

    fn has_next(&mut self) -> DbResult<bool> {
        match &self.buffered {
            Some(b) => Ok(b.has_next()),
            None => Err(DbError::no_such_element("filter not open")),
        }
    }

    fn next(&mut self) -> DbResult<Option<Tuple>> {
        match &mut self.buffered {
            Some(b) => Ok(b.next()),
            None => Err(DbError::no_such_element("filter not open")),
        }
    }

    fn rewind(&mut self) -> DbResult<()> {
        if let Some(b) = &mut self.buffered {
            b.rewind();
        }
        Ok(())
    }

    fn close(&mut self) {
        self.buffered = None;
        self.child.close();
    }

    fn tuple_desc(&self) -> Arc<TupleDesc> {
        self.child.tuple_desc()
    }

    fn children(&self) -> Vec<&dyn OpIterator> {
        vec![self.child.as_ref()]
    }

    fn set_children(&mut self, mut children: Vec<Box<dyn OpIterator>>) -> DbResult<()> {
        if children.len() != 1 {
            return Err(DbError::illegal_argument("filter takes exactly one child"));
        }
        self.child = children.remove(0);
        Ok(())
    }
}
