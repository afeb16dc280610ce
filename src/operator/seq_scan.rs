use std::sync::Arc;

use crate::database::Database;
use crate::error::{DbError, DbResult};
use crate::field::TupleDesc;
use crate::heap_file::HeapFileIter;
use crate::ids::{TableId, TransactionId};
use crate::tuple::Tuple;

use super::OpIterator;

/// Streams every tuple of a table, in page-order/slot-order, through the
/// buffer pool. The cheapest possible leaf: no materialization, no
/// sorting, `rewind` just restarts the underlying heap file iterator.
pub struct SequentialScan<'db> {
    db: &'db Database,
    tid: TransactionId,
    table_id: TableId,
    desc: Arc<TupleDesc>,
    iter: Option<HeapFileIter<'db>>,
    peeked: Option<Option<Tuple>>,
}

impl<'db> SequentialScan<'db> {
    pub fn new(db: &'db Database, tid: TransactionId, table_id: TableId) -> DbResult<SequentialScan<'db>> {
        let desc = db.catalog().heap_file(table_id)?.tuple_desc();
        Ok(SequentialScan {
            db,
            tid,
            table_id,
            desc,
            iter: None,
            peeked: None,
        })
    }

    fn fill(&mut self) -> DbResult<()> {
        if self.peeked.is_some() {
            return Ok(());
        }
        let iter = self
            .iter
            .as_mut()
            .ok_or_else(|| DbError::no_such_element("sequential scan not open"))?;
        self.peeked = Some(match iter.next() {
            Some(Ok(tuple)) => Some(tuple),
            Some(Err(e)) => return Err(e),
            None => None,
        });
        Ok(())
    }
}

impl<'db> OpIterator for SequentialScan<'db> {
    fn open(&mut self) -> DbResult<()> {
        let heap_file = self.db.catalog().heap_file(self.table_id)?;
        self.iter = Some(heap_file.iter(self.db, self.tid));
        self.peeked = None;
        Ok(())
    }

    fn has_next(&mut self) -> DbResult<bool> {
        self.fill()?;
        Ok(self.peeked.as_ref().unwrap().is_some())
    }

    fn next(&mut self) -> DbResult<Option<Tuple>> {
        self.fill()?;
        Ok(self.peeked.take().unwrap())
    }

    fn rewind(&mut self) -> DbResult<()> {
        if let Some(iter) = self.iter.as_mut() {
            iter.rewind();
        }
        self.peeked = None;
        Ok(())
    }

    fn close(&mut self) {
        self.iter = None;
        self.peeked = None;
    }

    fn tuple_desc(&self) -> Arc<TupleDesc> {
        self.desc.clone()
    }

    fn children(&self) -> Vec<&dyn OpIterator> {
        Vec::new()
    }

    fn set_children(&mut self, children: Vec<Box<dyn OpIterator>>) -> DbResult<()> {
        if !children.is_empty() {
            return Err(DbError::illegal_argument("sequential scan takes no children"));
        }
        Ok(())
    }
}
