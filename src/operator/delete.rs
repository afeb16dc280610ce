use std::sync::Arc;

use crate::database::Database;
use crate::error::{DbError, DbResult};
use crate::field::{Field, FieldType, TupleDesc};
use crate::ids::TransactionId;
use crate::tuple::Tuple;

use super::OpIterator;

/// Drains its child and deletes every tuple it produces (by record id)
/// through the buffer pool, then emits a single tuple counting how many
/// rows were deleted.
pub struct Delete<'db> {
    db: &'db Database,
    tid: TransactionId,
    child: Box<dyn OpIterator>,
    desc: Arc<TupleDesc>,
    result: Option<i32>,
}

impl<'db> Delete<'db> {
    pub fn new(db: &'db Database, tid: TransactionId, child: Box<dyn OpIterator>) -> DbResult<Delete<'db>> {
        Ok(Delete {
            db,
            tid,
            child,
            desc: Arc::new(TupleDesc::from_types(vec![FieldType::Int])?),
            result: None,
        })
    }
}

impl<'db> OpIterator for Delete<'db> {
    fn open(&mut self) -> DbResult<()> {
        self.child.open()?;
        let mut count = 0;
        while let Some(tuple) = self.child.next()? {
            let rid = tuple
                .record_id()
                .ok_or_else(|| DbError::illegal_argument("deleted tuple has no record id"))?;
            let heap_file = self.db.catalog().heap_file(rid.page_id.table_id)?;
            heap_file.delete_tuple(self.db, self.tid, &tuple)?;
            count += 1;
        }
        self.result = Some(count);
        Ok(())
    }

    fn has_next(&mut self) -> DbResult<bool> {
        Ok(self.result.is_some())
    }

    fn next(&mut self) -> DbResult<Option<Tuple>> {
        match self.result.take() {
            Some(count) => Ok(Some(Tuple::new(self.desc.clone(), vec![Field::Int(count)])?)),
            None => Ok(None),
        }
    }

    fn rewind(&mut self) -> DbResult<()> {
        Err(DbError::illegal_argument("delete cannot be rewound"))
    }

    fn close(&mut self) {
        self.result = None;
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
            return Err(DbError::illegal_argument("delete takes exactly one child"));
        }
        self.child = children.remove(0);
        Ok(())
    }
}
