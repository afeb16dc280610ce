use std::sync::Arc;

use crate::error::{DbError, DbResult};
use crate::field::{FieldType, TupleDesc};
use crate::tuple::Tuple;

use super::OpIterator;

/// Stateless per-tuple projection: for each output row, picks `fields[i]`
/// from the child's row and stamps it with type `types[i]`.
pub struct Project {
    fields: Vec<usize>,
    desc: Arc<TupleDesc>,
    child: Box<dyn OpIterator>,
    peeked: Option<Option<Tuple>>,
}

impl Project {
    pub fn new(
        fields: Vec<usize>,
        types: Vec<FieldType>,
        names: Vec<Option<String>>,
        child: Box<dyn OpIterator>,
    ) -> DbResult<Project> {
        if fields.len() != types.len() {
            return Err(DbError::illegal_argument(
                "projected field and type counts must match",
            ));
        }
        let desc = Arc::new(TupleDesc::new(types, names)?);
        Ok(Project {
            fields,
            desc,
            child,
            peeked: None,
        })
    }

    fn project(&self, child_tuple: &Tuple) -> DbResult<Tuple> {
        let mut values = Vec::with_capacity(self.fields.len());
        for &i in &self.fields {
            values.push(child_tuple.field(i)?.clone());
        }
        Tuple::new(self.desc.clone(), values)
    }

    fn fill(&mut self) -> DbResult<()> {
        if self.peeked.is_none() {
            let projected = match self.child.next()? {
                Some(child_tuple) => Some(self.project(&child_tuple)?),
                None => None,
            };
            self.peeked = Some(projected);
        }
        Ok(())
    }
}

impl OpIterator for Project {
    fn open(&mut self) -> DbResult<()> {
        self.child.open()
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
        self.peeked = None;
        self.child.rewind()
    }

    fn close(&mut self) {
        self.peeked = None;
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
            return Err(DbError::illegal_argument("project takes exactly one child"));
        }
        self.child = children.remove(0);
        Ok(())
    }
}
