use std::sync::Arc;

use crate::error::{DbError, DbResult};
use crate::field::{Op, TupleDesc};
use crate::predicate::JoinPredicate;
use crate::tuple::Tuple;

use super::{OpIterator, TupleListIterator};

/// Joins `left` and `right` on `predicate`. An `Equals` predicate takes
/// the sort-merge path (both sides materialized and sorted once, then
/// walked with two indices); anything else falls back to a nested loop
/// with the right child rewound between left tuples.
pub struct Join {
    predicate: JoinPredicate,
    left: Box<dyn OpIterator>,
    right: Box<dyn OpIterator>,
    desc: Arc<TupleDesc>,
    state: JoinState,
}

enum JoinState {
    Unopened,
    SortMerge(TupleListIterator),
    NestedLoop {
        left_tuples: Vec<Tuple>,
        left_pos: usize,
        current_left: Option<Tuple>,
    },
}

impl Join {
    pub fn new(predicate: JoinPredicate, left: Box<dyn OpIterator>, right: Box<dyn OpIterator>) -> Join {
        let desc = Arc::new(TupleDesc::merge(&left.tuple_desc(), &right.tuple_desc()));
        Join {
            predicate,
            left,
            right,
            desc,
            state: JoinState::Unopened,
        }
    }

    fn sort_merge(&mut self) -> DbResult<Vec<Tuple>> {
        let mut left_tuples = Vec::new();
        while let Some(t) = self.left.next()? {
            left_tuples.push(t);
        }
        let mut right_tuples = Vec::new();
        while let Some(t) = self.right.next()? {
            right_tuples.push(t);
        }

        let left_idx = self.predicate.left_index;
        let right_idx = self.predicate.right_index;
        left_tuples.sort_by(|a, b| {
            a.field(left_idx)
                .unwrap()
                .partial_cmp(b.field(left_idx).unwrap())
                .unwrap()
        });
        right_tuples.sort_by(|a, b| {
            a.field(right_idx)
                .unwrap()
                .partial_cmp(b.field(right_idx).unwrap())
                .unwrap()
        });

        let mut output = Vec::new();
        let (mut i, mut j) = (0usize, 0usize);
        while i < left_tuples.len() && j < right_tuples.len() {
            let lv = left_tuples[i].field(left_idx)?;
            let rv = right_tuples[j].field(right_idx)?;
            match lv.partial_cmp(rv).unwrap() {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    let backup_j = j;
                    let key = left_tuples[i].field(left_idx)?.clone();
                    while i < left_tuples.len() && *left_tuples[i].field(left_idx)? == key {
                        j = backup_j;
                        while j < right_tuples.len() && *right_tuples[j].field(right_idx)? == key {
                            output.push(Tuple::merge(&left_tuples[i], &right_tuples[j]));
                            j += 1;
                        }
                        i += 1;
                    }
                }
            }
        }
        Ok(output)
    }

    fn nested_loop_next(&mut self) -> DbResult<Option<Tuple>> {
        loop {
            let (left_tuples, left_pos, current_left) = match &mut self.state {
                JoinState::NestedLoop {
                    left_tuples,
                    left_pos,
                    current_left,
                } => (left_tuples, left_pos, current_left),
                _ => unreachable!(),
            };

            if current_left.is_none() {
                if *left_pos >= left_tuples.len() {
                    return Ok(None);
                }
                *current_left = Some(left_tuples[*left_pos].clone());
                *left_pos += 1;
                self.right.rewind()?;
            }

            while let Some(right_tuple) = self.right.next()? {
                let left_tuple = match &self.state {
                    JoinState::NestedLoop { current_left, .. } => current_left.as_ref().unwrap(),
                    _ => unreachable!(),
                };
                if self.predicate.is_satisfied_by(left_tuple, &right_tuple) {
                    return Ok(Some(Tuple::merge(left_tuple, &right_tuple)));
                }
            }

            if let JoinState::NestedLoop { current_left, .. } = &mut self.state {
                *current_left = None;
            }
        }
    }
}

impl OpIterator for Join {
    fn open(&mut self) -> DbResult<()> {
        self.left.open()?;
        self.right.open()?;
        self.state = if self.predicate.op == Op::Equals {
            let merged = self.sort_merge()?;
            JoinState::SortMerge(TupleListIterator::new(self.desc.clone(), merged))
        } else {
            let mut left_tuples = Vec::new();
            while let Some(t) = self.left.next()? {
                left_tuples.push(t);
            }
            JoinState::NestedLoop {
                left_tuples,
                left_pos: 0,
                current_left: None,
            }
        };
        Ok(())
    }

    fn has_next(&mut self) -> DbResult<bool> {
        match &self.state {
            JoinState::Unopened => Err(DbError::no_such_element("join not open")),
            JoinState::SortMerge(it) => Ok(it.has_next()),
            JoinState::NestedLoop { left_tuples, left_pos, current_left } => {
                Ok(current_left.is_some() || *left_pos < left_tuples.len())
            }
        }
    }

    fn next(&mut self) -> DbResult<Option<Tuple>> {
        match &mut self.state {
            JoinState::Unopened => Err(DbError::no_such_element("join not open")),
            JoinState::SortMerge(it) => Ok(it.next()),
            JoinState::NestedLoop { .. } => self.nested_loop_next(),
        }
    }

    fn rewind(&mut self) -> DbResult<()> {
        match &mut self.state {
            JoinState::SortMerge(it) => {
                it.rewind();
                Ok(())
            }
            JoinState::NestedLoop {
                left_pos,
                current_left,
                ..
            } => {
                *left_pos = 0;
                *current_left = None;
                self.left.rewind()?;
                self.right.rewind()
            }
            JoinState::Unopened => Ok(()),
        }
    }

    fn close(&mut self) {
        self.state = JoinState::Unopened;
        self.left.close();
        self.right.close();
    }

    fn tuple_desc(&self) -> Arc<TupleDesc> {
        self.desc.clone()
    }

    fn children(&self) -> Vec<&dyn OpIterator> {
        vec![self.left.as_ref(), self.right.as_ref()]
    }

    fn set_children(&mut self, mut children: Vec<Box<dyn OpIterator>>) -> DbResult<()> {
        if children.len() != 2 {
            return Err(DbError::illegal_argument("join takes exactly two children"));
        }
        self.right = children.remove(1);
        self.left = children.remove(0);
        Ok(())
    }
}
