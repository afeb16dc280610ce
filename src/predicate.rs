use crate::field::{Field, Op};
use crate::tuple::Tuple;

/// A single-field predicate evaluated by a `Filter` operator:
/// `tuple.field(field_index) <op> operand`.
#[derive(Debug, Clone)]
pub struct Predicate {
    pub field_index: usize,
    pub op: Op,
    pub operand: Field,
}

impl Predicate {
    pub fn new(field_index: usize, op: Op, operand: Field) -> Predicate {
        Predicate {
            field_index,
            op,
            operand,
        }
    }

    pub fn is_satisfied_by(&self, tuple: &Tuple) -> bool {
        match tuple.field(self.field_index) {
            Ok(field) => field.matches(self.op, &self.operand),
            Err(_) => false,
        }
    }
}

/// A two-field predicate evaluated by a `Join` operator:
/// `left.field(left_index) <op> right.field(right_index)`.
#[derive(Debug, Clone)]
pub struct JoinPredicate {
    pub left_index: usize,
    pub op: Op,
    pub right_index: usize,
}

impl JoinPredicate {
    pub fn new(left_index: usize, op: Op, right_index: usize) -> JoinPredicate {
        JoinPredicate {
            left_index,
            op,
            right_index,
        }
    }

    pub fn is_satisfied_by(&self, left: &Tuple, right: &Tuple) -> bool {
        match (left.field(self.left_index), right.field(self.right_index)) {
            (Ok(l), Ok(r)) => l.matches(self.op, r),
            _ => false,
        }
    }
}
