mod common;

use relstore::database::Database;
use relstore::field::{Field, Op};
use relstore::ids::TransactionId;
use relstore::operator::{Aggregate, AggregateOp, Join, OpIterator, SequentialScan, NO_GROUPING};
use relstore::predicate::JoinPredicate;

fn drain(op: &mut dyn OpIterator) -> Vec<Vec<Field>> {
    op.open().unwrap();
    let mut out = Vec::new();
    while let Some(t) = op.next().unwrap() {
        let fields = (0..t.tuple_desc().num_fields())
            .map(|i| t.field(i).unwrap().clone())
            .collect();
        out.push(fields);
    }
    out
}

#[test]
fn scan_yields_inserted_tuples_in_insertion_order() {
    common::setup();
    let heap_file = common::make_int_table("scan_order_t", 2);
    common::populate(&heap_file, &[&[1, 10], &[2, 20], &[3, 30]]);

    let db = Database::global();
    let tid = TransactionId::new();
    let mut scan = SequentialScan::new(db, tid, heap_file.table_id()).unwrap();
    let rows = drain(&mut scan);
    db.buffer_pool().transaction_complete(db, tid, true).unwrap();

    assert_eq!(
        rows,
        vec![
            vec![Field::Int(1), Field::Int(10)],
            vec![Field::Int(2), Field::Int(20)],
            vec![Field::Int(3), Field::Int(30)],
        ]
    );
}

#[test]
fn sort_merge_join_matches_nested_loop_as_a_multiset() {
    common::setup();
    let left_file = common::make_int_table("join_left_t", 1);
    let right_file = common::make_int_table("join_right_t", 1);
    common::populate(&left_file, &[&[1], &[1], &[2]]);
    common::populate(&right_file, &[&[1], &[1], &[3]]);

    let db = Database::global();

    let tid = TransactionId::new();
    let left = Box::new(SequentialScan::new(db, tid, left_file.table_id()).unwrap());
    let right = Box::new(SequentialScan::new(db, tid, right_file.table_id()).unwrap());
    let mut equals_join = Join::new(JoinPredicate::new(0, Op::Equals, 0), left, right);
    let mut equals_rows = drain(&mut equals_join);
    equals_rows.sort_by_key(|r| format!("{:?}", r));

    let mut manual_pairs = Vec::new();
    for a in [1, 1, 2] {
        for b in [1, 1, 3] {
            if a == b {
                manual_pairs.push(vec![Field::Int(a), Field::Int(b)]);
            }
        }
    }
    manual_pairs.sort_by_key(|r| format!("{:?}", r));

    db.buffer_pool().transaction_complete(db, tid, true).unwrap();

    assert_eq!(equals_rows, manual_pairs);
    assert_eq!(equals_rows.len(), 4, "four (1,1) pairs expected from two duplicates on each side");
}

#[test]
fn nested_loop_join_handles_a_non_equality_predicate() {
    common::setup();
    let left_file = common::make_int_table("nlj_left_t", 1);
    let right_file = common::make_int_table("nlj_right_t", 1);
    common::populate(&left_file, &[&[1], &[2], &[3]]);
    common::populate(&right_file, &[&[2], &[2], &[1]]);

    let db = Database::global();
    let tid = TransactionId::new();
    let left = Box::new(SequentialScan::new(db, tid, left_file.table_id()).unwrap());
    let right = Box::new(SequentialScan::new(db, tid, right_file.table_id()).unwrap());
    let mut join = Join::new(JoinPredicate::new(0, Op::GreaterThan, 0), left, right);
    let mut rows = drain(&mut join);
    db.buffer_pool().transaction_complete(db, tid, true).unwrap();
    rows.sort_by_key(|r| format!("{:?}", r));

    let mut expected = Vec::new();
    for a in [1, 2, 3] {
        for b in [2, 2, 1] {
            if a > b {
                expected.push(vec![Field::Int(a), Field::Int(b)]);
            }
        }
    }
    expected.sort_by_key(|r| format!("{:?}", r));

    assert_eq!(rows, expected);
}

#[test]
fn integer_average_aggregate() {
    common::setup();
    let heap_file = common::make_int_table("avg_t", 1);
    common::populate(&heap_file, &[&[2], &[4], &[6]]);

    let db = Database::global();
    let tid = TransactionId::new();
    let scan = Box::new(SequentialScan::new(db, tid, heap_file.table_id()).unwrap());
    let mut agg = Aggregate::new(scan, NO_GROUPING, 0, AggregateOp::Avg).unwrap();
    let rows = drain(&mut agg);
    db.buffer_pool().transaction_complete(db, tid, true).unwrap();

    assert_eq!(rows, vec![vec![Field::Int(4)]]);
}

#[test]
fn count_grouped_by_field_value() {
    common::setup();
    let heap_file = common::make_int_table("group_count_t", 1);
    common::populate(&heap_file, &[&[1], &[1], &[2]]);

    let db = Database::global();
    let tid = TransactionId::new();
    let scan = Box::new(SequentialScan::new(db, tid, heap_file.table_id()).unwrap());
    let mut agg = Aggregate::new(scan, 0, 0, AggregateOp::Count).unwrap();
    let mut rows = drain(&mut agg);
    db.buffer_pool().transaction_complete(db, tid, true).unwrap();
    rows.sort_by_key(|r| format!("{:?}", r));

    assert_eq!(
        rows,
        vec![
            vec![Field::Int(1), Field::Int(2)],
            vec![Field::Int(2), Field::Int(1)],
        ]
    );
}
