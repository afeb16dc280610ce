mod common;

use relstore::database::Database;
use relstore::field::{Field, Op};
use relstore::ids::TransactionId;
use relstore::operator::{Delete, Filter, Insert, OpIterator, SequentialScan};
use relstore::predicate::Predicate;

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
fn insert_operator_copies_every_source_row_and_reports_the_count() {
    common::setup();
    let source = common::make_int_table("insert_src_t", 1);
    common::populate(&source, &[&[1], &[2], &[3]]);
    let target = common::make_int_table("insert_dst_t", 1);

    let db = Database::global();
    let tid = TransactionId::new();
    let scan = Box::new(SequentialScan::new(db, tid, source.table_id()).unwrap());
    let mut insert = Insert::new(db, tid, target.table_id(), scan).unwrap();
    let result = drain(&mut insert);
    assert_eq!(result, vec![vec![Field::Int(3)]]);

    let mut rescan = SequentialScan::new(db, tid, target.table_id()).unwrap();
    let rows = drain(&mut rescan);
    db.buffer_pool().transaction_complete(db, tid, true).unwrap();

    assert_eq!(rows, vec![vec![Field::Int(1)], vec![Field::Int(2)], vec![Field::Int(3)]]);
}

#[test]
fn insert_then_abort_leaves_the_target_table_empty() {
    common::setup();
    let source = common::make_int_table("insert_abort_src_t", 1);
    common::populate(&source, &[&[7]]);
    let target = common::make_int_table("insert_abort_dst_t", 1);

    let db = Database::global();
    let tid = TransactionId::new();
    let scan = Box::new(SequentialScan::new(db, tid, source.table_id()).unwrap());
    let mut insert = Insert::new(db, tid, target.table_id(), scan).unwrap();
    drain(&mut insert);
    db.buffer_pool().transaction_complete(db, tid, false).unwrap();

    let tid2 = TransactionId::new();
    let mut rescan = SequentialScan::new(db, tid2, target.table_id()).unwrap();
    let rows = drain(&mut rescan);
    db.buffer_pool().transaction_complete(db, tid2, true).unwrap();

    assert!(rows.is_empty());
}

#[test]
fn delete_operator_removes_matching_rows_and_reports_the_count() {
    common::setup();
    let heap_file = common::make_int_table("delete_t", 1);
    common::populate(&heap_file, &[&[1], &[2], &[3], &[4]]);

    let db = Database::global();
    let tid = TransactionId::new();
    let scan = Box::new(SequentialScan::new(db, tid, heap_file.table_id()).unwrap());
    let filtered = Box::new(Filter::new(Predicate::new(0, Op::GreaterThan, Field::Int(2)), scan));
    let mut delete = Delete::new(db, tid, filtered).unwrap();
    let result = drain(&mut delete);
    assert_eq!(result, vec![vec![Field::Int(2)]]);

    let mut rescan = SequentialScan::new(db, tid, heap_file.table_id()).unwrap();
    let rows = drain(&mut rescan);
    db.buffer_pool().transaction_complete(db, tid, true).unwrap();

    assert_eq!(rows, vec![vec![Field::Int(1)], vec![Field::Int(2)]]);
}
