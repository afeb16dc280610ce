mod common;

use relstore::database::Database;
use relstore::field::Op;
use relstore::histogram::IntHistogram;
use relstore::ids::TransactionId;

#[test]
fn equality_selectivity_sums_to_one_across_every_value() {
    let mut hist = IntHistogram::new(10, 1, 100);
    for v in 1..=100 {
        hist.add_value(v);
    }
    let total: f64 = (1..=100).map(|v| hist.estimate_selectivity(Op::Equals, v)).sum();
    assert!((total - 1.0).abs() < 1.0 / 100.0);
}

#[test]
fn values_outside_range_are_degenerate() {
    let mut hist = IntHistogram::new(10, 1, 100);
    for v in 1..=100 {
        hist.add_value(v);
    }
    assert_eq!(hist.estimate_selectivity(Op::Equals, 0), 0.0);
    assert_eq!(hist.estimate_selectivity(Op::GreaterThan, 0), 1.0);
    assert_eq!(hist.estimate_selectivity(Op::Equals, 101), 0.0);
    assert_eq!(hist.estimate_selectivity(Op::GreaterThan, 101), 0.0);
}

#[test]
fn empty_histogram_is_a_safe_over_estimate() {
    let hist = IntHistogram::new(10, 1, 100);
    assert_eq!(hist.estimate_selectivity(Op::Equals, 50), 1.0);
}

#[test]
fn table_stats_are_cached_across_calls() {
    common::setup();
    let heap_file = common::make_int_table("stats_t", 1);
    common::populate(&heap_file, &[&[1], &[2], &[3], &[3]]);

    let db = Database::global();
    let tid = TransactionId::new();
    let first = db.table_stats(heap_file.table_id(), tid).unwrap();
    let second = db.table_stats(heap_file.table_id(), tid).unwrap();

    assert_eq!(first.num_tuples(), 4);
    assert!(std::sync::Arc::ptr_eq(&first, &second), "second call must hit the cache");
}
