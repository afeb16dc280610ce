mod common;

use relstore::field::{Field, FieldType, TupleDesc};
use relstore::heap_page::{slots_per_page, HeapPage};
use relstore::ids::{PageId, TableId, TransactionId};
use relstore::tuple::Tuple;
use std::sync::Arc;

fn two_int_desc() -> Arc<TupleDesc> {
    Arc::new(TupleDesc::from_types(vec![FieldType::Int, FieldType::Int]).unwrap())
}

#[test]
fn serialize_deserialize_round_trips() {
    let desc = two_int_desc();
    let pid = PageId::new(TableId(1), 0);
    let mut page = HeapPage::new_empty(pid, desc.clone());
    for i in 0..5 {
        page.insert_tuple(Tuple::new(desc.clone(), vec![Field::Int(i), Field::Int(i * 10)]).unwrap())
            .unwrap();
    }
    let bytes = page.serialize();
    let reloaded = HeapPage::deserialize(&bytes, pid, desc).unwrap();
    assert_eq!(reloaded.serialize(), bytes);
    assert_eq!(reloaded.iter().count(), 5);
}

#[test]
fn insert_then_iterate_yields_inserted_tuples_and_slot_counts_partition() {
    let desc = two_int_desc();
    let pid = PageId::new(TableId(2), 0);
    let mut page = HeapPage::new_empty(pid, desc.clone());
    let capacity = slots_per_page(&desc);

    let rows: Vec<(i32, i32)> = (0..capacity as i32).map(|i| (i, i * 2)).collect();
    for &(a, b) in &rows {
        page.insert_tuple(Tuple::new(desc.clone(), vec![Field::Int(a), Field::Int(b)]).unwrap())
            .unwrap();
    }

    assert_eq!(page.num_empty_slots(), 0);
    assert_eq!(page.num_empty_slots() + page.iter().count(), capacity);

    let seen: Vec<(i32, i32)> = page
        .iter()
        .map(|t| (t.field(0).unwrap().as_int().unwrap(), t.field(1).unwrap().as_int().unwrap()))
        .collect();
    assert_eq!(seen, rows);

    // Page is now full; one more insert must fail.
    let overflow = Tuple::new(desc, vec![Field::Int(999), Field::Int(999)]).unwrap();
    assert!(page.insert_tuple(overflow).is_err());
}

#[test]
fn delete_tuple_requires_matching_content_and_slot() {
    let desc = two_int_desc();
    let pid = PageId::new(TableId(3), 0);
    let mut page = HeapPage::new_empty(pid, desc.clone());
    page.insert_tuple(Tuple::new(desc.clone(), vec![Field::Int(1), Field::Int(2)]).unwrap())
        .unwrap();

    let inserted = page.iter().next().unwrap().clone();
    page.delete_tuple(&inserted).unwrap();
    assert_eq!(page.iter().count(), 0);

    // Deleting again (slot now empty) must fail.
    assert!(page.delete_tuple(&inserted).is_err());
}

#[test]
fn before_image_reflects_load_time_snapshot() {
    let desc = two_int_desc();
    let pid = PageId::new(TableId(4), 0);
    let mut page = HeapPage::new_empty(pid, desc.clone());
    let before = page.before_image();

    page.insert_tuple(Tuple::new(desc, vec![Field::Int(7), Field::Int(8)]).unwrap())
        .unwrap();
    page.mark_dirty(true, TransactionId::new());

    // The page's content has changed but the before-image has not.
    assert_ne!(page.serialize(), before);
    assert_eq!(page.before_image(), before);
}
