mod common;

use relstore::buffer_pool::BufferPool;
use relstore::database::Database;
use relstore::ids::TransactionId;
use relstore::permission::Permission;

#[test]
fn eviction_keeps_pool_within_capacity() {
    common::setup();
    let heap_file = common::make_int_table("evict_t", 2);
    // A 2-int tuple is 8 bytes; well over 1000 tuples guarantees the file
    // spans more than the 2-page buffer pool capacity used below.
    let rows: Vec<i32> = (0..5000).collect();
    let row_pairs: Vec<[i32; 2]> = rows.chunks(2).map(|c| [c[0], c[1]]).collect();
    let row_refs: Vec<&[i32]> = row_pairs.iter().map(|r| r.as_slice()).collect();
    common::populate(&heap_file, &row_refs);
    assert!(heap_file.num_pages() >= 3, "fixture should span several pages");

    let db = Database::global();
    let pool = BufferPool::new(2);
    for page_no in 0..3 {
        let pid = relstore::ids::PageId::new(heap_file.table_id(), page_no);
        pool.get_page(db, None, pid, Permission::ReadOnly).unwrap();
    }
    // Capacity 2: caching a 3rd page must have evicted one of the first two.
    assert_eq!(pool.capacity(), 2);
}

#[test]
fn abort_reverts_dirty_page_to_before_image_and_disk_is_untouched() {
    common::setup();
    let heap_file = common::make_int_table("abort_t", 2);
    let db = Database::global();
    let initial_len = std::fs::metadata(heap_file.path()).map(|m| m.len()).unwrap_or(0);

    let tid = TransactionId::new();
    heap_file
        .insert_tuple(db, tid, common::int_tuple(&heap_file, &[1, 2]))
        .unwrap();
    db.buffer_pool().transaction_complete(db, tid, false).unwrap();

    let tid2 = TransactionId::new();
    let mut count = 0;
    for result in heap_file.iter(db, tid2) {
        result.unwrap();
        count += 1;
    }
    db.buffer_pool().transaction_complete(db, tid2, true).unwrap();

    assert_eq!(count, 0, "aborted insert must not be visible");
    let final_len = std::fs::metadata(heap_file.path()).map(|m| m.len()).unwrap_or(0);
    assert_eq!(initial_len, final_len, "on-disk file must be unchanged by an aborted txn");
}

#[test]
fn commit_flushes_dirty_pages_to_disk() {
    common::setup();
    let heap_file = common::make_int_table("commit_t", 2);
    let db = Database::global();

    let tid = TransactionId::new();
    heap_file
        .insert_tuple(db, tid, common::int_tuple(&heap_file, &[5, 6]))
        .unwrap();
    db.buffer_pool().transaction_complete(db, tid, true).unwrap();

    let on_disk_len = std::fs::metadata(heap_file.path()).unwrap().len();
    assert!(on_disk_len > 0, "committed page must be flushed to disk");
}
