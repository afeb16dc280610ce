mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use relstore::ids::{PageId, TableId, TransactionId};
use relstore::lock_manager::LockManager;
use relstore::permission::Permission;

fn page(n: i32) -> PageId {
    PageId::new(TableId(42), n)
}

#[test]
fn two_readers_share_a_page() {
    let lm = LockManager::new(Duration::from_millis(200));
    let (t1, t2) = (TransactionId::new(), TransactionId::new());
    lm.acquire(t1, page(0), Permission::ReadOnly).unwrap();
    lm.acquire(t2, page(0), Permission::ReadOnly).unwrap();
    assert!(lm.holds_lock(t1, page(0)));
    assert!(lm.holds_lock(t2, page(0)));
}

#[test]
fn writer_blocks_until_reader_releases() {
    let lm = std::sync::Arc::new(LockManager::new(Duration::from_secs(5)));
    let (reader, writer) = (TransactionId::new(), TransactionId::new());
    lm.acquire(reader, page(0), Permission::ReadOnly).unwrap();

    let writer_started = std::sync::Arc::new(AtomicBool::new(false));

    crossbeam::scope(|scope| {
        let lm = lm.clone();
        let writer_started = writer_started.clone();
        scope.spawn(move |_| {
            writer_started.store(true, Ordering::SeqCst);
            lm.acquire(writer, page(0), Permission::ReadWrite).unwrap();
        });

        std::thread::sleep(Duration::from_millis(100));
        assert!(writer_started.load(Ordering::SeqCst));
        assert!(!lm.holds_lock(writer, page(0)));

        lm.release(reader, page(0)).unwrap();
    })
    .unwrap();

    assert!(lm.holds_lock(writer, page(0)));
}

#[test]
fn write_lock_request_times_out_into_transaction_aborted() {
    let lm = LockManager::new(Duration::from_millis(100));
    let (holder, waiter) = (TransactionId::new(), TransactionId::new());
    lm.acquire(holder, page(0), Permission::ReadWrite).unwrap();

    let start = std::time::Instant::now();
    let result = lm.acquire(waiter, page(0), Permission::ReadOnly);
    assert!(result.is_err());
    assert!(start.elapsed() >= Duration::from_millis(100));
    assert!(!lm.holds_lock(waiter, page(0)));
}

#[test]
fn release_all_drops_every_page_a_transaction_holds() {
    let lm = LockManager::new(Duration::from_millis(200));
    let tid = TransactionId::new();
    for i in 0..5 {
        lm.acquire(tid, page(i), Permission::ReadWrite).unwrap();
    }
    assert_eq!(lm.pages_held_by(tid).len(), 5);
    lm.release_all(tid);
    assert_eq!(lm.pages_held_by(tid).len(), 0);

    // Pages are free for another transaction immediately afterwards.
    let other = TransactionId::new();
    for i in 0..5 {
        lm.acquire(other, page(i), Permission::ReadWrite).unwrap();
    }
}
