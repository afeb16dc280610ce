use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Once;

use relstore::database::Database;
use relstore::field::{Field, FieldType, TupleDesc};
use relstore::heap_file::HeapFile;
use relstore::ids::TransactionId;
use relstore::tuple::Tuple;

static INIT: Once = Once::new();
static NEXT_FILE: AtomicU64 = AtomicU64::new(0);

/// Initializes logging once per process and resets the global database to
/// an empty state, the way a fresh test run should start.
pub fn setup() {
    INIT.call_once(relstore::init_log);
    Database::global().reset();
}

/// Allocates a scratch file under the system temp dir that no other test
/// in this run will collide with.
fn scratch_path(prefix: &str) -> PathBuf {
    let n = NEXT_FILE.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("relstore_test_{}_{}.dat", prefix, n))
}

/// Registers a fresh, empty table of `num_int_fields` int columns under
/// the global database, backed by a scratch file on disk.
pub fn make_int_table(name: &str, num_int_fields: usize) -> std::sync::Arc<HeapFile> {
    let types = vec![FieldType::Int; num_int_fields];
    let desc = std::sync::Arc::new(TupleDesc::from_types(types).unwrap());
    let path = scratch_path(name);
    let db = Database::global();
    db.catalog().add_table(&path, desc, name, None).unwrap()
}

pub fn int_tuple(heap_file: &HeapFile, values: &[i32]) -> Tuple {
    let desc = heap_file.tuple_desc();
    let fields = values.iter().map(|v| Field::Int(*v)).collect();
    Tuple::new(desc, fields).unwrap()
}

/// Inserts `rows` into `heap_file` under a fresh transaction, committing
/// immediately so the rows are durable for the rest of the test.
pub fn populate(heap_file: &HeapFile, rows: &[&[i32]]) {
    let db = Database::global();
    let tid = TransactionId::new();
    for row in rows {
        heap_file
            .insert_tuple(db, tid, int_tuple(heap_file, row))
            .unwrap();
    }
    db.buffer_pool().transaction_complete(db, tid, true).unwrap();
}
