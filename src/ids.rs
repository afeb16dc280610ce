use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies a table/heap file. Stable for the lifetime of the process:
/// derived from a hash of the file's absolute path, the same way a real
/// catalog would key a table by the file it is backed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableId(pub i32);

impl TableId {
    pub fn from_path(path: &Path) -> TableId {
        let mut hasher = DefaultHasher::new();
        path.hash(&mut hasher);
        TableId(hasher.finish() as i32)
    }
}

/// Names a single page within a table's heap file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageId {
    pub table_id: TableId,
    pub page_no: i32,
}

impl PageId {
    pub fn new(table_id: TableId, page_no: i32) -> Self {
        Self { table_id, page_no }
    }
}

/// Names a tuple slot within a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId {
    pub page_id: PageId,
    pub slot: i32,
}

impl RecordId {
    pub fn new(page_id: PageId, slot: i32) -> Self {
        Self { page_id, slot }
    }
}

static NEXT_TRANSACTION_ID: AtomicU64 = AtomicU64::new(1);

/// A monotonically allocated transaction identifier. Cheap to copy and
/// pass by value; the real bookkeeping lives in the lock manager and
/// buffer pool, keyed by this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionId(u64);

impl TransactionId {
    pub fn new() -> Self {
        TransactionId(NEXT_TRANSACTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "tx_{}", self.0)
    }
}
