use crate::database::Database;
use crate::error::DbResult;
use crate::ids::TransactionId;

/// A unit of work against the database. Every page read or write an
/// operator performs is tagged with a transaction's id so the buffer
/// pool and lock manager can enforce two-phase locking and NO-STEAL
/// commit/abort semantics on its behalf.
pub struct Transaction {
    id: TransactionId,
    started: bool,
}

impl Transaction {
    pub fn new() -> Transaction {
        Transaction {
            id: TransactionId::new(),
            started: false,
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn start(&mut self) {
        self.started = true;
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Flushes every page this transaction touched to disk and releases
    /// its locks.
    pub fn commit(&self, db: &Database) -> DbResult<()> {
        db.buffer_pool().transaction_complete(db, self.id, true)
    }

    /// Reverts every dirty page this transaction touched to its
    /// before-image and releases its locks.
    pub fn abort(&self, db: &Database) -> DbResult<()> {
        db.buffer_pool().transaction_complete(db, self.id, false)
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}
