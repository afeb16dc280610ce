use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::DbResult;
use crate::ids::{PageId, TransactionId};
use crate::permission::{LockKind, Permission};
use crate::rwlock::PageLock;

/// Default time a transaction will wait for a contended page lock before
/// being told to abort. Deliberately short: this engine resolves
/// deadlocks by timeout, not by waits-for-graph cycle detection.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(3000);

/// Coordinates per-page locks and tracks which pages each transaction
/// currently holds a lock on. Each public entry point locks the
/// per-transaction bookkeeping mutex for the duration of the call, so a
/// single transaction driven by multiple worker threads serializes its own
/// lock requests — concurrent requests from *different* transactions still
/// proceed independently.
pub struct LockManager {
    timeout: Duration,
    locks: Mutex<HashMap<PageId, Arc<PageLock>>>,
    held: Mutex<HashMap<TransactionId, HashSet<PageId>>>,
    tx_latches: Mutex<HashMap<TransactionId, Arc<Mutex<()>>>>,
}

impl LockManager {
    pub fn new(timeout: Duration) -> LockManager {
        LockManager {
            timeout,
            locks: Mutex::new(HashMap::new()),
            held: Mutex::new(HashMap::new()),
            tx_latches: Mutex::new(HashMap::new()),
        }
    }

    fn lock_for(&self, pid: PageId) -> Arc<PageLock> {
        let mut locks = self.locks.lock().unwrap();
        locks
            .entry(pid)
            .or_insert_with(|| Arc::new(PageLock::new()))
            .clone()
    }

    fn tx_latch(&self, tid: TransactionId) -> Arc<Mutex<()>> {
        let mut latches = self.tx_latches.lock().unwrap();
        latches.entry(tid).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    fn mark_held(&self, tid: TransactionId, pid: PageId) {
        let mut held = self.held.lock().unwrap();
        held.entry(tid).or_insert_with(HashSet::new).insert(pid);
    }

    /// Blocks until `tid` is granted `perm` on `pid`, or fails with
    /// `TransactionAborted` after `timeout`.
    pub fn acquire(&self, tid: TransactionId, pid: PageId, perm: Permission) -> DbResult<()> {
        let latch = self.tx_latch(tid);
        let _guard = latch.lock().unwrap();

        let lock = self.lock_for(pid);
        match perm.lock_kind() {
            LockKind::Shared => lock.lock_read(tid, self.timeout)?,
            LockKind::Exclusive => lock.lock_write(tid, self.timeout)?,
        }
        self.mark_held(tid, pid);
        Ok(())
    }

    /// Releases whichever lock `tid` holds on `pid` (read or write).
    pub fn release(&self, tid: TransactionId, pid: PageId) -> DbResult<()> {
        let latch = self.tx_latch(tid);
        let _guard = latch.lock().unwrap();

        if let Some(lock) = self.locks.lock().unwrap().get(&pid).cloned() {
            lock.release_any(tid);
        }
        if let Some(pages) = self.held.lock().unwrap().get_mut(&tid) {
            pages.remove(&pid);
        }
        Ok(())
    }

    /// Releases every lock `tid` holds or is waiting on. Used at
    /// transaction commit/abort.
    pub fn release_all(&self, tid: TransactionId) {
        let latch = self.tx_latch(tid);
        let _guard = latch.lock().unwrap();

        let pages = self
            .held
            .lock()
            .unwrap()
            .remove(&tid)
            .unwrap_or_default();
        let locks = self.locks.lock().unwrap();
        for pid in pages {
            if let Some(lock) = locks.get(&pid) {
                lock.release_any(tid);
            }
        }
        // Also unwind any in-flight write request on a page tid never
        // ended up holding (e.g. it was still waiting when aborted).
        for lock in locks.values() {
            lock.cancel_write_request(tid);
        }
    }

    pub fn holds_lock(&self, tid: TransactionId, pid: PageId) -> bool {
        match self.locks.lock().unwrap().get(&pid) {
            Some(lock) => lock.is_held_by(tid),
            None => false,
        }
    }

    /// Pages `tid` currently holds a granted lock on (read or write).
    pub fn pages_held_by(&self, tid: TransactionId) -> HashSet<PageId> {
        self.held.lock().unwrap().get(&tid).cloned().unwrap_or_default()
    }

    pub fn clear(&self) {
        self.locks.lock().unwrap().clear();
        self.held.lock().unwrap().clear();
        self.tx_latches.lock().unwrap().clear();
    }
}
