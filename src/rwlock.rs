use std::collections::HashSet;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::error::{DbError, DbResult};
use crate::ids::TransactionId;

struct LockState {
    readers: HashSet<TransactionId>,
    writer: Option<TransactionId>,
    write_requests: HashSet<TransactionId>,
}

/// A per-page multi-reader/single-writer lock. Deadlocks are never
/// detected explicitly; any transaction that waits longer than `timeout`
/// for this lock is told to abort (see `lock_read`/`lock_write`).
///
/// Writers are given priority over new readers (`can_grant_read_access`
/// refuses a non-reentrant read while a write is pending) to avoid writer
/// starvation under a steady stream of readers.
pub struct PageLock {
    state: Mutex<LockState>,
    cv: Condvar,
}

impl PageLock {
    pub fn new() -> PageLock {
        PageLock {
            state: Mutex::new(LockState {
                readers: HashSet::new(),
                writer: None,
                write_requests: HashSet::new(),
            }),
            cv: Condvar::new(),
        }
    }

    fn can_grant_read_access(state: &LockState, tid: TransactionId) -> bool {
        if state.writer == Some(tid) {
            return true;
        }
        if state.writer.is_some() {
            return false;
        }
        state.readers.contains(&tid) || state.write_requests.is_empty()
    }

    fn can_grant_write_access(state: &LockState, tid: TransactionId) -> bool {
        // Upgrade: the only reader is the requester.
        if state.readers.len() == 1 && state.readers.contains(&tid) {
            return true;
        }
        if state.readers.is_empty() {
            return state.writer.is_none() || state.writer == Some(tid);
        }
        false
    }

    pub fn lock_read(&self, tid: TransactionId, timeout: Duration) -> DbResult<()> {
        let deadline = Instant::now() + timeout;
        let mut guard = self.state.lock().unwrap();
        while !Self::can_grant_read_access(&guard, tid) {
            let now = Instant::now();
            if now >= deadline {
                warn!("{} timed out waiting for a read lock", tid);
                return Err(DbError::aborted(format!(
                    "{} timed out waiting for a read lock",
                    tid
                )));
            }
            let (next_guard, _) = self.cv.wait_timeout(guard, deadline - now).unwrap();
            guard = next_guard;
        }
        guard.readers.insert(tid);
        debug!("{} acquired read lock", tid);
        Ok(())
    }

    pub fn unlock_read(&self, tid: TransactionId) -> DbResult<()> {
        let mut guard = self.state.lock().unwrap();
        if !guard.readers.remove(&tid) {
            return Err(DbError::illegal_monitor_state(format!(
                "{} released a read lock it did not hold",
                tid
            )));
        }
        self.cv.notify_all();
        Ok(())
    }

    pub fn lock_write(&self, tid: TransactionId, timeout: Duration) -> DbResult<()> {
        let deadline = Instant::now() + timeout;
        let mut guard = self.state.lock().unwrap();
        guard.write_requests.insert(tid);
        while !Self::can_grant_write_access(&guard, tid) {
            let now = Instant::now();
            if now >= deadline {
                guard.write_requests.remove(&tid);
                warn!("{} timed out waiting for a write lock", tid);
                return Err(DbError::aborted(format!(
                    "{} timed out waiting for a write lock",
                    tid
                )));
            }
            let (next_guard, _) = self.cv.wait_timeout(guard, deadline - now).unwrap();
            guard = next_guard;
        }
        guard.write_requests.remove(&tid);
        guard.writer = Some(tid);
        debug!("{} acquired write lock", tid);
        Ok(())
    }

    pub fn unlock_write(&self, tid: TransactionId) -> DbResult<()> {
        let mut guard = self.state.lock().unwrap();
        if guard.writer != Some(tid) {
            return Err(DbError::illegal_monitor_state(format!(
                "{} released a write lock it did not hold",
                tid
            )));
        }
        guard.writer = None;
        self.cv.notify_all();
        Ok(())
    }

    /// Removes `tid` from the write-request set without granting or
    /// releasing anything. Used when unwinding an aborted transaction that
    /// never held this lock but was waiting on it.
    pub fn cancel_write_request(&self, tid: TransactionId) {
        let mut guard = self.state.lock().unwrap();
        guard.write_requests.remove(&tid);
    }

    /// Releases whatever `tid` holds on this lock (read, write, or
    /// neither); used during bulk release at transaction end where the
    /// caller does not track which mode was granted.
    pub fn release_any(&self, tid: TransactionId) {
        let mut guard = self.state.lock().unwrap();
        let mut notify = false;
        if guard.writer == Some(tid) {
            guard.writer = None;
            notify = true;
        }
        if guard.readers.remove(&tid) {
            notify = true;
        }
        guard.write_requests.remove(&tid);
        if notify {
            self.cv.notify_all();
        }
    }

    pub fn is_held_by(&self, tid: TransactionId) -> bool {
        let guard = self.state.lock().unwrap();
        guard.writer == Some(tid) || guard.readers.contains(&tid)
    }
}

impl Default for PageLock {
    fn default() -> Self {
        Self::new()
    }
}
