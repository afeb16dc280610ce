use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, info, warn};
use rand::seq::IteratorRandom;

use crate::database::Database;
use crate::error::{DbError, DbResult};
use crate::heap_page::HeapPage;
use crate::ids::{PageId, TransactionId};
use crate::lock_manager::{LockManager, DEFAULT_LOCK_TIMEOUT};
use crate::permission::Permission;

pub const DEFAULT_NUM_PAGES: usize = 64;

struct Frame {
    pid: PageId,
    page: Arc<Mutex<HeapPage>>,
}

struct Inner {
    lookup: HashMap<PageId, usize>,
    frames: Vec<Option<Frame>>,
    free_list: VecDeque<usize>,
    /// Indices of occupied frames whose page is not dirty; the only
    /// candidates `evict_one` is allowed to pick from (NO-STEAL).
    clean: HashSet<usize>,
}

/// A pinning page cache with NO-STEAL eviction: a dirty frame is never
/// written back or evicted until its owning transaction commits or
/// aborts. Frame bookkeeping (`lookup`/`free_list`/`clean`) is guarded by
/// a single mutex; the per-page lock (taken beforehand, never while
/// holding that mutex) is what actually serializes concurrent readers and
/// writers of a page's content.
pub struct BufferPool {
    capacity: usize,
    inner: Mutex<Inner>,
    lock_manager: LockManager,
}

impl BufferPool {
    pub fn new(capacity: usize) -> BufferPool {
        BufferPool::with_timeout(capacity, DEFAULT_LOCK_TIMEOUT)
    }

    pub fn with_timeout(capacity: usize, lock_timeout: Duration) -> BufferPool {
        let mut frames = Vec::with_capacity(capacity);
        let mut free_list = VecDeque::with_capacity(capacity);
        for i in 0..capacity {
            frames.push(None);
            free_list.push_back(i);
        }
        BufferPool {
            capacity,
            inner: Mutex::new(Inner {
                lookup: HashMap::new(),
                frames,
                free_list,
                clean: HashSet::new(),
            }),
            lock_manager: LockManager::new(lock_timeout),
        }
    }

    pub fn lock_manager(&self) -> &LockManager {
        &self.lock_manager
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Acquires the appropriate lock (if `tid` is given), then returns the
    /// shared, pinned frame for `pid`, loading it from disk (or
    /// allocating a zeroed page, if `pid` is beyond the file's on-disk
    /// range but within its in-memory `num_pages`) on a cache miss.
    pub fn get_page(
        &self,
        db: &Database,
        tid: Option<TransactionId>,
        pid: PageId,
        perm: Permission,
    ) -> DbResult<Arc<Mutex<HeapPage>>> {
        if let Some(tid) = tid {
            self.lock_manager.acquire(tid, pid, perm)?;
        }

        let mut inner = self.inner.lock().unwrap();
        if let Some(&idx) = inner.lookup.get(&pid) {
            let frame = inner.frames[idx].as_ref().unwrap();
            return Ok(frame.page.clone());
        }

        if inner.free_list.is_empty() {
            self.evict_one(db, &mut inner)?;
        }
        let idx = inner.free_list.pop_front().ok_or_else(|| {
            DbError::storage("buffer pool has no free frames after eviction")
        })?;

        let heap_file = db.catalog().heap_file(pid.table_id)?;
        let page = if (pid.page_no as usize) < heap_file.disk_num_pages() {
            heap_file.read_page(pid.page_no)?
        } else {
            HeapPage::new_empty(pid, heap_file.tuple_desc())
        };

        let page = Arc::new(Mutex::new(page));
        inner.frames[idx] = Some(Frame { pid, page: page.clone() });
        inner.lookup.insert(pid, idx);
        inner.clean.insert(idx);
        debug!("cached page {:?} in frame {}", pid, idx);
        Ok(page)
    }

    /// Releases whichever lock `tid` holds on `pid`. Used for early
    /// release of read-only probes, e.g. the scan `HeapFile::insert_tuple`
    /// performs while looking for a page with room.
    pub fn release_page(&self, tid: TransactionId, pid: PageId) -> DbResult<()> {
        self.lock_manager.release(tid, pid)
    }

    /// Marks a cached page dirty, removing it from the eviction pool
    /// (NO-STEAL: dirty frames are never evicted).
    pub fn mark_dirty(&self, pid: PageId, tid: TransactionId) -> DbResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let idx = *inner
            .lookup
            .get(&pid)
            .ok_or_else(|| DbError::storage(format!("page {:?} is not cached", pid)))?;
        inner.frames[idx]
            .as_ref()
            .unwrap()
            .page
            .lock()
            .unwrap()
            .mark_dirty(true, tid);
        inner.clean.remove(&idx);
        Ok(())
    }

    /// Picks a uniformly random clean frame and evicts it. Fails with a
    /// storage error if every occupied frame is dirty.
    fn evict_one(&self, db: &Database, inner: &mut Inner) -> DbResult<()> {
        let idx = inner
            .clean
            .iter()
            .copied()
            .choose(&mut rand::thread_rng())
            .ok_or_else(|| {
                warn!("eviction failed: every buffered page is dirty");
                DbError::storage("all buffer pool pages are dirty")
            })?;
        let pid = inner.frames[idx].as_ref().unwrap().pid;
        self.flush_locked(db, inner, pid)?;
        self.discard_locked(inner, pid);
        Ok(())
    }

    fn flush_locked(&self, db: &Database, inner: &mut Inner, pid: PageId) -> DbResult<()> {
        let idx = match inner.lookup.get(&pid) {
            Some(&idx) => idx,
            None => return Ok(()),
        };
        let frame = inner.frames[idx].as_ref().unwrap();
        let mut page = frame.page.lock().unwrap();
        if let Some(tid) = page.is_dirty() {
            let heap_file = db.catalog().heap_file(pid.table_id)?;
            heap_file.write_page(&page)?;
            page.mark_dirty(false, tid);
            info!("flushed dirty page {:?}", pid);
        }
        inner.clean.insert(idx);
        Ok(())
    }

    pub fn flush_page(&self, db: &Database, pid: PageId) -> DbResult<()> {
        let mut inner = self.inner.lock().unwrap();
        self.flush_locked(db, &mut inner, pid)
    }

    pub fn flush_all_pages(&self, db: &Database) -> DbResult<()> {
        let pids: Vec<PageId> = {
            let inner = self.inner.lock().unwrap();
            inner.lookup.keys().copied().collect()
        };
        for pid in pids {
            self.flush_page(db, pid)?;
        }
        Ok(())
    }

    /// Flushes every page `tid` holds a lock on (committing txn: FORCE).
    pub fn flush_pages(&self, db: &Database, tid: TransactionId) -> DbResult<()> {
        for pid in self.lock_manager.pages_held_by(tid) {
            self.flush_page(db, pid)?;
        }
        Ok(())
    }

    fn discard_locked(&self, inner: &mut Inner, pid: PageId) {
        if let Some(idx) = inner.lookup.remove(&pid) {
            inner.frames[idx] = None;
            inner.clean.remove(&idx);
            inner.free_list.push_back(idx);
        }
    }

    pub fn discard_page(&self, db: &Database, pid: PageId) -> DbResult<()> {
        let mut inner = self.inner.lock().unwrap();
        self.flush_locked(db, &mut inner, pid)?;
        self.discard_locked(&mut inner, pid);
        Ok(())
    }

    /// Ends `tid`'s involvement with the buffer pool: on commit, flushes
    /// every page it holds a lock on (FORCE); on abort, reverts every
    /// dirty page it touched to its before-image and rolls back any heap
    /// file it extended. Either way, releases all of `tid`'s locks.
    pub fn transaction_complete(&self, db: &Database, tid: TransactionId, commit: bool) -> DbResult<()> {
        let pages = self.lock_manager.pages_held_by(tid);

        if commit {
            for pid in &pages {
                self.flush_page(db, *pid)?;
            }
            let inner = self.inner.lock().unwrap();
            for pid in &pages {
                if let Some(&idx) = inner.lookup.get(pid) {
                    let frame = inner.frames[idx].as_ref().unwrap();
                    frame.page.lock().unwrap().set_before_image();
                }
            }
            drop(inner);
            info!("{} committed, flushed {} page(s)", tid, pages.len());
        } else {
            let mut touched_tables = HashSet::new();
            let mut inner = self.inner.lock().unwrap();
            for pid in &pages {
                if let Some(&idx) = inner.lookup.get(pid) {
                    let frame = inner.frames[idx].as_ref().unwrap();
                    let mut page = frame.page.lock().unwrap();
                    if page.is_dirty().is_some() {
                        let before = page.before_image();
                        let desc = page.tuple_desc();
                        *page = HeapPage::deserialize(&before, *pid, desc)?;
                        touched_tables.insert(pid.table_id);
                        inner.clean.insert(idx);
                    }
                }
            }
            drop(inner);
            for table_id in touched_tables {
                db.catalog().heap_file(table_id)?.reset_num_pages();
            }
            info!("{} aborted, reverted {} page(s)", tid, pages.len());
        }

        self.lock_manager.release_all(tid);
        Ok(())
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        let cap = self.capacity;
        inner.lookup.clear();
        inner.frames = (0..cap).map(|_| None).collect();
        inner.free_list = (0..cap).collect();
        inner.clean.clear();
        self.lock_manager.clear();
    }
}
