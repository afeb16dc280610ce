use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use log::debug;

use crate::database::Database;
use crate::error::{DbError, DbResult};
use crate::field::TupleDesc;
use crate::heap_page::{HeapPage, PAGE_SIZE};
use crate::ids::{PageId, TableId, TransactionId};
use crate::permission::Permission;
use crate::tuple::Tuple;

/// A table's on-disk storage: a flat file of fixed-size `HeapPage`s,
/// addressed by page number. Page content is always read and written
/// through the buffer pool; this type only knows how to turn a page
/// number into bytes on disk and back.
pub struct HeapFile {
    path: PathBuf,
    table_id: TableId,
    desc: Arc<TupleDesc>,
    file: Mutex<File>,
    num_pages: Mutex<usize>,
}

impl HeapFile {
    pub fn new(path: &Path, desc: Arc<TupleDesc>) -> DbResult<HeapFile> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path)?;
        let len = file.metadata()?.len() as usize;
        let num_pages = (len + PAGE_SIZE - 1) / PAGE_SIZE;
        Ok(HeapFile {
            path: path.to_path_buf(),
            table_id: TableId::from_path(path),
            desc,
            file: Mutex::new(file),
            num_pages: Mutex::new(num_pages),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    pub fn tuple_desc(&self) -> Arc<TupleDesc> {
        self.desc.clone()
    }

    /// Number of pages the table currently spans, including pages that
    /// exist in the buffer pool but have never been flushed to disk.
    pub fn num_pages(&self) -> usize {
        *self.num_pages.lock().unwrap()
    }

    /// Pages actually present on disk right now; used by the buffer pool
    /// to decide whether a page id names an existing page or one that
    /// should be materialized as freshly allocated.
    pub fn disk_num_pages(&self) -> usize {
        let file = self.file.lock().unwrap();
        let len = file.metadata().map(|m| m.len()).unwrap_or(0) as usize;
        (len + PAGE_SIZE - 1) / PAGE_SIZE
    }

    /// Recomputes the in-memory page count from what is actually on disk.
    /// Called after an abort rolls back pages this table was extended
    /// with but that were never flushed.
    pub fn reset_num_pages(&self) {
        let mut num_pages = self.num_pages.lock().unwrap();
        *num_pages = self.disk_num_pages();
    }

    fn seek_to(file: &mut MutexGuard<File>, page_no: i32) -> DbResult<()> {
        file.seek(SeekFrom::Start((page_no as u64) * (PAGE_SIZE as u64)))?;
        Ok(())
    }

    pub fn read_page(&self, page_no: i32) -> DbResult<HeapPage> {
        let pid = PageId::new(self.table_id, page_no);
        let mut file = self.file.lock().unwrap();
        Self::seek_to(&mut file, page_no)?;
        let mut buf = vec![0u8; PAGE_SIZE];
        file.read_exact(&mut buf)?;
        debug!("read page {:?} from {}", pid, self.path.display());
        let mut page = HeapPage::deserialize(&buf, pid, self.desc.clone())?;
        page.set_before_image();
        Ok(page)
    }

    pub fn write_page(&self, page: &HeapPage) -> DbResult<()> {
        let pid = page.page_id();
        let mut file = self.file.lock().unwrap();
        Self::seek_to(&mut file, pid.page_no)?;
        file.write_all(&page.serialize())?;
        file.flush()?;
        drop(file);

        let mut num_pages = self.num_pages.lock().unwrap();
        if (pid.page_no as usize) + 1 > *num_pages {
            *num_pages = (pid.page_no as usize) + 1;
        }
        debug!("wrote page {:?} to {}", pid, self.path.display());
        Ok(())
    }

    /// Allocates the next page number past the table's current extent,
    /// without touching disk; the buffer pool materializes it as an empty
    /// page on first `get_page` and persists it only when flushed.
    fn next_page_no(&self) -> i32 {
        let mut num_pages = self.num_pages.lock().unwrap();
        let page_no = *num_pages as i32;
        *num_pages += 1;
        page_no
    }

    /// Finds a page with room for `tuple` (scanning pages in order,
    /// acquiring and releasing each under a read lock first, the way a
    /// real scan does to avoid needlessly escalating every page it
    /// passes over to a write lock) and inserts it there. If every
    /// existing page is full, extends the file with a new one.
    pub fn insert_tuple(&self, db: &Database, tid: TransactionId, tuple: Tuple) -> DbResult<PageId> {
        let buffer_pool = db.buffer_pool();
        let existing = self.num_pages();
        for page_no in 0..existing {
            let pid = PageId::new(self.table_id, page_no as i32);
            let page_arc = buffer_pool.get_page(db, Some(tid), pid, Permission::ReadOnly)?;
            let has_room = page_arc.lock().unwrap().num_empty_slots() > 0;
            if !has_room {
                buffer_pool.release_page(tid, pid)?;
                continue;
            }
            let page_arc = buffer_pool.get_page(db, Some(tid), pid, Permission::ReadWrite)?;
            let mut page = page_arc.lock().unwrap();
            page.insert_tuple(tuple)?;
            page.mark_dirty(true, tid);
            drop(page);
            buffer_pool.mark_dirty(pid, tid)?;
            return Ok(pid);
        }

        let pid = PageId::new(self.table_id, self.next_page_no());
        let page_arc = buffer_pool.get_page(db, Some(tid), pid, Permission::ReadWrite)?;
        let mut page = page_arc.lock().unwrap();
        page.insert_tuple(tuple)?;
        page.mark_dirty(true, tid);
        drop(page);
        buffer_pool.mark_dirty(pid, tid)?;
        Ok(pid)
    }

    pub fn delete_tuple(&self, db: &Database, tid: TransactionId, tuple: &Tuple) -> DbResult<()> {
        let rid = tuple
            .record_id()
            .ok_or_else(|| DbError::illegal_argument("tuple has no record id to delete by"))?;
        let buffer_pool = db.buffer_pool();
        let page_arc = buffer_pool.get_page(db, Some(tid), rid.page_id, Permission::ReadWrite)?;
        let mut page = page_arc.lock().unwrap();
        page.delete_tuple(tuple)?;
        page.mark_dirty(true, tid);
        drop(page);
        buffer_pool.mark_dirty(rid.page_id, tid)?;
        Ok(())
    }

    /// A lazy, restartable iterator over every tuple in the file, reading
    /// pages through the buffer pool one at a time. Only borrows `self`
    /// for the duration of this call (`table_id` is `Copy`); the returned
    /// iterator re-looks up the heap file through the catalog on each
    /// page fetch, so it outlives any particular `Arc<HeapFile>` clone.
    pub fn iter<'a>(&self, db: &'a Database, tid: TransactionId) -> HeapFileIter<'a> {
        HeapFileIter {
            db,
            tid,
            table_id: self.table_id,
            page_no: 0,
            buffer: Vec::new().into_iter(),
        }
    }
}

pub struct HeapFileIter<'a> {
    db: &'a Database,
    tid: TransactionId,
    table_id: TableId,
    page_no: i32,
    buffer: std::vec::IntoIter<Tuple>,
}

impl<'a> HeapFileIter<'a> {
    pub fn rewind(&mut self) {
        self.page_no = 0;
        self.buffer = Vec::new().into_iter();
    }

    fn load_next_page(&mut self) -> DbResult<bool> {
        let heap_file = self.db.catalog().heap_file(self.table_id)?;
        if self.page_no as usize >= heap_file.num_pages() {
            return Ok(false);
        }
        let pid = PageId::new(self.table_id, self.page_no);
        let page_arc =
            self.db
                .buffer_pool()
                .get_page(self.db, Some(self.tid), pid, Permission::ReadOnly)?;
        let tuples: Vec<Tuple> = page_arc.lock().unwrap().iter().cloned().collect();
        self.page_no += 1;
        self.buffer = tuples.into_iter();
        Ok(true)
    }
}

impl<'a> Iterator for HeapFileIter<'a> {
    type Item = DbResult<Tuple>;

    fn next(&mut self) -> Option<DbResult<Tuple>> {
        loop {
            if let Some(tuple) = self.buffer.next() {
                return Some(Ok(tuple));
            }
            match self.load_next_page() {
                Ok(true) => continue,
                Ok(false) => return None,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
