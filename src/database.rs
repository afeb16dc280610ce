use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use once_cell::sync::OnceCell;

use crate::buffer_pool::{BufferPool, DEFAULT_NUM_PAGES};
use crate::catalog::Catalog;
use crate::error::DbResult;
use crate::histogram::TableStats;
use crate::ids::{TableId, TransactionId};

static INSTANCE: OnceCell<Database> = OnceCell::new();

/// The process-wide handle tying together the catalog, buffer pool, and
/// (transitively, via the buffer pool) the lock manager. Accessed through
/// `Database::global()`, mirroring the single static instance a real
/// embedded engine exposes to every operator and transaction.
pub struct Database {
    catalog: Catalog,
    buffer_pool: BufferPool,
    table_stats: RwLock<HashMap<TableId, Arc<TableStats>>>,
}

impl Database {
    fn new() -> Database {
        Database {
            catalog: Catalog::new(),
            buffer_pool: BufferPool::new(DEFAULT_NUM_PAGES),
            table_stats: RwLock::new(HashMap::new()),
        }
    }

    pub fn global() -> &'static Database {
        INSTANCE.get_or_init(Database::new)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn buffer_pool(&self) -> &BufferPool {
        &self.buffer_pool
    }

    /// Returns cached statistics for `table_id`, computing and caching
    /// them on first request. Cheap to call repeatedly from a query
    /// planner that needs the same table's cost/selectivity more than
    /// once.
    pub fn table_stats(&self, table_id: TableId, tid: TransactionId) -> DbResult<Arc<TableStats>> {
        if let Some(stats) = self.table_stats.read().unwrap().get(&table_id) {
            return Ok(stats.clone());
        }
        let stats = Arc::new(TableStats::compute(self, table_id, tid)?);
        self.table_stats.write().unwrap().insert(table_id, stats.clone());
        Ok(stats)
    }

    /// Wipes the catalog, buffer pool, and cached table stats back to an
    /// empty state. Tests call this between cases instead of spinning up
    /// a fresh process, since `global()` hands out one instance for the
    /// process lifetime.
    pub fn reset(&self) {
        self.buffer_pool.clear();
        self.catalog.clear();
        self.table_stats.write().unwrap().clear();
    }
}
