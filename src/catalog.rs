use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use log::info;

use crate::error::{DbError, DbResult};
use crate::heap_file::HeapFile;
use crate::ids::TableId;

struct TableEntry {
    name: String,
    heap_file: Arc<HeapFile>,
    primary_key: Option<String>,
}

/// The registry of tables known to the database, keyed by both
/// `TableId` (the id stamped into every page/tuple) and table name (the
/// handle operators and tests look tables up by).
pub struct Catalog {
    inner: RwLock<CatalogInner>,
}

struct CatalogInner {
    tables: HashMap<TableId, TableEntry>,
    by_name: HashMap<String, TableId>,
}

impl Catalog {
    pub fn new() -> Catalog {
        Catalog {
            inner: RwLock::new(CatalogInner {
                tables: HashMap::new(),
                by_name: HashMap::new(),
            }),
        }
    }

    /// Opens the heap file at `path` and registers it as `name`.
    pub fn add_table(
        &self,
        path: &Path,
        desc: Arc<crate::field::TupleDesc>,
        name: &str,
        primary_key: Option<&str>,
    ) -> DbResult<Arc<HeapFile>> {
        let heap_file = Arc::new(HeapFile::new(path, desc)?);
        self.add_heap_file(heap_file.clone(), name, primary_key);
        Ok(heap_file)
    }

    /// Registers an already-opened heap file as `name`.
    pub fn add_heap_file(&self, heap_file: Arc<HeapFile>, name: &str, primary_key: Option<&str>) {
        let table_id = heap_file.table_id();
        let mut inner = self.inner.write().unwrap();
        inner.by_name.insert(name.to_string(), table_id);
        inner.tables.insert(
            table_id,
            TableEntry {
                name: name.to_string(),
                heap_file,
                primary_key: primary_key.map(|s| s.to_string()),
            },
        );
        info!("registered table '{}' as {:?}", name, table_id);
    }

    pub fn heap_file(&self, table_id: TableId) -> DbResult<Arc<HeapFile>> {
        self.inner
            .read()
            .unwrap()
            .tables
            .get(&table_id)
            .map(|entry| entry.heap_file.clone())
            .ok_or_else(|| DbError::no_such_element(format!("no table with id {:?}", table_id)))
    }

    pub fn table_id(&self, name: &str) -> DbResult<TableId> {
        self.inner
            .read()
            .unwrap()
            .by_name
            .get(name)
            .copied()
            .ok_or_else(|| DbError::no_such_element(format!("no table named '{}'", name)))
    }

    pub fn table_name(&self, table_id: TableId) -> DbResult<String> {
        self.inner
            .read()
            .unwrap()
            .tables
            .get(&table_id)
            .map(|entry| entry.name.clone())
            .ok_or_else(|| DbError::no_such_element(format!("no table with id {:?}", table_id)))
    }

    pub fn primary_key(&self, table_id: TableId) -> DbResult<Option<String>> {
        self.inner
            .read()
            .unwrap()
            .tables
            .get(&table_id)
            .map(|entry| entry.primary_key.clone())
            .ok_or_else(|| DbError::no_such_element(format!("no table with id {:?}", table_id)))
    }

    pub fn table_ids(&self) -> Vec<TableId> {
        self.inner.read().unwrap().tables.keys().copied().collect()
    }

    pub fn clear(&self) {
        let mut inner = self.inner.write().unwrap();
        inner.tables.clear();
        inner.by_name.clear();
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}
