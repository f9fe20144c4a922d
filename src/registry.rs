use crate::server_data::ServerData;
use lazy_static::lazy_static;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

lazy_static! {
    static ref GLOBAL_REGISTRY: TableRegistry = TableRegistry::new();
}

/// Process-wide registry used by the web server
pub fn global() -> &'static TableRegistry {
    &GLOBAL_REGISTRY
}

#[derive(Debug)]
struct Entry {
    table: Arc<ServerData>,
    owner: Option<String>,
}

/// Maps table ids to their server-side state
///
/// Lookups hand out an `Arc`, so a table stays usable by requests already
/// in flight even after it has been removed.
#[derive(Debug, Default)]
pub struct TableRegistry {
    tables: RwLock<HashMap<String, Entry>>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table under `id`, returning the table it replaces
    pub fn register(&self, id: impl Into<String>, table: impl Into<Arc<ServerData>>) -> Option<Arc<ServerData>> {
        let id = id.into();
        log::debug!("Registering table {}", id);
        self.tables
            .write()
            .insert(
                id,
                Entry {
                    table: table.into(),
                    owner: None,
                },
            )
            .map(|entry| entry.table)
    }

    /// Register a table under a fresh random id
    ///
    /// # Returns
    /// * `String` - The generated id
    pub fn register_new(&self, table: impl Into<Arc<ServerData>>) -> String {
        let id = Uuid::new_v4().to_string();
        self.register(id.clone(), table);
        id
    }

    /// Register a table on behalf of `owner` (a browser session, say) so
    /// that all of its tables can be dropped together
    pub fn register_owned(&self, owner: &str, table: impl Into<Arc<ServerData>>) -> String {
        let id = Uuid::new_v4().to_string();
        log::debug!("Registering table {} for {}", id, owner);
        self.tables.write().insert(
            id.clone(),
            Entry {
                table: table.into(),
                owner: Some(owner.to_string()),
            },
        );
        id
    }

    pub fn get(&self, id: &str) -> Option<Arc<ServerData>> {
        self.tables.read().get(id).map(|entry| entry.table.clone())
    }

    pub fn remove(&self, id: &str) -> Option<Arc<ServerData>> {
        self.tables.write().remove(id).map(|entry| entry.table)
    }

    /// Drop every table registered for `owner`
    ///
    /// # Returns
    /// * `usize` - Number of tables removed
    pub fn remove_owner(&self, owner: &str) -> usize {
        let mut tables = self.tables.write();
        let before = tables.len();
        tables.retain(|_, entry| entry.owner.as_deref() != Some(owner));
        let removed = before - tables.len();
        if removed > 0 {
            log::debug!("Removed {} tables of {}", removed, owner);
        }
        removed
    }

    /// Registered ids in sorted order
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.tables.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.tables.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.read().is_empty()
    }
}
