//! Script Table Store.
//!
//! One immutable [`ScriptMapMap`] per table, held behind a lock as an `Arc`. Readers clone the
//! `Arc` (or the per-key sequence) and never hold the lock while running scripts; a reload
//! builds the replacement map completely before swapping it in.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use log::info;

use dbscript_data::{ScriptInfo, ScriptTable};

/// Commands of one trigger key, in load order.
pub type ScriptSequence = Arc<[ScriptInfo]>;

/// Trigger key → commands for one table.
pub type ScriptMapMap = BTreeMap<u32, ScriptSequence>;

/// All nine script tables.
#[derive(Debug, Default)]
pub struct ScriptStore {
    tables: [RwLock<Arc<ScriptMapMap>>; ScriptTable::ALL.len()],
}

impl ScriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands for `key`, or an empty sequence if the key is unknown.
    pub fn lookup(&self, table: ScriptTable, key: u32) -> ScriptSequence {
        self.snapshot(table)
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Arc::from(Vec::new()))
    }

    /// Current contents of a table. Later swaps do not affect the returned map.
    pub fn snapshot(&self, table: ScriptTable) -> Arc<ScriptMapMap> {
        let guard = self.tables[table.index()]
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Swap in a freshly built table.
    pub fn replace(&self, table: ScriptTable, scripts: ScriptMapMap) {
        let keys = scripts.len();
        let mut guard = self.tables[table.index()]
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = Arc::new(scripts);
        info!("{keys} script keys now active in '{table}'");
    }

    pub fn contains(&self, table: ScriptTable, key: u32) -> bool {
        self.snapshot(table).contains_key(&key)
    }

    /// Number of keys in a table.
    pub fn key_count(&self, table: ScriptTable) -> usize {
        self.snapshot(table).len()
    }

    /// Number of commands in a table.
    pub fn command_count(&self, table: ScriptTable) -> usize {
        self.snapshot(table).values().map(|seq| seq.len()).sum()
    }
}
