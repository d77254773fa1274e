use crate::causal::ClockRow;
use crate::error::{KvError, KvResult, validate_key};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Client values are opaque JSON and are stored and relayed untouched.
pub type Value = serde_json::Value;

/// A stored key.
///
/// `value == None` marks a tombstone left by a versioned delete. Tombstones keep their
/// context so that older writes arriving later by gossip are recognised as stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub value: Option<Value>,
    pub context: ClockRow,
}

impl Record {
    pub fn live(value: Value, context: ClockRow) -> Self {
        Self {
            value: Some(value),
            context,
        }
    }

    pub fn tombstone(context: ClockRow) -> Self {
        Self {
            value: None,
            context,
        }
    }

    pub fn is_live(&self) -> bool {
        self.value.is_some()
    }
}

/// The in-memory record table of one node.
///
/// Not synchronised on its own: it lives inside `ReplicaState`, whose lock makes a clock
/// increment and the write it stamps a single step.
///
/// Tombstones of served keys are kept for as long as the node serves the key. A replica
/// peer may still hold an older PUT for it in its event log, and only the tombstone
/// tells the merge that such a PUT is stale. They are dropped when the key moves to
/// another keyshard (see `ReplicaState::purge_foreign_tombstones`), so the table grows
/// with the number of distinct keys ever deleted under one view.
#[derive(Debug, Default, Clone)]
pub struct KeyValueStore {
    records: HashMap<String, Record>,
}

impl KeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates or overwrites `key`. Returns `true` when a live value was replaced.
    pub fn put(&mut self, key: &str, value: Value, context: ClockRow) -> KvResult<bool> {
        validate_key(key)?;
        let previous = self
            .records
            .insert(key.to_string(), Record::live(value, context));
        Ok(previous.is_some_and(|record| record.is_live()))
    }

    pub fn get(&self, key: &str) -> KvResult<&Record> {
        self.records
            .get(key)
            .filter(|record| record.is_live())
            .ok_or(KvError::NotFound)
    }

    /// Replaces a live record with a tombstone stamped `context`.
    /// Returns whether a live record existed.
    pub fn delete(&mut self, key: &str, context: ClockRow) -> bool {
        match self.records.get_mut(key) {
            Some(record) if record.is_live() => {
                *record = Record::tombstone(context);
                true
            }
            _ => false,
        }
    }

    /// Number of live records.
    pub fn count(&self) -> usize {
        self.records.values().filter(|record| record.is_live()).count()
    }

    /// Raw access including tombstones.
    pub fn record(&self, key: &str) -> Option<&Record> {
        self.records.get(key)
    }

    /// Stores a record received from a peer as-is.
    pub fn install(&mut self, key: &str, record: Record) {
        self.records.insert(key.to_string(), record);
    }

    /// Drops a record, tombstone or not, without leaving a trace.
    pub fn purge(&mut self, key: &str) -> Option<Record> {
        self.records.remove(key)
    }

    /// Restamps every record, tombstones included, with `context`.
    pub fn reset_contexts(&mut self, context: &[u64]) {
        for record in self.records.values_mut() {
            record.context = context.to_vec();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Record)> {
        self.records.iter()
    }
}
