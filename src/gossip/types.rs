use crate::causal::{ClockRow, dominates, pointwise_max, pointwise_min};
use crate::storage::memory::Value;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Kind of mutation recorded in the event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Put,
    Delete,
}

/// One locally accepted write, as shipped to replica peers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLogEntry {
    /// Keyshard row right after the write was stamped.
    pub context: ClockRow,
    pub operation: Operation,
    pub key: String,
    /// Empty for deletes.
    #[serde(default)]
    pub value: Option<Value>,
}

impl EventLogEntry {
    pub fn put(key: &str, value: Value, context: ClockRow) -> Self {
        Self {
            context,
            operation: Operation::Put,
            key: key.to_string(),
            value: Some(value),
        }
    }

    pub fn delete(key: &str, context: ClockRow) -> Self {
        Self {
            context,
            operation: Operation::Delete,
            key: key.to_string(),
            value: None,
        }
    }
}

/// Append-only log of local writes in causal order.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    entries: Vec<EventLogEntry>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: EventLogEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[EventLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drops every entry whose context is dominated by `watermark`, i.e. every entry all
    /// replica peers have confirmed. Returns how many entries were dropped.
    pub fn compact(&mut self, watermark: &[u64]) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|entry| !dominates(watermark, &entry.context));
        before - self.entries.len()
    }
}

/// Last row each replica peer confirmed, keyed by the peer's index in the view.
#[derive(Debug, Default)]
pub struct AckTable {
    acks: DashMap<usize, ClockRow>,
}

impl AckTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acks may arrive out of order; the table only moves forward.
    pub fn record(&self, peer_index: usize, row: ClockRow) {
        self.acks
            .entry(peer_index)
            .and_modify(|current| *current = pointwise_max(current, &row))
            .or_insert(row);
    }

    pub fn get(&self, peer_index: usize) -> Option<ClockRow> {
        self.acks.get(&peer_index).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.acks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.acks.is_empty()
    }

    pub fn clear(&self) {
        self.acks.clear();
    }

    /// Pointwise minimum of the acks of `peers`; `None` while any of them has not acked.
    pub fn watermark(&self, peers: &[usize]) -> Option<ClockRow> {
        let mut rows = peers.iter().map(|peer| self.get(*peer));
        let first = rows.next()??;
        rows.try_fold(first, |low, row| row.map(|row| pointwise_min(&low, &row)))
    }
}
