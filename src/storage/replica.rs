use super::memory::{KeyValueStore, Record, Value};
use super::partitioner::{PartitionManager, Route};
use crate::causal::{CausalContext, ClockRow};
use crate::error::{KvError, KvResult, validate_key};
use crate::gossip::types::{EventLog, EventLogEntry};

/// Everything a local write has to touch, kept behind one lock.
///
/// Holding `&mut ReplicaState` is what makes "check ownership, bump the clock, write the
/// record, append to the log" a single step that concurrent writers cannot interleave.
#[derive(Debug)]
pub struct ReplicaState {
    pub partitioner: PartitionManager,
    pub store: KeyValueStore,
    pub context: CausalContext,
    pub event_log: EventLog,
}

impl ReplicaState {
    pub fn new(partitioner: PartitionManager) -> Self {
        let context =
            CausalContext::new(partitioner.num_shards(), partitioner.replication_factor());
        Self {
            partitioner,
            store: KeyValueStore::new(),
            context,
            event_log: EventLog::new(),
        }
    }

    /// Current row of the local keyshard, empty when the node serves none.
    pub fn local_row(&self) -> ClockRow {
        self.partitioner
            .keyshard_id()
            .and_then(|keyshard| self.context.row(keyshard))
            .map(|row| row.to_vec())
            .unwrap_or_default()
    }

    fn local_slot(&self, key: &str) -> KvResult<(usize, usize)> {
        match self.partitioner.route(key) {
            Route::Local { keyshard, replica } => Ok((keyshard, replica)),
            Route::Forward { .. } => Err(KvError::Misdirected),
        }
    }

    /// Writes a key this node serves. Returns `true` when a live value was replaced.
    pub fn local_put(&mut self, key: &str, value: Value) -> KvResult<bool> {
        validate_key(key)?;
        let (keyshard, replica) = self.local_slot(key)?;

        let context = self.context.increment(keyshard, replica);
        let replaced = self.store.put(key, value.clone(), context.clone())?;
        self.event_log
            .append(EventLogEntry::put(key, value, context));
        Ok(replaced)
    }

    pub fn local_get(&self, key: &str) -> KvResult<&Record> {
        self.local_slot(key)?;
        self.store.get(key)
    }

    /// Versioned delete: bumps the clock and leaves a tombstone carrying it.
    pub fn local_delete(&mut self, key: &str) -> KvResult<()> {
        let (keyshard, replica) = self.local_slot(key)?;
        self.store.get(key)?;

        let context = self.context.increment(keyshard, replica);
        self.store.delete(key, context.clone());
        self.event_log.append(EventLogEntry::delete(key, context));
        Ok(())
    }

    /// Swaps in the placement of a new view.
    ///
    /// Clocks do not carry over: the matrix is rebuilt zeroed for the new shape and every
    /// record, served or about to migrate, is restamped with the zero row. Every replica
    /// of a keyshard does the same, so the first write accepted under the new view
    /// dominates whatever each of them kept from the old one. The event log refers to the
    /// previous replica groups and is dropped.
    pub fn install_view(&mut self, partitioner: PartitionManager) {
        let replication_factor = partitioner.replication_factor();
        self.context = CausalContext::new(partitioner.num_shards(), replication_factor);
        self.store.reset_contexts(&vec![0; replication_factor]);
        self.partitioner = partitioner;
        self.event_log.clear();
    }

    /// Live records the current view places elsewhere, with the owner to send them to.
    pub fn misplaced_records(&self) -> Vec<(String, String, Record)> {
        self.store
            .iter()
            .filter(|(key, record)| record.is_live() && !self.partitioner.serves(key))
            .filter_map(|(key, record)| {
                let keyshard = self.partitioner.get_partition(key);
                self.partitioner
                    .owner_address(keyshard)
                    .map(|owner| (key.clone(), owner.to_string(), record.clone()))
            })
            .collect()
    }

    /// Drops tombstones of keys the node no longer serves. Returns how many were dropped.
    pub fn purge_foreign_tombstones(&mut self) -> usize {
        let foreign: Vec<String> = self
            .store
            .iter()
            .filter(|(key, record)| !record.is_live() && !self.partitioner.serves(key))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &foreign {
            self.store.purge(key);
        }
        foreign.len()
    }
}
