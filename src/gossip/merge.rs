use super::types::{EventLogEntry, Operation};
use crate::causal::{ClockRow, ConflictResolver, supersedes};
use crate::storage::memory::Record;
use crate::storage::replica::ReplicaState;

/// Outcome of merging one gossip batch.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MergeReport {
    pub applied: usize,
    pub discarded: usize,
    /// Context of the last entry of the batch, applied or not, echoed back to the sender
    /// as its ack.
    pub last_context: Option<ClockRow>,
}

/// Merges a peer's event log into the local store, entry by entry in log order.
///
/// An entry replaces the local record when its context dominates the record's, or when
/// the two are concurrent and `resolver` picks the entry. Stale entries are dropped, and so
/// are entries for keys outside the local keyshard. The context of every entry for a
/// served key is folded into the local keyshard row so later local writes dominate what
/// this node has seen.
pub fn apply_log(
    state: &mut ReplicaState,
    entries: &[EventLogEntry],
    resolver: &dyn ConflictResolver,
) -> MergeReport {
    let mut report = MergeReport::default();
    let keyshard = state.partitioner.keyshard_id();

    for entry in entries {
        // Acked even when discarded.
        report.last_context = Some(entry.context.clone());

        if !state.partitioner.serves(&entry.key) {
            tracing::debug!("Discarding gossip for {}: not in the local keyshard", entry.key);
            report.discarded += 1;
            continue;
        }

        let incoming = match entry.operation {
            Operation::Put => match &entry.value {
                Some(value) => Record::live(value.clone(), entry.context.clone()),
                None => {
                    tracing::warn!("Gossip PUT for {} carries no value, skipping", entry.key);
                    report.discarded += 1;
                    continue;
                }
            },
            Operation::Delete => Record::tombstone(entry.context.clone()),
        };

        let accept = match state.store.record(&entry.key) {
            None => true,
            Some(current) => supersedes(&entry.context, &current.context, resolver),
        };

        if accept {
            state.store.install(&entry.key, incoming);
            report.applied += 1;
        } else {
            tracing::debug!("Discarding stale gossip entry for {}", entry.key);
            report.discarded += 1;
        }

        if let Some(keyshard) = keyshard {
            state.context.merge(keyshard, &entry.context);
        }
    }

    report
}
