use serde::{Deserialize, Serialize};

/// One keyshard's vector clock: a counter per replica column.
pub type ClockRow = Vec<u64>;

/// Relationship between two clock rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CausalOrder {
    Equal,
    /// The left row strictly dominates the right one.
    After,
    /// The right row strictly dominates the left one.
    Before,
    Concurrent,
}

// Rows of different widths only meet across a view change; missing cells count as zero.
fn cell(row: &[u64], index: usize) -> u64 {
    row.get(index).copied().unwrap_or(0)
}

/// `true` iff `a[i] >= b[i]` for every index.
pub fn dominates(a: &[u64], b: &[u64]) -> bool {
    let width = a.len().max(b.len());
    (0..width).all(|i| cell(a, i) >= cell(b, i))
}

/// `true` iff neither row dominates the other.
pub fn concurrent(a: &[u64], b: &[u64]) -> bool {
    !dominates(a, b) && !dominates(b, a)
}

pub fn compare(a: &[u64], b: &[u64]) -> CausalOrder {
    match (dominates(a, b), dominates(b, a)) {
        (true, true) => CausalOrder::Equal,
        (true, false) => CausalOrder::After,
        (false, true) => CausalOrder::Before,
        (false, false) => CausalOrder::Concurrent,
    }
}

pub fn pointwise_max(a: &[u64], b: &[u64]) -> ClockRow {
    let width = a.len().max(b.len());
    (0..width).map(|i| cell(a, i).max(cell(b, i))).collect()
}

pub fn pointwise_min(a: &[u64], b: &[u64]) -> ClockRow {
    let width = a.len().max(b.len());
    (0..width).map(|i| cell(a, i).min(cell(b, i))).collect()
}

/// Decides which of two concurrent writes survives.
///
/// Implementations must be deterministic: every replica has to reach the same verdict
/// for the same pair of rows, regardless of which write it saw first.
pub trait ConflictResolver: Send + Sync {
    fn incoming_wins(&self, incoming: &[u64], current: &[u64]) -> bool;
}

/// The row with the larger counter at the lowest differing index wins.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstDifferenceWins;

impl ConflictResolver for FirstDifferenceWins {
    fn incoming_wins(&self, incoming: &[u64], current: &[u64]) -> bool {
        let width = incoming.len().max(current.len());
        for i in 0..width {
            let (theirs, ours) = (cell(incoming, i), cell(current, i));
            if theirs != ours {
                return theirs > ours;
            }
        }
        false
    }
}

/// Whether a write stamped `incoming` replaces one stamped `current`.
///
/// Dominating writes always replace; concurrent writes defer to `resolver`; dominated
/// writes are stale and dropped.
pub fn supersedes(incoming: &[u64], current: &[u64], resolver: &dyn ConflictResolver) -> bool {
    match compare(incoming, current) {
        CausalOrder::Equal | CausalOrder::After => true,
        CausalOrder::Concurrent => resolver.incoming_wins(incoming, current),
        CausalOrder::Before => false,
    }
}

/// Vector clock matrix sized `num_shards x replication_factor`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CausalContext {
    rows: Vec<ClockRow>,
}

impl CausalContext {
    pub fn new(num_shards: usize, replication_factor: usize) -> Self {
        Self {
            rows: vec![vec![0; replication_factor]; num_shards],
        }
    }

    pub fn num_shards(&self) -> usize {
        self.rows.len()
    }

    pub fn replication_factor(&self) -> usize {
        self.rows.first().map(|row| row.len()).unwrap_or(0)
    }

    pub fn row(&self, keyshard: usize) -> Option<&[u64]> {
        self.rows.get(keyshard).map(|row| row.as_slice())
    }

    /// Bumps the local counter and returns a snapshot of the resulting row.
    pub fn increment(&mut self, keyshard: usize, replica: usize) -> ClockRow {
        match self.rows.get_mut(keyshard) {
            Some(row) => {
                if let Some(counter) = row.get_mut(replica) {
                    *counter += 1;
                }
                row.clone()
            }
            None => Vec::new(),
        }
    }

    /// Folds a remote row of the same keyshard into the local one.
    pub fn merge(&mut self, keyshard: usize, remote: &[u64]) {
        if let Some(row) = self.rows.get_mut(keyshard) {
            for (cell, value) in row.iter_mut().zip(remote) {
                *cell = (*cell).max(*value);
            }
        }
    }
}
