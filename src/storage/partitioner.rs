use crate::error::{KvError, KvResult};
use crate::membership::types::View;

/// Hash shared by every node. The first 8 bytes of the BLAKE3 digest are used so that the
/// result does not depend on the build or platform.
pub fn stable_hash(key: &str) -> u64 {
    let digest = blake3::hash(key.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(prefix)
}

/// Keyshard a key belongs to. The modulus is always the number of keyshards, never the
/// size of the view.
pub fn keyshard_of(key: &str, num_shards: usize) -> usize {
    (stable_hash(key) % num_shards.max(1) as u64) as usize
}

/// Where a request for a key has to be handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// The local node is a replica of the key's keyshard.
    Local { keyshard: usize, replica: usize },
    /// Relay to the primary of the key's keyshard.
    Forward { keyshard: usize, address: String },
}

/// Placement of keys and replicas for one installed view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionManager {
    local_address: String,
    view: View,
    replication_factor: usize,
}

impl PartitionManager {
    /// Fails when the view is empty or its size is not a multiple of `replication_factor`.
    /// The local node may be absent from the view; it then serves no keyshard.
    pub fn new(local_address: &str, view: View, replication_factor: usize) -> KvResult<Self> {
        if view.is_empty() {
            return Err(KvError::InvalidView("view is empty".to_string()));
        }
        if replication_factor == 0 {
            return Err(KvError::InvalidView(
                "replication factor must be positive".to_string(),
            ));
        }
        if view.len() % replication_factor != 0 {
            return Err(KvError::InvalidView(format!(
                "{} nodes cannot be split into replica groups of {}",
                view.len(),
                replication_factor
            )));
        }
        Ok(Self {
            local_address: local_address.to_string(),
            view,
            replication_factor,
        })
    }

    pub fn local_address(&self) -> &str {
        &self.local_address
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn replication_factor(&self) -> usize {
        self.replication_factor
    }

    pub fn num_shards(&self) -> usize {
        self.view.len() / self.replication_factor
    }

    pub fn local_index(&self) -> Option<usize> {
        self.view.index_of(&self.local_address)
    }

    pub fn keyshard_id(&self) -> Option<usize> {
        self.local_index().map(|index| index % self.num_shards())
    }

    pub fn replica_id(&self) -> Option<usize> {
        self.local_index().map(|index| index / self.num_shards())
    }

    pub fn get_partition(&self, key: &str) -> usize {
        keyshard_of(key, self.num_shards())
    }

    /// Primary address of a keyshard.
    pub fn owner_address(&self, keyshard: usize) -> Option<&str> {
        if keyshard >= self.num_shards() {
            return None;
        }
        self.view.get(keyshard)
    }

    /// All `(view index, address)` pairs replicating `keyshard`, primary first.
    pub fn shard_members(&self, keyshard: usize) -> Vec<(usize, String)> {
        let num_shards = self.num_shards();
        if keyshard >= num_shards {
            return Vec::new();
        }
        (keyshard..self.view.len())
            .step_by(num_shards)
            .filter_map(|index| self.view.get(index).map(|addr| (index, addr.to_string())))
            .collect()
    }

    /// The other replicas of the local keyshard.
    pub fn replica_peers(&self) -> Vec<(usize, String)> {
        match self.keyshard_id() {
            Some(keyshard) => self
                .shard_members(keyshard)
                .into_iter()
                .filter(|(_, address)| address != &self.local_address)
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn serves(&self, key: &str) -> bool {
        self.keyshard_id() == Some(self.get_partition(key))
    }

    pub fn route(&self, key: &str) -> Route {
        let keyshard = self.get_partition(key);
        match (self.keyshard_id(), self.replica_id()) {
            (Some(local), Some(replica)) if local == keyshard => Route::Local { keyshard, replica },
            _ => Route::Forward {
                keyshard,
                address: self.owner_address(keyshard).unwrap_or_default().to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_deterministic() {
        let manager =
            PartitionManager::new("a:1", View::parse("a:1,b:1,c:1,d:1"), 2).unwrap();

        let p1 = manager.get_partition("book_100");
        let p2 = manager.get_partition("book_100");
        assert_eq!(p1, p2);

        assert!(p1 < 2);
    }
}
