use serde::{Deserialize, Serialize};

/// Ordered list of node addresses (`host:port`) making up the cluster.
///
/// The order is part of the contract: keyshard and replica numbers are derived from each
/// node's position, so every node must hold the same sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct View(Vec<String>);

impl View {
    pub fn new(addresses: Vec<String>) -> Self {
        Self(addresses)
    }

    /// Parses the comma-separated form used on the command line and in view-change
    /// requests. Blank entries are skipped.
    pub fn parse(raw: &str) -> Self {
        Self(
            raw.split(',')
                .map(str::trim)
                .filter(|address| !address.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn addresses(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn index_of(&self, address: &str) -> Option<usize> {
        self.0.iter().position(|candidate| candidate == address)
    }

    pub fn contains(&self, address: &str) -> bool {
        self.index_of(address).is_some()
    }

    /// Addresses of `self` followed by those of `other` not already listed.
    pub fn union(&self, other: &View) -> Vec<String> {
        let mut merged = self.0.clone();
        for address in &other.0 {
            if !merged.contains(address) {
                merged.push(address.clone());
            }
        }
        merged
    }
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join(","))
    }
}
