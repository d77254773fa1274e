//! Membership Module
//!
//! The cluster is described by a statically configured, ordered `View` of node addresses.
//! It changes only through an administrative view change (see `cluster::redistribution`).
//!
//! ## Layout
//! With `N` nodes and replication factor `R` there are `K = N / R` keyshards:
//! - the first `K` addresses are the primaries of keyshards `0..K`;
//! - every following block of `K` addresses is one more replica column.

pub mod types;

#[cfg(test)]
mod tests;
