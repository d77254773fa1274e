//! Cluster Coordination Module
//!
//! Everything that involves more than one node besides gossip.
//!
//! ## Submodules
//! - **`forwarder`**: relays a request verbatim to the node that owns its key, marking it
//!   with the `from_node` header so it is never forwarded twice.
//! - **`redistribution`**: installs a new view and migrates keys to their new owners,
//!   best-effort and with every failed step reported back.
//! - **`protocol`** / **`handlers`**: the HTTP surface of the above.

pub mod forwarder;
pub mod handlers;
pub mod protocol;
pub mod redistribution;

#[cfg(test)]
mod tests;
