//! Causal Context Module
//!
//! Vector clocks used to order writes within a keyshard.
//!
//! ## Core Concepts
//! - **CausalContext**: one row per keyshard, one column per replica. Only the row of the
//!   local keyshard is authoritative; the other rows are advisory.
//! - **Dominance**: row `a` supersedes row `b` when every counter of `a` is at least the
//!   matching counter of `b`.
//! - **Conflict resolution**: writes whose rows are concurrent are settled by a
//!   `ConflictResolver`. The default, `FirstDifferenceWins`, keeps the row with the larger
//!   value at the lowest index where the two rows differ.

pub mod context;

pub use context::{
    CausalContext, CausalOrder, ClockRow, ConflictResolver, FirstDifferenceWins, compare,
    concurrent, dominates, pointwise_max, pointwise_min, supersedes,
};

#[cfg(test)]
mod tests;
