//! # Shared Packed Parse Forest
//!
//! The SPPF represents every derivation of the input at once, in space
//! polynomial in the input length.
//!
//! ## Node kinds
//!
//! - Terminal and epsilon nodes are leaves.
//! - A nonterminal node `(A, i, j)` stands for every derivation of `A` over
//!   `i..j`.
//! - An intermediate node `(slot, i, j)` stands for a parsed prefix of a rule
//!   up to `slot`. Intermediate nodes keep the forest binarized.
//!
//! Both are further keyed by the argument tuple of the call they belong to,
//! so a rule alternative a precondition rejected under one argument never
//! shows up under another.
//!
//! Nonterminal and intermediate nodes own packed nodes, one per distinct
//! derivation. A node with more than one packed node is ambiguous.
//!
//! The parser builds the forest through [`Sppf::combine`] and
//! [`Sppf::finish_rule`]; [`visit`] has the read-only queries.

mod forest;
mod node;
pub mod visit;

pub use forest::{LookupDistribution, Sppf};
pub use node::{ContextId, NodeLabel, PackedNode, SppfNode, SppfNodeId};
pub use visit::ForestStats;
