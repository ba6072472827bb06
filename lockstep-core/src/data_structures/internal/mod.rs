//! Internal implementation details.
//!
//! `Key` and `KeyBuilder` are re-exported publicly; the raw chain node is
//! pub(crate) and shared by the fine-grained, optimistic and lazy sets.

pub mod chain_node;
pub mod key;

pub(crate) use chain_node::{ChainNode, NodePtr, Removal, Window, find_window};
pub use key::{Key, KeyBuilder};
