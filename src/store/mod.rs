//! The ternary fact store: facts, lookup patterns, and the bucket index.

pub mod fact;
pub mod index;
pub mod interner;

pub use fact::{Fact, NodeId, Pattern};
pub use index::FactIndex;
pub use interner::NodeInterner;
