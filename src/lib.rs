//! Generic in-memory B+ tree with an external total-order comparator.
//!
//! The tree stores (K, V) pairs across leaf pages linked in a sibling
//! chain, routed to by index pages holding separator keys. Lookup,
//! insertion, and deletion all descend from the root and repair
//! structure (splits, merges, rebalances) on the way back up. A
//! bidirectional cursor enumerates the tree from any key or from
//! either end, and survives interleaved mutation via a version-tagged
//! restart protocol rather than by tracking live cursors from the
//! tree.
//!
//! This crate is single-threaded: a [`Tree`] and any [`Cursor`]s
//! derived from it must be externally serialized by the caller.

mod comparator;
mod cursor;
mod delete;
mod error;
mod insert;
mod page;
mod search;
mod tree;

pub use comparator::KeyComparator;
pub use cursor::Cursor;
pub use error::TreeConfigError;
pub use tree::Tree;
