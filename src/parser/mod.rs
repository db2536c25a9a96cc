//! JavaScript parsing and source regeneration (§6.1's parser adapter).

pub mod tree;

pub use tree::SourceTree;
