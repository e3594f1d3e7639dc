//! Syntactic structures the transfer engine reads and produces: ordered
//! phrase-structure trees and head→dependent graphs, with builders for
//! bracketed and typed-dependency notation.

pub mod bracket;
pub mod dependency;
pub mod error;
pub mod tree;

pub use dependency::{DepEdge, DepWord, DependencyGraph};
pub use error::{Result, TreeError};
pub use tree::{spans_overlap, Node, NodeKey, Tree};
