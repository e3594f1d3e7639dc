//! Word alignments between a source and a target sentence: the link set
//! itself, heuristic string-matching alignment, symmetrization of two
//! directional alignments, and alignment quality scores.

pub mod alignment;
pub mod error;
pub mod eval;
pub mod heuristics;
pub mod symmetrize;

pub use alignment::{Alignment, Link, PROBABLE, SURE};
pub use error::{AlignmentError, Result};
pub use eval::AlignEval;
pub use heuristics::{
    exact_match, gram_match, heuristic_chain, heuristic_chain_from, heuristic_match, stem_match,
    Heuristic, HeuristicConfig, MatchOptions,
};
pub use symmetrize::{symmetrize, symmetrize_named, SymMethod};
