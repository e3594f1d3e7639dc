use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AlignmentError {
    #[error("alignment indices are 1-based, got link {0}-{1}")]
    ZeroIndex(usize, usize),
    #[error("evaluation needs one gold alignment per test alignment ({test} test vs {gold} gold)")]
    EvalLengthMismatch { test: usize, gold: usize },
    #[error("unknown symmetrization method '{0}'")]
    UnknownMethod(String),
    #[error("unknown alignment heuristic '{0}'")]
    UnknownHeuristic(String),
    #[error("sentence lengths differ: {left} vs {right} words")]
    SentenceLengthMismatch { left: usize, right: usize },
    #[error("malformed alignment link '{0}'")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, AlignmentError>;
