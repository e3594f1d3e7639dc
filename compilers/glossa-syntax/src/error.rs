use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("malformed input: {0}")]
    Parse(String),
    #[error("node {0} does not exist in this tree")]
    NodeNotFound(usize),
    #[error("the root node cannot be deleted")]
    RootDeletion,
    #[error("leaf node {0} cannot take children")]
    LeafParent(usize),
    #[error("merge failed: {0}")]
    Merge(String),
    #[error("nodes {0} and {1} are not siblings")]
    NotSiblings(usize, usize),
    #[error("child position {index} out of range for a node with {len} children")]
    ChildOutOfRange { index: usize, len: usize },
    #[error("expected a single root-attached word, found {0:?}")]
    MultipleRoots(Vec<usize>),
    #[error("no word is attached to the root")]
    NoRoot,
}

pub type Result<T> = std::result::Result<T, TreeError>;
