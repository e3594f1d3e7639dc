use glossa_protocol::WordIndex;
use glossa_syntax::TreeError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("the source sentence has no annotation to project")]
    NoAnnotation,
    #[error("only {coverage:.2} of source words are aligned, {required:.2} required")]
    IncompleteAlignment { coverage: f64, required: f64 },
    #[error("edge {head}->{dependent} would close a cycle in the projected graph")]
    Cycle { head: WordIndex, dependent: WordIndex },
    #[error(transparent)]
    Tree(#[from] TreeError),
}

impl ProjectionError {
    /// Short reason used when tallying failures over a corpus.
    pub fn reason(&self) -> &'static str {
        match self {
            ProjectionError::NoAnnotation => "no-annotation",
            ProjectionError::IncompleteAlignment { .. } => "incomplete-alignment",
            ProjectionError::Cycle { .. } => "cycle",
            ProjectionError::Tree(TreeError::Merge(_)) => "tree-merge",
            ProjectionError::Tree(_) => "tree",
        }
    }
}

pub type Result<T> = std::result::Result<T, ProjectionError>;
