//! Annotation projection across a word alignment.
//!
//! A phrase-structure tree or a dependency graph over the source sentence
//! is carried over to the target sentence through the links of an
//! [`Alignment`](glossa_align::Alignment): [`project_ps`] rebuilds the
//! tree over target words and repairs crossing constituents, while
//! [`project_ds`] re-points arcs and keeps the result acyclic.

pub mod config;
pub mod dependency;
pub mod error;
pub mod phrase;
pub mod pos;

use std::collections::BTreeMap;

use glossa_protocol::ProjectionMeta;

pub use config::{CyclePolicy, OrphanPolicy, ProjectionConfig};
pub use dependency::{project_ds, project_ds_with};
pub use error::{ProjectionError, Result};
pub use phrase::{project_ps, project_ps_with};
pub use pos::project_pos;

/// A projected structure tagged with how it was obtained.
#[derive(Debug, Clone)]
pub struct Projected<T> {
    pub value: T,
    pub meta: ProjectionMeta,
}

impl<T> Projected<T> {
    pub fn new(value: T, meta: ProjectionMeta) -> Self {
        Self { value, meta }
    }
}

/// Running success/failure counts over a corpus, failures keyed by
/// [`ProjectionError::reason`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchTally {
    pub successes: usize,
    pub failures: BTreeMap<&'static str, usize>,
}

impl BatchTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record<T>(&mut self, outcome: &Result<T>) {
        match outcome {
            Ok(_) => self.successes += 1,
            Err(e) => *self.failures.entry(e.reason()).or_default() += 1,
        }
    }

    pub fn failed(&self) -> usize {
        self.failures.values().sum()
    }

    pub fn total(&self) -> usize {
        self.successes + self.failed()
    }
}
