use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use glossa_protocol::WordIndex;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::alignment::{Alignment, Link};
use crate::error::{AlignmentError, Result};

/// Ways of combining a forward and a (pre-flipped) reverse alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum SymMethod {
    Intersect,
    Union,
    GrowDiag,
    /// grow-diag, then any union link with at least one unaligned end.
    GrowDiagFinal,
    /// grow-diag, then any union link with both ends unaligned.
    GrowDiagFinalAnd,
    /// Same combination as [`SymMethod::GrowDiagFinal`].
    Refined,
}

impl SymMethod {
    pub fn name(&self) -> &'static str {
        match self {
            SymMethod::Intersect => "intersect",
            SymMethod::Union => "union",
            SymMethod::GrowDiag => "grow-diag",
            SymMethod::GrowDiagFinal => "grow-diag-final",
            SymMethod::GrowDiagFinalAnd => "grow-diag-final-and",
            SymMethod::Refined => "refined",
        }
    }
}

impl fmt::Display for SymMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SymMethod {
    type Err = AlignmentError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "intersect" | "intersection" => Ok(SymMethod::Intersect),
            "union" => Ok(SymMethod::Union),
            "grow-diag" => Ok(SymMethod::GrowDiag),
            "grow-diag-final" => Ok(SymMethod::GrowDiagFinal),
            "grow-diag-final-and" => Ok(SymMethod::GrowDiagFinalAnd),
            "refined" => Ok(SymMethod::Refined),
            other => Err(AlignmentError::UnknownMethod(other.to_string())),
        }
    }
}

const NEIGHBOURS: [(isize, isize); 8] = [
    (-1, 0),
    (0, -1),
    (1, 0),
    (0, 1),
    (-1, -1),
    (-1, 1),
    (1, -1),
    (1, 1),
];

/// Tracks which words the accepted links already cover.
struct Coverage {
    accepted: Alignment,
    sources: HashSet<WordIndex>,
    targets: HashSet<WordIndex>,
}

impl Coverage {
    fn new(seed: Alignment) -> Self {
        let sources = seed.aligned_sources().into_iter().collect();
        let targets = seed.aligned_targets().into_iter().collect();
        Self {
            accepted: seed,
            sources,
            targets,
        }
    }

    fn accept(&mut self, link: &Link) {
        self.sources.insert(link.src);
        self.targets.insert(link.tgt);
        // Indices come from an existing alignment, so they are never 0.
        let _ = self.accepted.add_link(link.clone());
    }

    fn either_free(&self, link: &Link) -> bool {
        !self.sources.contains(&link.src) || !self.targets.contains(&link.tgt)
    }

    fn both_free(&self, link: &Link) -> bool {
        !self.sources.contains(&link.src) && !self.targets.contains(&link.tgt)
    }
}

fn grow_diag(coverage: &mut Coverage, union: &Alignment) {
    loop {
        let mut grew = false;
        let current: Vec<(WordIndex, WordIndex)> = coverage.accepted.pairs().collect();
        for (src, tgt) in current {
            for (ds, dt) in NEIGHBOURS {
                let (Some(ns), Some(nt)) = (src.checked_add_signed(ds), tgt.checked_add_signed(dt))
                else {
                    continue;
                };
                if ns == 0 || nt == 0 || coverage.accepted.contains(ns, nt) {
                    continue;
                }
                if let Some(link) = union.get(ns, nt) {
                    if coverage.either_free(link) {
                        let link = link.clone();
                        coverage.accept(&link);
                        grew = true;
                    }
                }
            }
        }
        if !grew {
            break;
        }
    }
}

fn finish(coverage: &mut Coverage, union: &Alignment, require_both: bool) {
    for link in union.links() {
        if coverage.accepted.contains(link.src, link.tgt) {
            continue;
        }
        let free = if require_both {
            coverage.both_free(link)
        } else {
            coverage.either_free(link)
        };
        if free {
            coverage.accept(link);
        }
    }
}

/// Combines `forward` with `reverse`, both in source→target coordinates.
pub fn symmetrize(forward: &Alignment, reverse: &Alignment, method: SymMethod) -> Alignment {
    let inter = forward & reverse;
    let union = forward | reverse;

    match method {
        SymMethod::Intersect => inter,
        SymMethod::Union => union,
        SymMethod::GrowDiag
        | SymMethod::GrowDiagFinal
        | SymMethod::GrowDiagFinalAnd
        | SymMethod::Refined => {
            let mut coverage = Coverage::new(inter);
            grow_diag(&mut coverage, &union);
            match method {
                SymMethod::GrowDiagFinal | SymMethod::Refined => {
                    finish(&mut coverage, &union, false)
                }
                SymMethod::GrowDiagFinalAnd => finish(&mut coverage, &union, true),
                _ => {}
            }
            coverage.accepted
        }
    }
}

/// [`symmetrize`] with a method given by name.
pub fn symmetrize_named(
    forward: &Alignment,
    reverse: &Alignment,
    method: &str,
) -> Result<Alignment> {
    let method: SymMethod = method.parse()?;
    Ok(symmetrize(forward, reverse, method))
}
