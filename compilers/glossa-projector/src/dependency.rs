use std::collections::{BTreeMap, BTreeSet, VecDeque};

use glossa_align::Alignment;
use glossa_protocol::{Token, WordIndex, ROOT};
use glossa_syntax::{DepEdge, DependencyGraph};
use tracing::{debug, warn};

use crate::config::{CyclePolicy, ProjectionConfig};
use crate::error::{ProjectionError, Result};

/// Projects a dependency graph onto the target sentence with the default
/// [`ProjectionConfig`].
pub fn project_ds(
    source: &DependencyGraph,
    target: &[Token],
    aln: &Alignment,
) -> Result<DependencyGraph> {
    project_ds_with(source, target, aln, &ProjectionConfig::default())
}

/// Source edges in top-down order from the root, then whatever the walk
/// could not reach.
fn edges_top_down(source: &DependencyGraph) -> Vec<DepEdge> {
    let mut by_head: BTreeMap<WordIndex, Vec<DepEdge>> = BTreeMap::new();
    for e in source.edges() {
        by_head.entry(e.head).or_default().push(e);
    }

    let mut ordered = Vec::new();
    let mut visited = BTreeSet::from([ROOT]);
    let mut queue = VecDeque::from([ROOT]);
    while let Some(head) = queue.pop_front() {
        if let Some(edges) = by_head.remove(&head) {
            for e in edges {
                if visited.insert(e.dependent) {
                    queue.push_back(e.dependent);
                }
                ordered.push(e);
            }
        }
    }
    ordered.extend(by_head.into_values().flatten());
    ordered
}

/// In-sentence aligned targets of `head`, or of its nearest ancestor in
/// the source graph that has some; `[ROOT]` when none does.
fn resolve_head(
    source: &DependencyGraph,
    aln: &Alignment,
    forms: &BTreeMap<WordIndex, &Token>,
    head: WordIndex,
) -> Vec<WordIndex> {
    if head == ROOT {
        return vec![ROOT];
    }
    std::iter::once(head)
        .chain(source.ancestors(head))
        .take_while(|h| *h != ROOT)
        .map(|h| in_sentence(aln, forms, h))
        .find(|targets| !targets.is_empty())
        .unwrap_or_else(|| vec![ROOT])
}

fn in_sentence(
    aln: &Alignment,
    forms: &BTreeMap<WordIndex, &Token>,
    src: WordIndex,
) -> Vec<WordIndex> {
    let (inside, past): (Vec<WordIndex>, Vec<WordIndex>) =
        aln.targets_of(src).into_iter().partition(|t| forms.contains_key(t));
    for t in past {
        warn!(source = src, target = t, "link points past the target sentence");
    }
    inside
}

/// Projects `source` through `aln` onto `target`.
///
/// Edges with an unaligned dependent are dropped; an unaligned head is
/// replaced by its nearest aligned governor. Many-to-many links fan out
/// into several edges. Edges that would close a cycle are handled per
/// [`CyclePolicy`]. Head and dependent collapsing onto the same target
/// word yield no edge. Target indices are kept as they are.
pub fn project_ds_with(
    source: &DependencyGraph,
    target: &[Token],
    aln: &Alignment,
    config: &ProjectionConfig,
) -> Result<DependencyGraph> {
    if !source.has_edges() {
        return Err(ProjectionError::NoAnnotation);
    }

    let words = source.indices();
    if config.completeness_requirement > 0.0 {
        let aligned = words.iter().filter(|w| aln.is_src_aligned(**w)).count();
        let coverage = if words.is_empty() {
            0.0
        } else {
            aligned as f64 / words.len() as f64
        };
        if coverage < config.completeness_requirement {
            return Err(ProjectionError::IncompleteAlignment {
                coverage,
                required: config.completeness_requirement,
            });
        }
    }

    let forms: BTreeMap<WordIndex, &Token> = target.iter().map(|t| (t.index, t)).collect();
    let mut out = DependencyGraph::new();
    let mut dropped = 0usize;

    for edge in edges_top_down(source) {
        let dep_targets = in_sentence(aln, &forms, edge.dependent);
        if dep_targets.is_empty() {
            continue;
        }
        let head_targets = resolve_head(source, aln, &forms, edge.head);
        let pos = source.word(edge.dependent).and_then(|w| w.pos.clone());

        for &dep in &dep_targets {
            for &head in &head_targets {
                if head == dep {
                    continue;
                }
                if out.would_cycle(head, dep) {
                    match config.cycle_policy {
                        CyclePolicy::Drop => {
                            debug!(head, dependent = dep, "dropping edge that would close a cycle");
                            dropped += 1;
                            continue;
                        }
                        CyclePolicy::Raise => {
                            return Err(ProjectionError::Cycle { head, dependent: dep });
                        }
                    }
                }
                for index in [head, dep] {
                    if index != ROOT && !out.contains_word(index) {
                        if let Some(t) = forms.get(&index) {
                            out.add_word(index, t.form.as_str(), t.pos.clone());
                        }
                    }
                }
                out.add_edge(head, dep, edge.relation.as_deref());
            }

            // projected POS from the dependent's source word, unless the target is tagged
            if let (Some(p), Some(t)) = (&pos, forms.get(&dep)) {
                if t.pos.is_none() && out.word(dep).is_some_and(|w| w.pos.is_none()) {
                    out.add_word(dep, t.form.as_str(), Some(p.clone()));
                }
            }
        }
    }

    if dropped > 0 {
        warn!(dropped, "cycle-inducing edges left out of the projection");
    }

    if config.require_single_root {
        out.single_root()?;
    }

    debug!(edges = out.edge_count(), words = out.indices().len(), "projected dependencies");
    Ok(out)
}
