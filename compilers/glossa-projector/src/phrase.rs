use std::collections::BTreeMap;

use glossa_align::Alignment;
use glossa_protocol::{Token, WordIndex};
use glossa_syntax::{spans_overlap, NodeKey, Tree, TreeError};
use tracing::{debug, warn};

use crate::config::{OrphanPolicy, ProjectionConfig};
use crate::error::Result;

/// Projects a phrase-structure tree onto the target sentence with the
/// default [`ProjectionConfig`].
///
/// # Panics
///
/// Panics if `source` does not have exactly one leaf per source token.
pub fn project_ps(
    source: &Tree,
    source_tokens: &[Token],
    target: &[Token],
    aln: &Alignment,
) -> Result<Tree> {
    project_ps_with(source, source_tokens, target, aln, &ProjectionConfig::default())
}

/// Projects `source` through `aln` onto `target`.
///
/// Each source leaf becomes one leaf per aligned target word, unaligned
/// leaves disappear along with any constituent left without words, and
/// sibling constituents whose target spans interleave are merged until
/// the leaves read left to right in target order.
///
/// # Panics
///
/// Panics if `source` does not have exactly one leaf per source token.
pub fn project_ps_with(
    source: &Tree,
    source_tokens: &[Token],
    target: &[Token],
    aln: &Alignment,
    config: &ProjectionConfig,
) -> Result<Tree> {
    let leaf_count = source.leaves().len();
    assert_eq!(
        leaf_count,
        source_tokens.len(),
        "source tree has {leaf_count} leaves but the sentence has {} tokens",
        source_tokens.len()
    );

    let forms: BTreeMap<WordIndex, &str> =
        target.iter().map(|t| (t.index, t.form.as_str())).collect();

    // 1. Copy the structure, re-homing leaves onto target words
    let src_root = source.root();
    let mut out = Tree::new(source[src_root].label());
    let root = out.root();
    out.set_id(root, source[src_root].id())?;
    copy_children(source, src_root, &mut out, root, aln, &forms)?;

    if config.orphan_policy == OrphanPolicy::AttachToRoot {
        let reached = aln.aligned_targets();
        for t in target.iter().filter(|t| !reached.contains(&t.index)) {
            out.add_leaf(root, t.form.as_str(), t.index)?;
        }
    }

    // 2. Prune, reorder and merge bottom-up
    repair(&mut out, root)?;

    let indices = out.leaf_indices();
    if indices.windows(2).any(|w| w[0] >= w[1]) {
        let reason = format!("leaves out of target order after repair: {indices:?}");
        return Err(TreeError::Merge(reason).into());
    }

    debug!(leaves = indices.len(), nodes = out.node_count(), "projected phrase structure");
    Ok(out)
}

fn copy_children(
    source: &Tree,
    from: NodeKey,
    out: &mut Tree,
    to: NodeKey,
    aln: &Alignment,
    forms: &BTreeMap<WordIndex, &str>,
) -> Result<()> {
    for child in source[from].children() {
        let node = &source[*child];
        match node.word_index() {
            Some(w) => {
                for t in aln.targets_of(w) {
                    match forms.get(&t) {
                        Some(form) => {
                            out.add_leaf(to, *form, t)?;
                        }
                        None => {
                            warn!(source = w, target = t, "link points past the target sentence")
                        }
                    }
                }
            }
            None => {
                let key = out.add_child(to, node.label())?;
                out.set_id(key, node.id())?;
                copy_children(source, *child, out, key, aln, forms)?;
            }
        }
    }
    Ok(())
}

/// Repairs the subtree under `key`: children first, then this node's own
/// child list. Any delete or merge bumps the node's generation, which
/// restarts the scan over its (now different) children.
fn repair(tree: &mut Tree, key: NodeKey) -> Result<()> {
    let children = tree[key].children().to_vec();
    for child in children {
        if !tree[child].is_leaf() {
            repair(tree, child)?;
        }
    }

    'scan: loop {
        tree.sort_children_by_span(key)?;
        let generation = tree[key].generation();
        let children = tree[key].children().to_vec();

        for (i, child) in children.iter().enumerate() {
            match tree.span(*child) {
                // nothing aligned below it
                None => tree.delete(*child, false)?,
                Some(span) => {
                    if let Some(next) = children.get(i + 1) {
                        if tree.span(*next).is_some_and(|s| spans_overlap(span, s)) {
                            let merged = tree.merge(*child, *next, true)?;
                            if !tree[merged].is_leaf() {
                                repair(tree, merged)?;
                            }
                        }
                    }
                }
            }
            if tree[key].generation() != generation {
                continue 'scan;
            }
        }
        break;
    }
    Ok(())
}
