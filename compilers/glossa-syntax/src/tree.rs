use std::collections::HashSet;
use std::fmt;
use std::ops::Index;

use glossa_protocol::{NodeId, WordIndex};
use tracing::trace;

use crate::error::{Result, TreeError};

/// Handle to a node inside one [`Tree`]. Keys are not shared between trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(usize);

impl NodeKey {
    pub fn raw(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    label: String,
    id: Option<NodeId>,
    word_index: Option<WordIndex>,
    children: Vec<NodeKey>,
    parent: Option<NodeKey>,
    generation: u64,
}

impl Node {
    fn internal(label: String) -> Self {
        Self {
            label,
            id: None,
            word_index: None,
            children: Vec::new(),
            parent: None,
            generation: 0,
        }
    }

    fn leaf(label: String, word_index: WordIndex) -> Self {
        Self {
            word_index: Some(word_index),
            ..Self::internal(label)
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn id(&self) -> Option<NodeId> {
        self.id
    }

    pub fn word_index(&self) -> Option<WordIndex> {
        self.word_index
    }

    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    pub fn is_leaf(&self) -> bool {
        self.word_index.is_some()
    }

    /// Bumped every time this node's child list is edited.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// True when two `(min, max)` spans share at least one index.
pub fn spans_overlap(a: (WordIndex, WordIndex), b: (WordIndex, WordIndex)) -> bool {
    a.0 <= b.1 && b.0 <= a.1
}

/// An ordered, labeled phrase-structure tree stored in an arena.
///
/// Leaves carry a word index; every other node is internal, even when it
/// has no children left. `Clone` is a deep copy.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Option<Node>>,
    root: NodeKey,
}

impl Tree {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            nodes: vec![Some(Node::internal(label.into()))],
            root: NodeKey(0),
        }
    }

    pub fn root(&self) -> NodeKey {
        self.root
    }

    pub fn get(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key.0).and_then(Option::as_ref)
    }

    fn live(&self, key: NodeKey) -> Result<&Node> {
        self.get(key).ok_or(TreeError::NodeNotFound(key.0))
    }

    fn live_mut(&mut self, key: NodeKey) -> Result<&mut Node> {
        self.nodes
            .get_mut(key.0)
            .and_then(Option::as_mut)
            .ok_or(TreeError::NodeNotFound(key.0))
    }

    fn push(&mut self, node: Node) -> NodeKey {
        self.nodes.push(Some(node));
        NodeKey(self.nodes.len() - 1)
    }

    fn attach(&mut self, parent: NodeKey, mut node: Node) -> Result<NodeKey> {
        if self.live(parent)?.is_leaf() {
            return Err(TreeError::LeafParent(parent.0));
        }
        node.parent = Some(parent);
        let key = self.push(node);
        let p = self.live_mut(parent)?;
        p.children.push(key);
        p.generation += 1;
        Ok(key)
    }

    pub fn add_child(&mut self, parent: NodeKey, label: impl Into<String>) -> Result<NodeKey> {
        self.attach(parent, Node::internal(label.into()))
    }

    pub fn add_leaf(
        &mut self,
        parent: NodeKey,
        label: impl Into<String>,
        word_index: WordIndex,
    ) -> Result<NodeKey> {
        self.attach(parent, Node::leaf(label.into(), word_index))
    }

    pub fn set_label(&mut self, key: NodeKey, label: impl Into<String>) -> Result<()> {
        self.live_mut(key)?.label = label.into();
        Ok(())
    }

    pub fn set_id(&mut self, key: NodeKey, id: Option<NodeId>) -> Result<()> {
        self.live_mut(key)?.id = id;
        Ok(())
    }

    /// Numbers every live node in preorder, starting at 1.
    pub fn assign_ids(&mut self) {
        for (n, key) in self.preorder().into_iter().enumerate() {
            if let Some(node) = self.nodes[key.0].as_mut() {
                node.id = Some(NodeId::new(n as u32 + 1));
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn preorder(&self) -> Vec<NodeKey> {
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(key) = stack.pop() {
            if let Some(node) = self.get(key) {
                out.push(key);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// Leaves below `key`, left to right.
    pub fn leaves_of(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut out = Vec::new();
        let mut stack = vec![key];
        while let Some(k) = stack.pop() {
            if let Some(node) = self.get(k) {
                if node.is_leaf() {
                    out.push(k);
                } else {
                    stack.extend(node.children.iter().rev().copied());
                }
            }
        }
        out
    }

    pub fn leaves(&self) -> Vec<NodeKey> {
        self.leaves_of(self.root)
    }

    /// Word indices of the leaves, left to right.
    pub fn leaf_indices(&self) -> Vec<WordIndex> {
        self.leaves()
            .into_iter()
            .filter_map(|k| self.get(k).and_then(Node::word_index))
            .collect()
    }

    pub fn leaf_labels(&self) -> Vec<&str> {
        self.leaves()
            .into_iter()
            .filter_map(|k| self.get(k).map(Node::label))
            .collect()
    }

    /// `(min, max)` of the word indices below `key`; `None` without leaves.
    pub fn span(&self, key: NodeKey) -> Option<(WordIndex, WordIndex)> {
        let indices = self
            .leaves_of(key)
            .into_iter()
            .filter_map(|k| self.get(k).and_then(Node::word_index));
        indices.fold(None, |acc, i| match acc {
            None => Some((i, i)),
            Some((lo, hi)) => Some((lo.min(i), hi.max(i))),
        })
    }

    pub fn depth(&self, key: NodeKey) -> usize {
        let mut depth = 0;
        let mut current = self.get(key).and_then(Node::parent);
        while let Some(p) = current {
            depth += 1;
            current = self.get(p).and_then(Node::parent);
        }
        depth
    }

    pub fn find_label(&self, label: &str) -> Option<NodeKey> {
        self.preorder().into_iter().find(|k| self[*k].label == label)
    }

    /// Position of `key` among its parent's children.
    pub fn position(&self, key: NodeKey) -> Option<usize> {
        let parent = self.get(key)?.parent?;
        self.get(parent)?.children.iter().position(|c| *c == key)
    }

    fn bump(&mut self, key: NodeKey) -> Result<()> {
        self.live_mut(key)?.generation += 1;
        Ok(())
    }

    fn discard(&mut self, key: NodeKey) {
        let mut stack = vec![key];
        while let Some(k) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(k.0).and_then(Option::take) {
                stack.extend(node.children);
            }
        }
    }

    /// Removes `key` from its parent. With `promote` its children take its
    /// place in the parent's child list; otherwise the whole subtree goes.
    pub fn delete(&mut self, key: NodeKey, promote: bool) -> Result<()> {
        if key == self.root {
            return Err(TreeError::RootDeletion);
        }
        let node = self.live(key)?;
        let parent = node.parent.ok_or(TreeError::NodeNotFound(key.0))?;
        let children = node.children.clone();
        let pos = self.position(key).ok_or(TreeError::NodeNotFound(key.0))?;

        if promote {
            for c in &children {
                self.live_mut(*c)?.parent = Some(parent);
            }
            self.live_mut(parent)?.children.splice(pos..pos + 1, children);
            self.nodes[key.0] = None;
        } else {
            self.live_mut(parent)?.children.remove(pos);
            self.discard(key);
        }
        self.bump(parent)
    }

    /// Exchanges the children at positions `i` and `j` of `parent`. Word
    /// indices are untouched, so spans of `parent`'s ancestors are as before
    /// but the left-to-right leaf order changes.
    pub fn swap(&mut self, parent: NodeKey, i: usize, j: usize) -> Result<()> {
        let node = self.live_mut(parent)?;
        let len = node.children.len();
        for index in [i, j] {
            if index >= len {
                return Err(TreeError::ChildOutOfRange { index, len });
            }
        }
        node.children.swap(i, j);
        node.generation += 1;
        Ok(())
    }

    fn graft(&mut self, other: &Tree, from: NodeKey, parent: Option<NodeKey>) -> Result<NodeKey> {
        let source = other.live(from)?;
        let mut copy = source.clone();
        copy.children.clear();
        copy.parent = parent;
        copy.generation = 0;
        let key = self.push(copy);
        for child in source.children.clone() {
            let child_key = self.graft(other, child, Some(key))?;
            self.live_mut(key)?.children.push(child_key);
        }
        Ok(key)
    }

    /// Substitutes a copy of `subtree` for `key`, at the same position.
    pub fn replace(&mut self, key: NodeKey, subtree: &Tree) -> Result<NodeKey> {
        let parent = self.live(key)?.parent;
        let new_key = self.graft(subtree, subtree.root, parent)?;
        match parent {
            None => {
                self.root = new_key;
            }
            Some(p) => {
                let pos = self.position(key).ok_or(TreeError::NodeNotFound(key.0))?;
                let pnode = self.live_mut(p)?;
                pnode.children[pos] = new_key;
                pnode.generation += 1;
            }
        }
        self.discard(key);
        Ok(new_key)
    }

    /// Deep copy of the subtree rooted at `key`.
    pub fn subtree(&self, key: NodeKey) -> Result<Tree> {
        let mut out = Tree {
            nodes: Vec::new(),
            root: NodeKey(0),
        };
        out.root = out.graft(self, key, None)?;
        Ok(out)
    }

    /// Fuses two sibling nodes into one, placed at the leftmost of their
    /// two positions.
    ///
    /// Two internal nodes become one node labeled `"A+B"` holding A's
    /// children followed by B's. A leaf merged with an internal node is
    /// absorbed into it. Two leaves only merge under `unify_children` when
    /// they carry the same word index. With `unify_children`, leaf children
    /// repeating a word index already present are dropped.
    pub fn merge(&mut self, a: NodeKey, b: NodeKey, unify_children: bool) -> Result<NodeKey> {
        if a == b {
            return Err(TreeError::Merge(format!("node {} cannot merge with itself", a.0)));
        }
        let (na, nb) = (self.live(a)?, self.live(b)?);
        let parent = match (na.parent, nb.parent) {
            (Some(pa), Some(pb)) if pa == pb => pa,
            _ => return Err(TreeError::NotSiblings(a.0, b.0)),
        };
        let (a_leaf, b_leaf) = (na.is_leaf(), nb.is_leaf());

        if a_leaf && b_leaf {
            if unify_children && na.word_index == nb.word_index {
                let pos = self.position(b).ok_or(TreeError::NodeNotFound(b.0))?;
                self.live_mut(parent)?.children.remove(pos);
                self.discard(b);
                self.bump(parent)?;
                return Ok(a);
            }
            return Err(TreeError::Merge(format!(
                "leaves '{}' and '{}' cover different words",
                na.label, nb.label
            )));
        }

        let keep = if a_leaf { b } else { a };
        let other = if keep == a { b } else { a };
        let label = if !a_leaf && !b_leaf {
            format!("{}+{}", na.label, nb.label)
        } else {
            self.live(keep)?.label.clone()
        };
        let contribution = |node: &Node, key: NodeKey| -> Vec<NodeKey> {
            if node.is_leaf() {
                vec![key]
            } else {
                node.children.clone()
            }
        };
        let mut children = contribution(na, a);
        children.extend(contribution(nb, b));

        let pos_a = self.position(a).ok_or(TreeError::NodeNotFound(a.0))?;
        let pos_b = self.position(b).ok_or(TreeError::NodeNotFound(b.0))?;
        let (lo, hi) = (pos_a.min(pos_b), pos_a.max(pos_b));
        {
            let pnode = self.live_mut(parent)?;
            pnode.children.remove(hi);
            pnode.children.remove(lo);
            pnode.children.insert(lo, keep);
            pnode.generation += 1;
        }
        if !self.live(other)?.is_leaf() {
            self.nodes[other.0] = None;
        }

        // `other` may itself be a duplicate leaf; it is off the parent by now
        if unify_children {
            let mut seen = HashSet::new();
            let mut kept = Vec::with_capacity(children.len());
            for c in children {
                let word = self.live(c)?.word_index;
                match word {
                    Some(w) if !seen.insert(w) => self.discard(c),
                    _ => kept.push(c),
                }
            }
            children = kept;
        }

        for c in &children {
            self.live_mut(*c)?.parent = Some(keep);
        }
        trace!(keep = keep.0, other = other.0, label = %label, "merged siblings");
        let knode = self.live_mut(keep)?;
        knode.label = label;
        knode.children = children;
        knode.generation += 1;
        Ok(keep)
    }

    /// Stable-sorts the children of `key` by span, childless nodes last.
    /// Returns whether the order changed.
    pub fn sort_children_by_span(&mut self, key: NodeKey) -> Result<bool> {
        let children = self.live(key)?.children.clone();
        let mut keyed: Vec<((WordIndex, WordIndex), NodeKey)> = children
            .iter()
            .map(|c| (self.span(*c).unwrap_or((WordIndex::MAX, WordIndex::MAX)), *c))
            .collect();
        keyed.sort_by_key(|(span, _)| *span);
        let sorted: Vec<NodeKey> = keyed.into_iter().map(|(_, c)| c).collect();
        if sorted == children {
            return Ok(false);
        }
        let node = self.live_mut(key)?;
        node.children = sorted;
        node.generation += 1;
        Ok(true)
    }

    fn write_node(&self, key: NodeKey, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(node) = self.get(key) else {
            return Ok(());
        };
        if node.is_leaf() {
            return write!(f, "{}", node.label);
        }
        write!(f, "({}", node.label)?;
        for c in &node.children {
            write!(f, " ")?;
            self.write_node(*c, f)?;
        }
        write!(f, ")")
    }
}

/// # Panics
///
/// Panics if `key` was removed from the tree.
impl Index<NodeKey> for Tree {
    type Output = Node;

    fn index(&self, key: NodeKey) -> &Node {
        match self.get(key) {
            Some(node) => node,
            None => panic!("node {} was removed from this tree", key.0),
        }
    }
}

/// Bracketed notation, e.g. `(S (NP (DT the) (NN dog)) (VP (VBD ran)))`.
impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_node(self.root, f)
    }
}
