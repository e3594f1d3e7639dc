use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use glossa_protocol::{WordIndex, ROOT};
use nom::{
    bytes::complete::{take_till1, take_while1},
    character::complete::{char, multispace0},
    combinator::all_consuming,
    multi::many0,
    sequence::{delimited, preceded, terminated, tuple},
    IResult,
};
use petgraph::algo::{has_path_connecting, is_cyclic_directed};
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;

use crate::error::{Result, TreeError};

/// Surface data attached to a word of a dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DepWord {
    pub form: String,
    pub pos: Option<String>,
}

/// One head→dependent arc.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepEdge {
    pub head: WordIndex,
    pub dependent: WordIndex,
    pub relation: Option<String>,
}

/// Head→dependent arcs over word indices, with [`ROOT`] (`0`) as the
/// virtual head of the sentence root(s).
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    graph: DiGraphMap<WordIndex, Option<String>>,
    words: BTreeMap<WordIndex, DepWord>,
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyGraph {
    pub fn new() -> Self {
        let mut graph = DiGraphMap::new();
        graph.add_node(ROOT);
        Self {
            graph,
            words: BTreeMap::new(),
        }
    }

    /// Registers (or relabels) word `index`.
    pub fn add_word(&mut self, index: WordIndex, form: impl Into<String>, pos: Option<String>) {
        self.graph.add_node(index);
        self.words.insert(
            index,
            DepWord {
                form: form.into(),
                pos,
            },
        );
    }

    pub fn word(&self, index: WordIndex) -> Option<&DepWord> {
        self.words.get(&index)
    }

    /// Non-root word indices known to the graph, ascending.
    pub fn indices(&self) -> Vec<WordIndex> {
        let mut out: Vec<WordIndex> = self.graph.nodes().filter(|n| *n != ROOT).collect();
        out.sort_unstable();
        out
    }

    pub fn contains_word(&self, index: WordIndex) -> bool {
        index != ROOT && self.graph.contains_node(index)
    }

    /// Returns `false` if the arc already existed (its relation is kept).
    pub fn add_edge(
        &mut self,
        head: WordIndex,
        dependent: WordIndex,
        relation: Option<&str>,
    ) -> bool {
        if self.graph.contains_edge(head, dependent) {
            return false;
        }
        self.graph.add_edge(head, dependent, relation.map(str::to_string));
        true
    }

    pub fn remove_edge(&mut self, head: WordIndex, dependent: WordIndex) -> bool {
        self.graph.remove_edge(head, dependent).is_some()
    }

    pub fn contains_edge(&self, head: WordIndex, dependent: WordIndex) -> bool {
        self.graph.contains_edge(head, dependent)
    }

    pub fn relation(&self, head: WordIndex, dependent: WordIndex) -> Option<&str> {
        self.graph.edge_weight(head, dependent).and_then(|r| r.as_deref())
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn has_edges(&self) -> bool {
        self.graph.edge_count() > 0
    }

    /// All arcs ordered by `(dependent, head)`.
    pub fn edges(&self) -> Vec<DepEdge> {
        let mut out: Vec<DepEdge> = self
            .graph
            .all_edges()
            .map(|(head, dependent, relation)| DepEdge {
                head,
                dependent,
                relation: relation.clone(),
            })
            .collect();
        out.sort_by_key(|e| (e.dependent, e.head));
        out
    }

    pub fn heads_of(&self, dependent: WordIndex) -> Vec<WordIndex> {
        let mut out: Vec<WordIndex> = self
            .graph
            .neighbors_directed(dependent, Direction::Incoming)
            .collect();
        out.sort_unstable();
        out
    }

    /// Lowest-numbered head of `dependent`.
    pub fn head_of(&self, dependent: WordIndex) -> Option<WordIndex> {
        self.heads_of(dependent).into_iter().next()
    }

    pub fn dependents_of(&self, head: WordIndex) -> Vec<WordIndex> {
        let mut out: Vec<WordIndex> = self
            .graph
            .neighbors_directed(head, Direction::Outgoing)
            .collect();
        out.sort_unstable();
        out
    }

    /// Words attached directly to [`ROOT`].
    pub fn roots(&self) -> Vec<WordIndex> {
        self.dependents_of(ROOT)
    }

    /// The one root-attached word, for consumers that need a single tree.
    pub fn single_root(&self) -> Result<WordIndex> {
        match self.roots().as_slice() {
            [] => Err(TreeError::NoRoot),
            [one] => Ok(*one),
            many => Err(TreeError::MultipleRoots(many.to_vec())),
        }
    }

    /// True if a directed path leads from `ancestor` down to `descendant`.
    pub fn is_ancestor(&self, ancestor: WordIndex, descendant: WordIndex) -> bool {
        if ancestor == descendant
            || !self.graph.contains_node(ancestor)
            || !self.graph.contains_node(descendant)
        {
            return false;
        }
        has_path_connecting(&self.graph, ancestor, descendant, None)
    }

    /// Would adding `head → dependent` close a cycle?
    pub fn would_cycle(&self, head: WordIndex, dependent: WordIndex) -> bool {
        head == dependent || self.is_ancestor(dependent, head)
    }

    pub fn is_acyclic(&self) -> bool {
        !is_cyclic_directed(&self.graph)
    }

    /// Successive heads of `index` up to the root, following the lowest
    /// head at each step and stopping at the first repeat.
    pub fn ancestors(&self, index: WordIndex) -> Vec<WordIndex> {
        let mut out = Vec::new();
        let mut seen = BTreeSet::from([index]);
        let mut current = self.head_of(index);
        while let Some(h) = current {
            if !seen.insert(h) {
                break;
            }
            out.push(h);
            current = self.head_of(h);
        }
        out
    }

    /// Copy with words re-indexed densely as `1..=k` in their original
    /// order, plus the old→new mapping.
    pub fn renumbered(&self) -> (DependencyGraph, BTreeMap<WordIndex, WordIndex>) {
        let mapping: BTreeMap<WordIndex, WordIndex> = self
            .indices()
            .into_iter()
            .enumerate()
            .map(|(i, old)| (old, i + 1))
            .chain(std::iter::once((ROOT, ROOT)))
            .collect();

        let mut out = DependencyGraph::new();
        for (old, new) in &mapping {
            if *old == ROOT {
                continue;
            }
            match self.words.get(old) {
                Some(w) => out.add_word(*new, w.form.clone(), w.pos.clone()),
                None => {
                    out.graph.add_node(*new);
                }
            }
        }
        for e in self.edges() {
            out.add_edge(mapping[&e.head], mapping[&e.dependent], e.relation.as_deref());
        }
        (out, mapping)
    }

    /// Parses Stanford typed-dependency lines, e.g.
    /// `nsubj(ran-2, John-1) root(ROOT-0, ran-2)`.
    pub fn from_typed_deps(input: &str) -> Result<DependencyGraph> {
        let (_, items) = all_consuming(terminated(many0(typed_dep), multispace0))(input)
            .map_err(|e| TreeError::Parse(e.to_string()))?;

        let mut graph = DependencyGraph::new();
        for (relation, head, dependent) in items {
            let (head_form, head) = split_word(head)?;
            let (dep_form, dependent) = split_word(dependent)?;
            if head != ROOT && !graph.words.contains_key(&head) {
                graph.add_word(head, head_form, None);
            }
            if dependent == ROOT {
                return Err(TreeError::Parse(format!("ROOT cannot be a dependent in {relation}")));
            }
            if !graph.words.contains_key(&dependent) {
                graph.add_word(dependent, dep_form, None);
            }
            graph.add_edge(head, dependent, Some(relation));
        }
        Ok(graph)
    }
}

fn is_relation_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == ':' || c == '-'
}

fn typed_dep(input: &str) -> IResult<&str, (&str, &str, &str)> {
    tuple((
        preceded(multispace0, take_while1(is_relation_char)),
        delimited(char('('), take_till1(|c| c == ','), char(',')),
        terminated(preceded(multispace0, take_till1(|c| c == ')')), char(')')),
    ))(input)
}

/// `"i'r-5"` → `("i'r", 5)`. Copy marks (`ran-2'`) are ignored.
fn split_word(raw: &str) -> Result<(&str, WordIndex)> {
    let raw = raw.trim().trim_end_matches('\'');
    let (form, index) = raw
        .rsplit_once('-')
        .ok_or_else(|| TreeError::Parse(format!("missing word index in '{raw}'")))?;
    let index = index
        .parse::<WordIndex>()
        .map_err(|_| TreeError::Parse(format!("bad word index in '{raw}'")))?;
    Ok((form, index))
}

/// Typed-dependency notation, one arc per line ordered by dependent.
impl fmt::Display for DependencyGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let form = |i: WordIndex| {
            if i == ROOT {
                "ROOT"
            } else {
                self.words.get(&i).map(|w| w.form.as_str()).unwrap_or("_")
            }
        };
        for (n, e) in self.edges().iter().enumerate() {
            if n > 0 {
                writeln!(f)?;
            }
            write!(
                f,
                "{}({}-{}, {}-{})",
                e.relation.as_deref().unwrap_or("dep"),
                form(e.head),
                e.head,
                form(e.dependent),
                e.dependent
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JOHN: &str = "nsubj(ran-2, John-1) root(ROOT-0, ran-2) prep_into(ran-2, woods-5)";

    #[test]
    fn test_parse_typed_deps() {
        let g = DependencyGraph::from_typed_deps(JOHN).unwrap();
        assert_eq!(g.edge_count(), 3);
        assert_eq!(g.relation(2, 1), Some("nsubj"));
        assert_eq!(g.relation(ROOT, 2), Some("root"));
        assert_eq!(g.word(5).map(|w| w.form.as_str()), Some("woods"));
        assert_eq!(g.indices(), vec![1, 2, 5]);
        assert_eq!(g.single_root(), Ok(2));
    }

    #[test]
    fn test_display_orders_by_dependent() {
        let g = DependencyGraph::from_typed_deps(JOHN).unwrap();
        assert_eq!(
            g.to_string(),
            "nsubj(ran-2, John-1)\nroot(ROOT-0, ran-2)\nprep_into(ran-2, woods-5)"
        );
    }

    #[test]
    fn test_hyphenated_words() {
        let g = DependencyGraph::from_typed_deps("amod(boy-3, well-known-2)\nroot(ROOT-0, boy-3)")
            .unwrap();
        assert_eq!(g.word(2).map(|w| w.form.as_str()), Some("well-known"));
    }

    #[test]
    fn test_malformed_typed_deps() {
        for bad in ["nsubj(ran, John-1)", "nsubj(ran-2 John-1)", "dep(a-1, ROOT-0)"] {
            assert!(matches!(DependencyGraph::from_typed_deps(bad), Err(TreeError::Parse(_))));
        }
    }

    #[test]
    fn test_ancestry_and_cycles() {
        let g = DependencyGraph::from_typed_deps(JOHN).unwrap();
        assert!(g.is_ancestor(ROOT, 5));
        assert!(g.is_ancestor(2, 1));
        assert!(!g.is_ancestor(1, 2));
        assert!(g.would_cycle(1, 2));
        assert!(g.would_cycle(3, 3));
        assert!(!g.would_cycle(5, 1));
        assert!(g.is_acyclic());
        assert_eq!(g.ancestors(5), vec![2, ROOT]);
    }

    #[test]
    fn test_cyclic_graph_detected() {
        let mut g = DependencyGraph::new();
        g.add_edge(1, 2, None);
        g.add_edge(2, 1, None);
        assert!(!g.is_acyclic());
        assert_eq!(g.ancestors(1), vec![2]);
    }

    #[test]
    fn test_root_checks() {
        let mut g = DependencyGraph::new();
        assert_eq!(g.single_root(), Err(TreeError::NoRoot));
        g.add_edge(ROOT, 1, Some("root"));
        g.add_edge(ROOT, 3, Some("root"));
        assert_eq!(g.single_root(), Err(TreeError::MultipleRoots(vec![1, 3])));
    }

    #[test]
    fn test_renumbered_is_dense() {
        let g = DependencyGraph::from_typed_deps(JOHN).unwrap();
        let (dense, mapping) = g.renumbered();
        assert_eq!(mapping[&5], 3);
        assert_eq!(dense.indices(), vec![1, 2, 3]);
        assert_eq!(dense.relation(2, 3), Some("prep_into"));
        assert_eq!(dense.word(3).map(|w| w.form.as_str()), Some("woods"));
    }

    #[test]
    fn test_duplicate_edge_keeps_first_relation() {
        let mut g = DependencyGraph::new();
        assert!(g.add_edge(2, 1, Some("nsubj")));
        assert!(!g.add_edge(2, 1, Some("dobj")));
        assert_eq!(g.relation(2, 1), Some("nsubj"));
    }
}
