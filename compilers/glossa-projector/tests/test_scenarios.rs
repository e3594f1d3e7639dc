use glossa_align::Alignment;
use glossa_projector::{project_ds, project_ps, project_pos, BatchTally, ProjectionError};
use glossa_protocol::{tag_sequence, Token, ROOT};
use glossa_syntax::{DependencyGraph, Tree};

const GAVE_TREE: &str = "(S (NP (DT the) (NN teacher)) (VP (VBD gave) (NP (DT a) (NN book)) \
     (PP (TO to) (NP (DT the) (NN boy))) (NP (NN yesterday))))";

fn welsh() -> (Tree, Vec<Token>, Vec<Token>, Alignment) {
    let tree = Tree::from_bracketed(GAVE_TREE).unwrap();
    let src = Token::sequence(&tree.leaf_labels());
    let tgt = Token::from_line("Rhoddodd yr athro lyfr i'r bachgen ddoe");
    let aln: Alignment = "1-2 2-3 3-1 5-4 6-5 7-5 8-6 9-7".parse().unwrap();
    (tree, src, tgt, aln)
}

#[test]
fn test_welsh_verb_first_reordering() {
    let (tree, src, tgt, aln) = welsh();
    let out = project_ps(&tree, &src, &tgt, &aln).unwrap();

    assert_eq!(out[out.root()].label(), "S");
    assert_eq!(out.leaf_indices(), vec![1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(
        out.leaf_labels(),
        vec!["Rhoddodd", "yr", "athro", "lyfr", "i'r", "bachgen", "ddoe"]
    );
    // subject NP lands inside the verb phrase span and is merged into it
    assert_eq!(
        out.to_string(),
        "(S (VP+NP (VBD Rhoddodd) (DT yr) (NN athro) (NP (NN lyfr)) \
         (PP (TO+NP (DT i'r) (NN bachgen))) (NP (NN ddoe))))"
    );
}

#[test]
fn test_source_tree_untouched() {
    let (tree, src, tgt, aln) = welsh();
    let before = tree.to_string();
    let _ = project_ps(&tree, &src, &tgt, &aln).unwrap();
    assert_eq!(tree.to_string(), before);
}

#[test]
fn test_one_word_two_targets_are_siblings() {
    let tree = Tree::from_bracketed("(S (NN walk))").unwrap();
    let src = Token::sequence(&tree.leaf_labels());
    let tgt = Token::from_line("sa-lo sa-lo");
    let aln = Alignment::from_pairs([(1, 1), (1, 2)]).unwrap();

    let out = project_ps(&tree, &src, &tgt, &aln).unwrap();
    assert_eq!(out.to_string(), "(S (NN sa-lo sa-lo))");
    let parents: Vec<_> = out.leaves().iter().map(|l| out[*l].parent()).collect();
    assert_eq!(parents.len(), 2);
    assert_eq!(parents[0], parents[1]);
}

#[test]
fn test_dependency_isomorphism() {
    let text = "nsubj(ran-2, John-1) root(ROOT-0, ran-2) prep_into(ran-2, woods-5)";
    let src = DependencyGraph::from_typed_deps(text).unwrap();
    let tgt = Token::from_line("Rhedodd Siôn i mewn coed");
    let aln = Alignment::from_pairs([(1, 2), (2, 1), (5, 5)]).unwrap();

    let out = project_ds(&src, &tgt, &aln).unwrap();
    assert_eq!(out.edge_count(), src.edge_count());
    assert_eq!(out.relation(ROOT, 1), Some("root"));
    assert_eq!(out.relation(1, 2), Some("nsubj"));
    assert_eq!(out.relation(1, 5), Some("prep_into"));
    assert_eq!(out.word(2).map(|w| w.form.as_str()), Some("Siôn"));
    assert_eq!(out.single_root().unwrap(), 1);

    let (dense, mapping) = out.renumbered();
    assert_eq!(dense.indices(), vec![1, 2, 3]);
    assert_eq!(mapping[&5], 3);
    assert_eq!(dense.relation(1, 3), Some("prep_into"));
}

#[test]
fn test_pos_follows_the_alignment() {
    let (_, mut src, tgt, aln) = welsh();
    tag_sequence(&mut src, &["DT", "NN", "VBD", "DT", "NN", "TO", "DT", "NN", "NN"]);
    let tags = project_pos(&src, &tgt, &aln);
    let tags: Vec<_> = tags.iter().map(|t| t.as_deref().unwrap_or("_")).collect();
    assert_eq!(tags, vec!["VBD", "DT", "NN", "NN", "TO", "NN", "NN"]);
}

#[test]
fn test_corpus_tally() {
    let (tree, src, tgt, aln) = welsh();
    let mut tally = BatchTally::new();
    tally.record(&project_ps(&tree, &src, &tgt, &aln));
    tally.record(&project_ds(&DependencyGraph::new(), &tgt, &aln));

    assert_eq!(tally.successes, 1);
    assert_eq!(tally.failures.get(ProjectionError::NoAnnotation.reason()), Some(&1));
}

/// Every map of each source word onto exactly one of three target words.
fn all_maps(words: usize, targets: usize) -> Vec<Vec<(usize, usize)>> {
    let mut maps = vec![Vec::new()];
    for w in 1..=words {
        maps = maps
            .into_iter()
            .flat_map(|m| {
                (1..=targets).map(move |t| {
                    let mut next = m.clone();
                    next.push((w, t));
                    next
                })
            })
            .collect();
    }
    maps
}

#[test]
fn test_penn_trees_survive_many_to_one_maps() {
    let trees = [
        "(S (NP (DT the) (NN dog)) (VP (VBD ran) (PP (IN to) (NP (DT the) (NN park)))))",
        "(S (VP (VBD ran) (NP (NN home))) (NP (NN dog)))",
    ];
    let tgt = Token::from_line("x y z");
    for text in trees {
        let tree = Tree::from_bracketed(text).unwrap();
        let src = Token::sequence(&tree.leaf_labels());
        for map in all_maps(src.len(), tgt.len()) {
            let aln = Alignment::from_pairs(map).unwrap();
            let out = project_ps(&tree, &src, &tgt, &aln)
                .unwrap_or_else(|e| panic!("{text} under {aln}: {e}"));
            assert_eq!(out.leaf_indices().len(), aln.aligned_targets().len(), "{text} under {aln}");
        }
    }
}
