use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use glossa_protocol::{Token, WordIndex};
use tracing::{debug, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::alignment::Alignment;
use crate::error::{AlignmentError, Result};

bitflags! {
    /// Switches shared by every heuristic pass.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct MatchOptions: u8 {
        /// Compare forms case-insensitively.
        const LOWERCASE = 1;
        /// Compare morphemes (split on hyphens/punctuation) instead of whole words.
        const MORPHEMES = 2;
        /// Give each source word at most one new target per pass.
        const NO_MULTIPLES = 4;
        /// Every pass additionally requires the POS tags to agree.
        const USE_POS = 8;
        /// Only the source side must be unaligned; targets may collect several links.
        const DIRECTIONAL = 16;
    }
}

/// One pass of the heuristic chain, from strictest to most permissive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Heuristic {
    Exact,
    Stem,
    Gram,
    ExactPos,
    StemPos,
    GramPos,
}

impl Heuristic {
    pub fn name(&self) -> &'static str {
        match self {
            Heuristic::Exact => "exact",
            Heuristic::Stem => "stem",
            Heuristic::Gram => "gram",
            Heuristic::ExactPos => "exact-pos",
            Heuristic::StemPos => "stem-pos",
            Heuristic::GramPos => "gram-pos",
        }
    }

    pub fn requires_pos(&self) -> bool {
        matches!(self, Heuristic::ExactPos | Heuristic::StemPos | Heuristic::GramPos)
    }

    /// Checks a single candidate pair under this pass.
    pub fn matches(&self, src: &Token, tgt: &Token, options: MatchOptions) -> bool {
        let needs_pos = self.requires_pos() || options.contains(MatchOptions::USE_POS);
        if needs_pos && !pos_match(src, tgt) {
            return false;
        }
        match self {
            Heuristic::Exact | Heuristic::ExactPos => exact_match(src, tgt, options),
            Heuristic::Stem | Heuristic::StemPos => stem_match(src, tgt, options),
            Heuristic::Gram | Heuristic::GramPos => gram_match(src, tgt, options),
        }
    }
}

impl fmt::Display for Heuristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Heuristic {
    type Err = AlignmentError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "exact" => Ok(Heuristic::Exact),
            "stem" => Ok(Heuristic::Stem),
            "gram" => Ok(Heuristic::Gram),
            "exact-pos" => Ok(Heuristic::ExactPos),
            "stem-pos" => Ok(Heuristic::StemPos),
            "gram-pos" => Ok(Heuristic::GramPos),
            other => Err(AlignmentError::UnknownHeuristic(other.to_string())),
        }
    }
}

/// Immutable settings for one [`heuristic_chain`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HeuristicConfig {
    pub options: MatchOptions,
    pub heuristics: Vec<Heuristic>,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            options: MatchOptions::LOWERCASE,
            heuristics: vec![Heuristic::Exact, Heuristic::Stem, Heuristic::Gram],
        }
    }
}

impl HeuristicConfig {
    pub fn with_options(mut self, options: MatchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_heuristics(mut self, heuristics: Vec<Heuristic>) -> Self {
        self.heuristics = heuristics;
        self
    }
}

fn normalize(form: &str, options: MatchOptions) -> String {
    if options.contains(MatchOptions::LOWERCASE) {
        form.to_lowercase()
    } else {
        form.to_string()
    }
}

/// Splits a form on hyphens, apostrophes and other punctuation.
pub fn morphemes(form: &str) -> Vec<&str> {
    form.split(|c: char| !c.is_alphanumeric())
        .filter(|piece| !piece.is_empty())
        .collect()
}

const SUFFIXES: [&str; 8] = ["ingly", "edly", "ing", "ies", "ed", "es", "ly", "s"];

/// Strips the longest known inflectional suffix, keeping at least three
/// characters of stem.
pub fn light_stem(form: &str) -> String {
    for suffix in SUFFIXES {
        if let Some(stem) = form.strip_suffix(suffix) {
            if stem.chars().count() >= 3 {
                return stem.to_string();
            }
        }
    }
    form.to_string()
}

fn units(form: &str, options: MatchOptions) -> BTreeSet<String> {
    let form = normalize(form, options);
    if options.contains(MatchOptions::MORPHEMES) {
        morphemes(&form).into_iter().map(str::to_string).collect()
    } else {
        BTreeSet::from([form])
    }
}

pub fn exact_match(src: &Token, tgt: &Token, options: MatchOptions) -> bool {
    let a = units(&src.form, options);
    let b = units(&tgt.form, options);
    a.intersection(&b).next().is_some()
}

/// Lemma equality first, then stem equality.
pub fn stem_match(src: &Token, tgt: &Token, options: MatchOptions) -> bool {
    if let (Some(a), Some(b)) = (&src.lemma, &tgt.lemma) {
        if normalize(a, options) == normalize(b, options) {
            return true;
        }
    }
    let stems = |token: &Token| -> BTreeSet<String> {
        match &token.stem {
            Some(stem) => BTreeSet::from([normalize(stem, options)]),
            None => units(&token.form, options).iter().map(|u| light_stem(u)).collect(),
        }
    };
    let a = stems(src);
    let b = stems(tgt);
    a.intersection(&b).any(|s| !s.is_empty())
}

/// Any shared morpheme-like piece.
pub fn gram_match(src: &Token, tgt: &Token, options: MatchOptions) -> bool {
    let src_form = normalize(&src.form, options);
    let tgt_form = normalize(&tgt.form, options);
    let a: BTreeSet<&str> = morphemes(&src_form).into_iter().collect();
    morphemes(&tgt_form).into_iter().any(|m| a.contains(m))
}

pub fn pos_match(src: &Token, tgt: &Token) -> bool {
    match (&src.pos, &tgt.pos) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => false,
    }
}

fn has_pos(tokens: &[Token]) -> bool {
    tokens.iter().any(|t| t.pos.is_some())
}

/// Target indices aligned to the nearest aligned source words on either side.
fn neighbor_anchors(aln: &Alignment, src: WordIndex) -> Vec<WordIndex> {
    let sources = aln.aligned_sources();
    let mut anchors = Vec::new();
    if let Some(left) = sources.range(..src).next_back() {
        anchors.extend(aln.targets_of(*left));
    }
    if let Some(right) = sources.range(src + 1..).next() {
        anchors.extend(aln.targets_of(*right));
    }
    anchors
}

fn closest_candidate(anchors: &[WordIndex], candidates: &[WordIndex]) -> Option<WordIndex> {
    if anchors.is_empty() {
        return candidates.first().copied();
    }
    candidates
        .iter()
        .copied()
        .min_by_key(|c| anchors.iter().map(|a| a.abs_diff(*c)).min().unwrap_or(usize::MAX))
}

/// Runs one matching pass over the words `existing` leaves unaligned.
///
/// New links are tagged with `kind`. With [`MatchOptions::NO_MULTIPLES`]
/// a source word keeps only the candidate closest to its aligned
/// neighbours (first in scan order when there are none).
pub fn heuristic_match<F>(
    src: &[Token],
    tgt: &[Token],
    existing: &Alignment,
    match_fn: F,
    options: MatchOptions,
    kind: &str,
) -> Result<Alignment>
where
    F: Fn(&Token, &Token) -> bool,
{
    let mut aln = existing.clone();
    let directional = options.contains(MatchOptions::DIRECTIONAL);

    for s in src {
        if aln.is_src_aligned(s.index) {
            continue;
        }

        let candidates: Vec<WordIndex> = tgt
            .iter()
            .filter(|t| directional || !aln.is_tgt_aligned(t.index))
            .filter(|t| match_fn(s, t))
            .map(|t| t.index)
            .collect();

        if options.contains(MatchOptions::NO_MULTIPLES) {
            let anchors = neighbor_anchors(&aln, s.index);
            if let Some(best) = closest_candidate(&anchors, &candidates) {
                aln.add_with_kind(s.index, best, kind)?;
            }
        } else {
            for t in candidates {
                aln.add_with_kind(s.index, t, kind)?;
            }
        }
    }

    Ok(aln)
}

/// Applies every pass of `config` in order, each one extending the
/// alignment the previous pass produced.
pub fn heuristic_chain(
    src: &[Token],
    tgt: &[Token],
    config: &HeuristicConfig,
) -> Result<Alignment> {
    heuristic_chain_from(src, tgt, &Alignment::new(), config)
}

pub fn heuristic_chain_from(
    src: &[Token],
    tgt: &[Token],
    existing: &Alignment,
    config: &HeuristicConfig,
) -> Result<Alignment> {
    let mut aln = existing.clone();
    let tagged = has_pos(src) && has_pos(tgt);

    for heuristic in &config.heuristics {
        if (heuristic.requires_pos() || config.options.contains(MatchOptions::USE_POS)) && !tagged {
            warn!(pass = heuristic.name(), "skipping POS-aware pass: a side has no POS tags");
            continue;
        }

        let before = aln.len();
        let options = config.options;
        aln = heuristic_match(
            src,
            tgt,
            &aln,
            |s, t| heuristic.matches(s, t, options),
            options,
            heuristic.name(),
        )?;
        debug!(pass = heuristic.name(), added = aln.len() - before, "heuristic pass done");
    }

    Ok(aln)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn toks(line: &str) -> Vec<Token> {
        Token::from_line(line)
    }

    #[test]
    fn test_exact_case_handling() {
        let a = Token::new(1, "Dog");
        let b = Token::new(1, "dog");
        assert!(exact_match(&a, &b, MatchOptions::LOWERCASE));
        assert!(!exact_match(&a, &b, MatchOptions::empty()));
    }

    #[test]
    fn test_stem_prefers_lemma_then_stem() {
        let ran = Token::new(1, "ran").with_lemma("run");
        let run = Token::new(1, "running").with_lemma("run");
        assert!(stem_match(&ran, &run, MatchOptions::empty()));

        let walked = Token::new(1, "walked");
        let walking = Token::new(2, "walking");
        assert!(stem_match(&walked, &walking, MatchOptions::empty()));
        assert!(!exact_match(&walked, &walking, MatchOptions::empty()));
    }

    #[test]
    fn test_gram_shares_morpheme() {
        let a = Token::new(1, "sa-lo");
        let b = Token::new(1, "lo");
        assert!(gram_match(&a, &b, MatchOptions::empty()));
        assert!(!gram_match(&a, &Token::new(1, "sal"), MatchOptions::empty()));
        assert_eq!(morphemes("i'r"), vec!["i", "r"]);
    }

    #[test]
    fn test_morpheme_level_exact() {
        let a = Token::new(1, "dog-PL");
        let b = Token::new(1, "dog");
        assert!(!exact_match(&a, &b, MatchOptions::empty()));
        assert!(exact_match(&a, &b, MatchOptions::MORPHEMES));
    }

    #[test]
    fn test_chain_passes_build_on_each_other() {
        let src = toks("John walked home");
        let tgt = toks("home john walking");
        let aln = heuristic_chain(&src, &tgt, &HeuristicConfig::default()).unwrap();

        assert!(aln.contains(1, 2));
        assert!(aln.contains(3, 1));
        assert!(aln.contains(2, 3));
        assert_eq!(aln.get(1, 2).and_then(|l| l.kind.as_deref()), Some("exact"));
        assert_eq!(aln.get(2, 3).and_then(|l| l.kind.as_deref()), Some("stem"));
    }

    #[test]
    fn test_no_multiples_uses_neighbours() {
        // "the" has two candidates; the aligned neighbour "dog" sits at 4.
        let src = toks("the dog");
        let tgt = toks("the cat the dog");
        let existing = Alignment::from_pairs([(2, 4)]).unwrap();
        let options = MatchOptions::LOWERCASE | MatchOptions::NO_MULTIPLES;
        let exact = |s: &Token, t: &Token| exact_match(s, t, options);
        let aln = heuristic_match(&src, &tgt, &existing, exact, options, "exact").unwrap();
        assert_eq!(aln.targets_of(1), vec![3]);
    }

    #[test]
    fn test_no_multiples_without_context_takes_first() {
        let src = toks("the");
        let tgt = toks("x the the");
        let options = MatchOptions::NO_MULTIPLES;
        let exact = |s: &Token, t: &Token| exact_match(s, t, options);
        let aln = heuristic_match(&src, &tgt, &Alignment::new(), exact, options, "exact").unwrap();
        assert_eq!(aln.targets_of(1), vec![2]);
    }

    #[test]
    fn test_multiples_allowed() {
        let src = toks("sa");
        let tgt = toks("sa sa");
        let aln = heuristic_chain(&src, &tgt, &HeuristicConfig::default()).unwrap();
        assert_eq!(aln.targets_of(1), vec![1, 2]);
    }

    #[test]
    fn test_symmetric_mode_skips_aligned_targets() {
        let src = toks("a a");
        let tgt = toks("a");
        let config = HeuristicConfig::default();
        let aln = heuristic_chain(&src, &tgt, &config).unwrap();
        assert_eq!(aln.len(), 1);

        let directional = config
            .clone()
            .with_options(MatchOptions::LOWERCASE | MatchOptions::DIRECTIONAL);
        let aln = heuristic_chain(&src, &tgt, &directional).unwrap();
        assert_eq!(aln.sources_of(1), vec![1, 2]);
    }

    #[test]
    fn test_pos_passes_skipped_without_tags() {
        let src = toks("dog");
        let tgt = toks("dog");
        let config = HeuristicConfig::default().with_heuristics(vec![Heuristic::ExactPos]);
        let aln = heuristic_chain(&src, &tgt, &config).unwrap();
        assert!(aln.is_empty());
    }

    #[test]
    fn test_pos_passes_require_agreement() {
        let src = vec![Token::new(1, "run").with_pos("VB"), Token::new(2, "run").with_pos("NN")];
        let tgt = vec![Token::new(1, "run").with_pos("NN")];
        let config = HeuristicConfig::default().with_heuristics(vec![Heuristic::ExactPos]);
        let aln = heuristic_chain(&src, &tgt, &config).unwrap();
        assert_eq!(aln.pairs().collect::<Vec<_>>(), vec![(2, 1)]);
    }

    #[test]
    fn test_heuristic_names_round_trip() {
        for h in [Heuristic::Exact, Heuristic::StemPos, Heuristic::GramPos] {
            assert_eq!(h.name().parse::<Heuristic>().unwrap(), h);
        }
        assert!(matches!("fuzzy".parse::<Heuristic>(), Err(AlignmentError::UnknownHeuristic(_))));
    }

    proptest! {
        #[test]
        fn test_chain_is_idempotent_on_full_cover(
            src_words in prop::collection::vec("[a-c]{1,3}", 1..6),
            tgt_words in prop::collection::vec("[a-c]{1,3}", 1..6),
        ) {
            let src = Token::sequence(&src_words);
            let tgt = Token::sequence(&tgt_words);
            let full = Alignment::from_pairs(
                (1..=src.len()).flat_map(|s| (1..=tgt.len()).map(move |t| (s, t))),
            ).unwrap();
            let config = HeuristicConfig::default();
            let again = heuristic_chain_from(&src, &tgt, &full, &config).unwrap();
            prop_assert_eq!(again, full);
        }
    }
}
