use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{BitAnd, BitOr, Sub};
use std::str::FromStr;

use glossa_protocol::WordIndex;

use crate::error::{AlignmentError, Result};

/// Kind tag for links a gold annotator marked as certain.
pub const SURE: &str = "sure";
/// Kind tag for links a gold annotator marked as possible.
pub const PROBABLE: &str = "probable";

/// One `(source, target)` word link.
///
/// Equality, ordering and hashing only look at the index pair; `kind` is
/// provenance metadata.
#[derive(Debug, Clone)]
pub struct Link {
    pub src: WordIndex,
    pub tgt: WordIndex,
    pub kind: Option<String>,
}

impl Link {
    pub fn new(src: WordIndex, tgt: WordIndex) -> Self {
        Self { src, tgt, kind: None }
    }

    pub fn with_kind(src: WordIndex, tgt: WordIndex, kind: impl Into<String>) -> Self {
        Self {
            src,
            tgt,
            kind: Some(kind.into()),
        }
    }

    pub fn pair(&self) -> (WordIndex, WordIndex) {
        (self.src, self.tgt)
    }

    pub fn flipped(&self) -> Self {
        Self {
            src: self.tgt,
            tgt: self.src,
            kind: self.kind.clone(),
        }
    }

    pub fn is_sure(&self) -> bool {
        self.kind.as_deref() == Some(SURE)
    }
}

impl PartialEq for Link {
    fn eq(&self, other: &Self) -> bool {
        self.pair() == other.pair()
    }
}

impl Eq for Link {}

impl Hash for Link {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pair().hash(state);
    }
}

impl PartialOrd for Link {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Link {
    fn cmp(&self, other: &Self) -> Ordering {
        self.pair().cmp(&other.pair())
    }
}

/// A set of links between one source and one target sentence.
///
/// Links are kept ordered by `(src, tgt)` so iteration and printing are
/// deterministic. Set operations return new values; for links present on
/// both sides the left operand's `kind` wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Alignment {
    links: BTreeSet<Link>,
}

impl Alignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an alignment from raw index pairs, rejecting 0.
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (WordIndex, WordIndex)>,
    {
        let mut aln = Self::new();
        for (src, tgt) in pairs {
            aln.add(src, tgt)?;
        }
        Ok(aln)
    }

    pub fn from_links<I>(links: I) -> Result<Self>
    where
        I: IntoIterator<Item = Link>,
    {
        let mut aln = Self::new();
        for link in links {
            aln.add_link(link)?;
        }
        Ok(aln)
    }

    /// Word-for-word alignment of two sentences of the same length
    /// (e.g. a gloss line against its language line).
    pub fn monotone(src_len: usize, tgt_len: usize) -> Result<Self> {
        if src_len != tgt_len {
            return Err(AlignmentError::SentenceLengthMismatch {
                left: src_len,
                right: tgt_len,
            });
        }
        Self::from_pairs((1..=src_len).map(|i| (i, i)))
    }

    /// Returns `true` if the pair was not present yet.
    pub fn add(&mut self, src: WordIndex, tgt: WordIndex) -> Result<bool> {
        self.add_link(Link::new(src, tgt))
    }

    pub fn add_with_kind(&mut self, src: WordIndex, tgt: WordIndex, kind: &str) -> Result<bool> {
        self.add_link(Link::with_kind(src, tgt, kind))
    }

    pub fn add_link(&mut self, link: Link) -> Result<bool> {
        if link.src == 0 || link.tgt == 0 {
            return Err(AlignmentError::ZeroIndex(link.src, link.tgt));
        }
        Ok(self.links.insert(link))
    }

    pub fn remove(&mut self, src: WordIndex, tgt: WordIndex) -> bool {
        self.links.remove(&Link::new(src, tgt))
    }

    pub fn contains(&self, src: WordIndex, tgt: WordIndex) -> bool {
        self.links.contains(&Link::new(src, tgt))
    }

    pub fn get(&self, src: WordIndex, tgt: WordIndex) -> Option<&Link> {
        self.links.get(&Link::new(src, tgt))
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> + '_ {
        self.links.iter()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (WordIndex, WordIndex)> + '_ {
        self.links.iter().map(Link::pair)
    }

    /// Target indices linked to `src`, ascending.
    pub fn targets_of(&self, src: WordIndex) -> Vec<WordIndex> {
        self.links
            .range(Link::new(src, 0)..Link::new(src + 1, 0))
            .map(|l| l.tgt)
            .collect()
    }

    /// Source indices linked to `tgt`, ascending.
    pub fn sources_of(&self, tgt: WordIndex) -> Vec<WordIndex> {
        self.links.iter().filter(|l| l.tgt == tgt).map(|l| l.src).collect()
    }

    pub fn aligned_sources(&self) -> BTreeSet<WordIndex> {
        self.links.iter().map(|l| l.src).collect()
    }

    pub fn aligned_targets(&self) -> BTreeSet<WordIndex> {
        self.links.iter().map(|l| l.tgt).collect()
    }

    pub fn is_src_aligned(&self, src: WordIndex) -> bool {
        !self.targets_of(src).is_empty()
    }

    pub fn is_tgt_aligned(&self, tgt: WordIndex) -> bool {
        self.links.iter().any(|l| l.tgt == tgt)
    }

    pub fn is_subset(&self, other: &Alignment) -> bool {
        self.links.is_subset(&other.links)
    }

    /// Swaps source and target on every link.
    pub fn flip(&self) -> Alignment {
        Alignment {
            links: self.links.iter().map(Link::flipped).collect(),
        }
    }

    pub fn intersection(&self, other: &Alignment) -> Alignment {
        Alignment {
            links: self.links.intersection(&other.links).cloned().collect(),
        }
    }

    pub fn union(&self, other: &Alignment) -> Alignment {
        Alignment {
            links: self.links.union(&other.links).cloned().collect(),
        }
    }

    pub fn difference(&self, other: &Alignment) -> Alignment {
        Alignment {
            links: self.links.difference(&other.links).cloned().collect(),
        }
    }

    /// Links whose kind is [`SURE`].
    pub fn sure(&self) -> Alignment {
        Alignment {
            links: self.links.iter().filter(|l| l.is_sure()).cloned().collect(),
        }
    }

    /// True if any link carries a sure/probable tag.
    pub fn has_confidence_tags(&self) -> bool {
        self.links
            .iter()
            .any(|l| matches!(l.kind.as_deref(), Some(SURE) | Some(PROBABLE)))
    }
}

impl BitAnd for &Alignment {
    type Output = Alignment;

    fn bitand(self, rhs: &Alignment) -> Alignment {
        self.intersection(rhs)
    }
}

impl BitOr for &Alignment {
    type Output = Alignment;

    fn bitor(self, rhs: &Alignment) -> Alignment {
        self.union(rhs)
    }
}

impl Sub for &Alignment {
    type Output = Alignment;

    fn sub(self, rhs: &Alignment) -> Alignment {
        self.difference(rhs)
    }
}

impl FromIterator<Link> for Alignment {
    /// Silently skips links touching index 0; use [`Alignment::from_links`]
    /// to surface them.
    fn from_iter<T: IntoIterator<Item = Link>>(iter: T) -> Self {
        Alignment {
            links: iter.into_iter().filter(|l| l.src > 0 && l.tgt > 0).collect(),
        }
    }
}

/// Pharaoh-style `1-2 3-4` notation. A `p` separator (`1p2`) marks a
/// probable link, plain `-` in a tagged alignment is sure.
impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for link in &self.links {
            if !first {
                write!(f, " ")?;
            }
            first = false;
            let sep = if link.kind.as_deref() == Some(PROBABLE) { "p" } else { "-" };
            write!(f, "{}{}{}", link.src, sep, link.tgt)?;
        }
        Ok(())
    }
}

impl FromStr for Alignment {
    type Err = AlignmentError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parsed = Vec::new();
        for piece in s.split_whitespace() {
            let (sep_pos, kind) = match piece.find('p') {
                Some(p) => (p, Some(PROBABLE)),
                None => match piece.find('-') {
                    Some(p) => (p, None),
                    None => return Err(AlignmentError::Malformed(piece.to_string())),
                },
            };
            let (left, right) = (&piece[..sep_pos], &piece[sep_pos + 1..]);
            let src = left
                .parse::<WordIndex>()
                .map_err(|_| AlignmentError::Malformed(piece.to_string()))?;
            let tgt = right
                .parse::<WordIndex>()
                .map_err(|_| AlignmentError::Malformed(piece.to_string()))?;
            parsed.push((src, tgt, kind));
        }

        // one `p` link makes the whole alignment tagged, so `-` reads as sure
        let tagged = parsed.iter().any(|(_, _, kind)| kind.is_some());
        let mut aln = Alignment::new();
        for (src, tgt, kind) in parsed {
            match kind.or(tagged.then_some(SURE)) {
                Some(k) => aln.add_with_kind(src, tgt, k)?,
                None => aln.add(src, tgt)?,
            };
        }
        Ok(aln)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn aln(pairs: &[(usize, usize)]) -> Alignment {
        Alignment::from_pairs(pairs.iter().copied()).unwrap()
    }

    #[test]
    fn test_kind_is_not_identity() {
        let mut a = Alignment::new();
        assert!(a.add_with_kind(1, 2, SURE).unwrap());
        assert!(!a.add_with_kind(1, 2, PROBABLE).unwrap());
        assert_eq!(a.len(), 1);
        assert_eq!(a.get(1, 2).and_then(|l| l.kind.as_deref()), Some(SURE));
    }

    #[test]
    fn test_zero_index_rejected() {
        let err = Alignment::from_pairs([(0, 1)]).unwrap_err();
        assert_eq!(err, AlignmentError::ZeroIndex(0, 1));
    }

    #[test]
    fn test_targets_and_sources() {
        let a = aln(&[(1, 1), (1, 3), (2, 3), (4, 2)]);
        assert_eq!(a.targets_of(1), vec![1, 3]);
        assert_eq!(a.targets_of(3), Vec::<usize>::new());
        assert_eq!(a.sources_of(3), vec![1, 2]);
        assert!(a.is_tgt_aligned(2));
        assert!(!a.is_src_aligned(3));
    }

    #[test]
    fn test_operators() {
        let a = aln(&[(1, 1), (2, 2)]);
        let b = aln(&[(2, 2), (3, 3)]);
        assert_eq!(&a & &b, aln(&[(2, 2)]));
        assert_eq!(&a | &b, aln(&[(1, 1), (2, 2), (3, 3)]));
        assert_eq!(&a - &b, aln(&[(1, 1)]));
    }

    #[test]
    fn test_flip() {
        let a = aln(&[(1, 4), (2, 3)]);
        assert_eq!(a.flip(), aln(&[(4, 1), (3, 2)]));
    }

    #[test]
    fn test_monotone_requires_equal_length() {
        assert_eq!(Alignment::monotone(3, 3).unwrap().len(), 3);
        assert!(matches!(
            Alignment::monotone(3, 4),
            Err(AlignmentError::SentenceLengthMismatch { left: 3, right: 4 })
        ));
    }

    #[test]
    fn test_pharaoh_text() {
        let a: Alignment = "1-2 3p4 2-2".parse().unwrap();
        assert_eq!(a.len(), 3);
        assert_eq!(a.get(3, 4).and_then(|l| l.kind.as_deref()), Some(PROBABLE));
        assert_eq!(a.to_string(), "1-2 2-2 3p4");
        assert!("1:2".parse::<Alignment>().is_err());
    }

    #[test]
    fn test_plain_links_are_sure_in_tagged_text() {
        let a: Alignment = "1-1 2p2".parse().unwrap();
        assert!(a.get(1, 1).is_some_and(Link::is_sure));
        assert_eq!(a.sure().pairs().collect::<Vec<_>>(), vec![(1, 1)]);
        let again: Alignment = a.to_string().parse().unwrap();
        assert_eq!(again.get(1, 1).and_then(|l| l.kind.as_deref()), Some(SURE));

        let untagged: Alignment = "1-1 2-2".parse().unwrap();
        assert!(!untagged.has_confidence_tags());
    }

    fn arb_alignment() -> impl Strategy<Value = Alignment> {
        prop::collection::vec((1usize..8, 1usize..8), 0..20)
            .prop_map(|pairs| Alignment::from_pairs(pairs).unwrap())
    }

    proptest! {
        #[test]
        fn test_set_algebra(a in arb_alignment(), b in arb_alignment()) {
            let inter = &a & &b;
            let uni = &a | &b;
            prop_assert!(inter.is_subset(&a));
            prop_assert!(inter.is_subset(&b));
            prop_assert!(a.is_subset(&uni));
            prop_assert!((&uni - &a).is_subset(&b));
        }

        #[test]
        fn test_flip_is_involution(a in arb_alignment()) {
            prop_assert_eq!(a.flip().flip(), a);
        }
    }
}
