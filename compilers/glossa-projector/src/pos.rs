use glossa_align::Alignment;
use glossa_protocol::Token;

/// Part-of-speech tags carried over from `source` onto each target token.
///
/// A target word takes the tag of the lowest-numbered aligned source word
/// that has one; words with no tagged source stay `None`.
pub fn project_pos(source: &[Token], target: &[Token], aln: &Alignment) -> Vec<Option<String>> {
    target
        .iter()
        .map(|t| {
            aln.sources_of(t.index).into_iter().find_map(|s| {
                source
                    .iter()
                    .find(|tok| tok.index == s)
                    .and_then(|tok| tok.pos.clone())
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glossa_protocol::tag_sequence;

    #[test]
    fn test_project_pos() {
        let mut src = Token::from_line("the red car");
        tag_sequence(&mut src, &["DT", "JJ", "NN"]);
        let tgt = Token::from_line("y car coch");
        let aln = Alignment::from_pairs([(1, 1), (2, 3), (3, 2)]).unwrap();
        assert_eq!(
            project_pos(&src, &tgt, &aln),
            vec![Some("DT".to_string()), Some("NN".to_string()), Some("JJ".to_string())]
        );
    }

    #[test]
    fn test_unaligned_and_untagged_targets() {
        let mut src = Token::from_line("to the boy");
        tag_sequence(&mut src, &["TO", "DT", "NN"]);
        src[0].pos = None;
        let tgt = Token::from_line("i'r bachgen heddiw");
        let aln = Alignment::from_pairs([(1, 1), (2, 1), (3, 2)]).unwrap();
        // "i'r" is reached from an untagged "to" first, then a tagged "the"
        assert_eq!(
            project_pos(&src, &tgt, &aln),
            vec![Some("DT".to_string()), Some("NN".to_string()), None]
        );
    }
}
