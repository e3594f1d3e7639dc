#![no_std] // Shared by every crate; keep it allocation-only

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod ids;
pub mod token;

pub use ids::{NodeId, WordIndex, ROOT};
pub use token::{tag_sequence, Token};

pub mod model;
pub use model::*;

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use rkyv::{from_bytes, to_bytes};

    #[test]
    fn test_token_serialization() {
        let original = Token::new(3, "athro").with_pos("NN").with_lemma("athro");

        let bytes = to_bytes::<_, 256>(&original).expect("Failed to serialize Token");
        let deserialized: Token = from_bytes(&bytes).expect("Failed to deserialize Token");

        assert_eq!(original, deserialized);
    }

    #[test]
    fn test_meta_serialization() {
        let original = ProjectionMeta::new("heur", "ds-en");

        let bytes = to_bytes::<_, 256>(&original).expect("Failed to serialize ProjectionMeta");
        let deserialized: ProjectionMeta =
            from_bytes(&bytes).expect("Failed to deserialize ProjectionMeta");

        assert_eq!(deserialized.alignment_method, "heur".to_string());
        assert_eq!(original, deserialized);
    }

    #[test]
    fn test_id_layout() {
        assert_eq!(core::mem::size_of::<NodeId>(), 4);
    }

    #[test]
    fn test_from_line_numbers_from_one() {
        let tokens = Token::from_line("Rhoddodd yr  athro");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].index, 1);
        assert_eq!(tokens[2].form, "athro");
    }

    #[test]
    fn test_tag_sequence() {
        let mut tokens = Token::from_line("the dog");
        tag_sequence(&mut tokens, &["DT", "NN", "XX"]);
        assert_eq!(tokens[1].pos.as_deref(), Some("NN"));
    }
}
