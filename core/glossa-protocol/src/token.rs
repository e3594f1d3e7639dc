use alloc::string::{String, ToString};
use alloc::vec::Vec;
use rkyv::{Archive, Deserialize, Serialize};

use crate::ids::WordIndex;

#[cfg(feature = "serde")]
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// A word of a sentence as handed over by the tokenizer.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[archive(check_bytes)]
pub struct Token {
    pub index: WordIndex,
    pub form: String,
    pub lemma: Option<String>,
    pub stem: Option<String>,
    pub pos: Option<String>,
}

impl Token {
    pub fn new(index: WordIndex, form: impl Into<String>) -> Self {
        Self {
            index,
            form: form.into(),
            lemma: None,
            stem: None,
            pos: None,
        }
    }

    pub fn with_pos(mut self, pos: impl Into<String>) -> Self {
        self.pos = Some(pos.into());
        self
    }

    pub fn with_lemma(mut self, lemma: impl Into<String>) -> Self {
        self.lemma = Some(lemma.into());
        self
    }

    pub fn with_stem(mut self, stem: impl Into<String>) -> Self {
        self.stem = Some(stem.into());
        self
    }

    /// Numbers `words` from 1 upward.
    pub fn sequence<S: AsRef<str>>(words: &[S]) -> Vec<Token> {
        words
            .iter()
            .enumerate()
            .map(|(i, w)| Token::new(i + 1, w.as_ref().to_string()))
            .collect()
    }

    /// Splits on whitespace and numbers the pieces from 1.
    pub fn from_line(line: &str) -> Vec<Token> {
        let words: Vec<&str> = line.split_whitespace().collect();
        Self::sequence(&words)
    }
}

/// Attaches tags to an already numbered sequence. Extra tags are ignored.
pub fn tag_sequence<S: AsRef<str>>(tokens: &mut [Token], tags: &[S]) {
    for (token, tag) in tokens.iter_mut().zip(tags) {
        token.pos = Some(tag.as_ref().to_string());
    }
}
