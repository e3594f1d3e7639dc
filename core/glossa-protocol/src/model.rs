use alloc::string::String;
use rkyv::{Archive, Deserialize, Serialize};

#[cfg(feature = "serde")]
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// Provenance handed to annotation storage alongside a projected structure.
/// Neither string is interpreted by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Default, Archive, Serialize, Deserialize)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[archive(check_bytes)]
pub struct ProjectionMeta {
    pub alignment_method: String,
    pub source_annotation: String,
}

impl ProjectionMeta {
    pub fn new(alignment_method: impl Into<String>, source_annotation: impl Into<String>) -> Self {
        Self {
            alignment_method: alignment_method.into(),
            source_annotation: source_annotation.into(),
        }
    }
}
