//! Errors raised while classifying, reconciling and assembling.

use crate::document::{NodeKind, SectionRef};
use crate::tokenizer::TokenizeError;
use std::fmt;

/// Zone being scanned when classification failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Preamble,
    Diagrams,
    Paired,
    Trailing,
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Zone::Preamble => "preamble",
            Zone::Diagrams => "diagram",
            Zone::Paired => "paired-block",
            Zone::Trailing => "trailing",
        };
        f.write_str(s)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("section {section}: structure mismatch at child {position} in {zone} zone (found {found}, {expected})")]
    StructureMismatch {
        section: SectionRef,
        position: usize,
        zone: Zone,
        found: FoundNode,
        expected: &'static str,
    },
    #[error("section {section}: malformed figure at child {position}: {reason}")]
    MalformedFigure {
        section: SectionRef,
        position: usize,
        reason: String,
    },
    #[error("section {section}: control field {field:?} at child {position} has no list body")]
    MalformedControlBody {
        section: SectionRef,
        position: usize,
        field: String,
    },
    #[error("section {section}: field {field:?} at child {position} has no list body")]
    MalformedFieldBody {
        section: SectionRef,
        position: usize,
        field: String,
    },
    #[error("section {section}: child {position}: {source}")]
    Tokenize {
        section: SectionRef,
        position: usize,
        #[source]
        source: TokenizeError,
    },
    #[error("section {section}: field {field:?} in field list not in diagram {diagram}")]
    UnknownField {
        section: SectionRef,
        diagram: usize,
        field: String,
    },
    #[error("section {section}: field name {field:?} appears twice in diagram {diagram}")]
    DuplicateField {
        section: SectionRef,
        diagram: usize,
        field: String,
    },
    #[error("section {section}: {kind} name {raw:?} in diagram {diagram} has no identifier characters")]
    UnnamedField {
        section: SectionRef,
        diagram: usize,
        /// `"diagram cell"`, `"field"` or `"inserted field"`.
        kind: &'static str,
        raw: String,
    },
    #[error("section {section}: {field:?} inserted at offset {offset} from {anchor:?} falls outside diagram {diagram}")]
    RefOutOfRange {
        section: SectionRef,
        diagram: usize,
        field: String,
        anchor: String,
        offset: i64,
    },
    #[error("section {section}: slot {slot:?} holds a {found} where a field was expected")]
    InternalTypeMismatch {
        section: SectionRef,
        slot: String,
        found: &'static str,
    },
    #[error("struct {name}: field {field:?} has no bit width")]
    MissingWidth { name: String, field: String },
    #[error("struct {name} defined by {} sections: {}", sections.len(), join_sections(sections))]
    DuplicateStructDefinition {
        name: String,
        sections: Vec<SectionRef>,
    },
}

/// Node kind at a failing scan position, or end of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoundNode {
    Node(NodeKind),
    End,
}

impl fmt::Display for FoundNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FoundNode::Node(k) => write!(f, "{}", k),
            FoundNode::End => f.write_str("end of section"),
        }
    }
}

fn join_sections(sections: &[SectionRef]) -> String {
    sections
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl ExtractError {
    /// Section-scoped errors can be skipped by the caller; the rest abort the document.
    pub fn is_section_scoped(&self) -> bool {
        !matches!(
            self,
            ExtractError::InternalTypeMismatch { .. }
                | ExtractError::MissingWidth { .. }
                | ExtractError::DuplicateStructDefinition { .. }
        )
    }
}
