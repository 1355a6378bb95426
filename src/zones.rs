//! Zone classification: partition a section's children into the five contiguous
//! zones of a diagram section.
//!
//! ```text
//! Paragraph*            preamble
//! Figure+               diagrams
//! Paragraph*            paired block (prose without list bodies)
//! (Paragraph P[List])*  trailing: field title / list-bearing body pairs
//! ...                   remainder
//! ```

use crate::document::{Node, Section};
use crate::error::{ExtractError, FoundNode, Zone};
use std::ops::Range;

/// Zone lengths, each relative to the start of its zone. Their sum is the
/// section's child count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ZoneIndices {
    pub preamble: usize,
    pub diagrams: usize,
    pub paired: usize,
    pub trailing: usize,
    pub remainder: usize,
}

impl ZoneIndices {
    pub fn total(&self) -> usize {
        self.preamble + self.diagrams + self.paired + self.trailing + self.remainder
    }

    /// Absolute child indices of the figures.
    pub fn diagram_range(&self) -> Range<usize> {
        let start = self.preamble;
        start..start + self.diagrams
    }

    /// Absolute child indices of the title/body pairs.
    pub fn field_range(&self) -> Range<usize> {
        let start = self.preamble + self.diagrams + self.paired;
        start..start + self.trailing
    }
}

/// Classify a section's children into zones.
pub fn classify(section: &Section) -> Result<ZoneIndices, ExtractError> {
    let children = &section.children;
    let mismatch = |position: usize, zone: Zone, expected: &'static str| {
        ExtractError::StructureMismatch {
            section: section.reference(),
            position,
            zone,
            found: children
                .get(position)
                .map_or(FoundNode::End, |n| FoundNode::Node(n.kind())),
            expected,
        }
    };

    let mut j = 0;

    // Paragraph* up to the first figure
    let mut i = j;
    while j < children.len() {
        match &children[j] {
            Node::Figure(_) => break,
            Node::Paragraph(_) => j += 1,
            _ => return Err(mismatch(j, Zone::Preamble, "expected paragraph or figure")),
        }
    }
    if j == children.len() {
        return Err(mismatch(j, Zone::Diagrams, "expected figure"));
    }
    let preamble = j - i;

    // Figure+ up to the first paragraph
    i = j;
    while j < children.len() {
        match &children[j] {
            Node::Paragraph(_) => break,
            Node::Figure(_) => j += 1,
            _ => return Err(mismatch(j, Zone::Diagrams, "expected figure or paragraph")),
        }
    }
    let diagrams = j - i;

    // Prose paragraphs; a list-bearing paragraph belongs to the trailing zone
    // together with its title.
    i = j;
    while j < children.len() {
        let child = &children[j];
        if !matches!(child, Node::Paragraph(_)) {
            return Err(mismatch(j, Zone::Paired, "expected paragraph"));
        }
        if child.is_list_paragraph() {
            if j == i {
                return Err(mismatch(j, Zone::Paired, "expected field title before list body"));
            }
            j -= 1;
            break;
        }
        j += 1;
    }
    let paired = j - i;

    // (title, list body) pairs
    i = j;
    while j < children.len() {
        match &children[j] {
            Node::Paragraph(_) => {}
            Node::Figure(_) => {
                return Err(mismatch(j, Zone::Trailing, "figure after field list"));
            }
            _ => break,
        }
        match children.get(j + 1) {
            Some(body) if body.is_list_paragraph() => j += 2,
            _ => break,
        }
    }
    let trailing = j - i;

    let zones = ZoneIndices {
        preamble,
        diagrams,
        paired,
        trailing,
        remainder: children.len() - j,
    };
    tracing::debug!(section = %section.reference(), ?zones, "classified section");
    Ok(zones)
}
