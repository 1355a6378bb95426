//! Per-section extraction: classify, read diagrams and field list, reconcile.

use crate::ast::{ArtField, Field, RelLoc, SectionStruct};
use crate::document::{Node, Section};
use crate::error::ExtractError;
use crate::names::field_name_formatter;
use crate::reconcile::{reconcile, Reconciled};
use crate::tokenizer::Tokenizer;
use crate::zones::{classify, ZoneIndices};

/// Structs extracted from one section, plus refs that matched no diagram field.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionOutput {
    pub structs: Vec<SectionStruct>,
    pub dropped_refs: Vec<RelLoc>,
}

/// Run the whole per-section pipeline. One struct per diagram, each named after
/// the section title.
pub fn extract_section<T: Tokenizer>(
    section: &Section,
    tokenizer: &T,
) -> Result<SectionOutput, ExtractError> {
    let zones = classify(section)?;
    let diagrams = section_diagrams(section, &zones, tokenizer)?;
    let (fields, refs) = section_fields(section, &zones, tokenizer)?;

    let reference = section.reference();
    let name = field_name_formatter(&section.title);
    let mut output = SectionOutput {
        structs: Vec::with_capacity(diagrams.len()),
        dropped_refs: Vec::new(),
    };
    for (i, art) in diagrams.iter().enumerate() {
        let Reconciled { entries, dropped } = reconcile(&reference, i, art, &fields, &refs)?;
        output.dropped_refs.extend(dropped);
        output.structs.push(SectionStruct {
            name: name.clone(),
            section: reference.clone(),
            entries,
        });
    }
    Ok(output)
}

/// Parse every figure of the diagram zone.
pub fn section_diagrams<T: Tokenizer>(
    section: &Section,
    zones: &ZoneIndices,
    tokenizer: &T,
) -> Result<Vec<Vec<ArtField>>, ExtractError> {
    zones
        .diagram_range()
        .map(|position| {
            let malformed = |reason: String| ExtractError::MalformedFigure {
                section: section.reference(),
                position,
                reason,
            };
            let figure = &section.children[position];
            let text = match figure.first_child() {
                Some(Node::Artwork(text)) => text,
                Some(other) => return Err(malformed(format!("expected artwork, found {}", other.kind()))),
                None => return Err(malformed("figure has no children".to_string())),
            };
            tokenizer.diagram(text).map_err(|source| ExtractError::Tokenize {
                section: section.reference(),
                position,
                source,
            })
        })
        .collect()
}

/// Parse the (title, body) pairs of the trailing zone into fields and refs.
pub fn section_fields<T: Tokenizer>(
    section: &Section,
    zones: &ZoneIndices,
    tokenizer: &T,
) -> Result<(Vec<Field>, Vec<RelLoc>), ExtractError> {
    let mut fields = Vec::new();
    let mut refs = Vec::new();
    let tokenize_err = |position: usize| {
        move |source| ExtractError::Tokenize {
            section: section.reference(),
            position,
            source,
        }
    };

    for position in zones.field_range().step_by(2) {
        let title = &section.children[position];
        let (mut field, attributes) = tokenizer
            .field_title(&title.text())
            .map_err(tokenize_err(position))?;
        let items = section
            .children
            .get(position + 1)
            .and_then(list_items);

        if attributes.is_set("control") {
            let text = items
                .filter(|items| !items.is_empty())
                .map(|items| items.iter().map(Node::text).collect::<Vec<_>>().join("\n"))
                .ok_or_else(|| ExtractError::MalformedControlBody {
                    section: section.reference(),
                    position: position + 1,
                    field: field.name.clone(),
                })?;
            fields.extend(
                tokenizer
                    .control_fields(&text)
                    .map_err(tokenize_err(position + 1))?,
            );
            continue;
        }

        let items = items.ok_or_else(|| ExtractError::MalformedFieldBody {
            section: section.reference(),
            position: position + 1,
            field: field.name.clone(),
        })?;
        let text = items.iter().map(Node::text).collect::<Vec<_>>().join("\n");
        field.attributes = attributes;
        refs.extend(
            tokenizer
                .field_body(&mut field, &text)
                .map_err(tokenize_err(position + 1))?,
        );
        fields.push(field);
    }
    Ok((fields, refs))
}

/// Items of the list a body paragraph wraps.
fn list_items(body: &Node) -> Option<&[Node]> {
    match body {
        Node::Paragraph(children) => match children.first() {
            Some(Node::List(items)) => Some(items),
            _ => None,
        },
        _ => None,
    }
}
