//! Reconciliation: merge one diagram's cells with the section's field list into a
//! single ordered list, then splice in relative-location refs.

use crate::ast::{ArtField, Entry, Field, FieldRef, RelLoc};
use crate::document::SectionRef;
use crate::error::ExtractError;
use crate::names::field_name_formatter;
use std::collections::HashMap;

/// Reconciled field list of one diagram.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    pub entries: Vec<Entry>,
    /// Refs whose anchor is not a field of this diagram.
    pub dropped: Vec<RelLoc>,
}

/// What an order slot currently holds.
#[derive(Debug, Clone)]
enum Slot {
    Art(ArtField),
    Merged(Field),
    /// Left behind while a slot's field is being merged.
    Taken,
}

impl Slot {
    fn into_field(self, section: &SectionRef, name: &str) -> Result<Field, ExtractError> {
        match self {
            Slot::Merged(f) => Ok(f),
            Slot::Art(a) => Ok(a.to_field()),
            Slot::Taken => Err(ExtractError::InternalTypeMismatch {
                section: section.clone(),
                slot: name.to_string(),
                found: "vacated slot",
            }),
        }
    }
}

/// Name-keyed lookup over diagram order. Re-keying builds a new lookup.
#[derive(Debug, Clone)]
struct Lookup {
    order: Vec<String>,
    slots: Vec<Slot>,
    index: HashMap<String, usize>,
}

impl Lookup {
    fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    fn rekey(self, at: usize, name: &str) -> Lookup {
        let order: Vec<String> = self
            .order
            .into_iter()
            .enumerate()
            .map(|(i, n)| if i == at { name.to_string() } else { n })
            .collect();
        let index = order.iter().enumerate().map(|(i, n)| (n.clone(), i)).collect();
        Lookup {
            order,
            slots: self.slots,
            index,
        }
    }
}

/// Reconcile one diagram against the section's text fields and refs.
pub fn reconcile(
    section: &SectionRef,
    diagram: usize,
    art: &[ArtField],
    fields: &[Field],
    refs: &[RelLoc],
) -> Result<Reconciled, ExtractError> {
    let mut lookup = art_to_lookup(section, diagram, art)?;
    for field in fields {
        lookup = merge_field(section, diagram, lookup, field)?;
    }
    let mut entries = lookup_to_entries(section, lookup)?;
    let dropped = apply_refs(section, diagram, refs, &mut entries)?;
    Ok(Reconciled { entries, dropped })
}

/// Formatted name of a field, rejecting names with no identifier characters.
fn canonical_name(
    section: &SectionRef,
    diagram: usize,
    kind: &'static str,
    raw: &str,
) -> Result<String, ExtractError> {
    let name = field_name_formatter(raw);
    if name.is_empty() {
        return Err(ExtractError::UnnamedField {
            section: section.clone(),
            diagram,
            kind,
            raw: raw.to_string(),
        });
    }
    Ok(name)
}

fn art_to_lookup(section: &SectionRef, diagram: usize, art: &[ArtField]) -> Result<Lookup, ExtractError> {
    let mut lookup = Lookup {
        order: Vec::with_capacity(art.len()),
        slots: Vec::with_capacity(art.len()),
        index: HashMap::with_capacity(art.len()),
    };
    for a in art {
        let name = canonical_name(section, diagram, "diagram cell", &a.name)?;
        if lookup.index.insert(name.clone(), lookup.order.len()).is_some() {
            return Err(ExtractError::DuplicateField {
                section: section.clone(),
                diagram,
                field: name,
            });
        }
        lookup.order.push(name.clone());
        lookup.slots.push(Slot::Art(ArtField::new(name, a.width)));
    }
    Ok(lookup)
}

/// Resolve a text field by name, then by abbreviation, and merge it into its slot.
fn merge_field(
    section: &SectionRef,
    diagram: usize,
    lookup: Lookup,
    field: &Field,
) -> Result<Lookup, ExtractError> {
    let name = canonical_name(section, diagram, "field", &field.name)?;
    let abbrev = field.abbrev.as_deref().map(field_name_formatter);

    let mut lookup = match lookup.position(&name) {
        Some(_) => lookup,
        None => match abbrev.as_deref().and_then(|a| lookup.position(a)) {
            Some(at) => lookup.rekey(at, &name),
            None => {
                return Err(ExtractError::UnknownField {
                    section: section.clone(),
                    diagram,
                    field: name,
                })
            }
        },
    };

    let at = lookup.index[&name];
    let mut text = field.clone();
    text.name = name.clone();
    let current = std::mem::replace(&mut lookup.slots[at], Slot::Taken);
    let mut merged = current.into_field(section, &name)?.merge(text);
    merged.name = name;
    lookup.slots[at] = Slot::Merged(merged);
    Ok(lookup)
}

fn lookup_to_entries(section: &SectionRef, lookup: Lookup) -> Result<Vec<Entry>, ExtractError> {
    lookup
        .order
        .iter()
        .zip(lookup.slots)
        .map(|(name, slot)| {
            let mut field = slot.into_field(section, name)?;
            field.name = name.clone();
            Ok(Entry::Field(field))
        })
        .collect()
}

/// Insert a [`FieldRef`] per ref at its anchor's index plus offset. Refs with no
/// anchor in `entries` are returned rather than applied.
fn apply_refs(
    section: &SectionRef,
    diagram: usize,
    refs: &[RelLoc],
    entries: &mut Vec<Entry>,
) -> Result<Vec<RelLoc>, ExtractError> {
    let mut dropped = Vec::new();
    for r in refs {
        let anchor = field_name_formatter(&r.anchor);
        let Some(i) = entries.iter().position(|e| e.name() == anchor) else {
            tracing::warn!(
                section = %section,
                diagram,
                anchor = %anchor,
                field = %r.name,
                "dropping relative-location ref with no anchor in diagram"
            );
            dropped.push(r.clone());
            continue;
        };
        let mut field_ref = FieldRef::from(r);
        field_ref.name = canonical_name(section, diagram, "inserted field", &r.name)?;
        if entries.iter().any(|e| e.name() == field_ref.name) {
            return Err(ExtractError::DuplicateField {
                section: section.clone(),
                diagram,
                field: field_ref.name,
            });
        }
        let at = (i as i64)
            .checked_add(r.offset)
            .filter(|&at| at >= 0 && at <= entries.len() as i64);
        let Some(at) = at else {
            return Err(ExtractError::RefOutOfRange {
                section: section.clone(),
                diagram,
                field: field_ref.name,
                anchor,
                offset: r.offset,
            });
        };
        entries.insert(at as usize, Entry::Ref(field_ref));
    }
    Ok(dropped)
}
