//! Document-wide assembly, in two phases: collect section structs by name over the
//! whole document, then build the [`Protocol`] from the completed collection.

use crate::ast::{Entry, RelLoc, SectionStruct};
use crate::document::{Document, SectionRef};
use crate::error::ExtractError;
use crate::extract::extract_section;
use crate::names::field_name_formatter;
use crate::protocol::{Expression, Protocol, StructField};
use crate::tokenizer::Tokenizer;
use std::collections::HashMap;

/// What to do when a single section fails to classify or reconcile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SectionPolicy {
    /// Record the failure and leave the section out.
    #[default]
    Skip,
    /// Abort the document on the first failing section.
    Fail,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractOptions {
    pub on_section_error: SectionPolicy,
}

/// A section left out under [`SectionPolicy::Skip`].
#[derive(Debug)]
pub struct SkippedSection {
    pub section: SectionRef,
    pub error: ExtractError,
}

/// Section structs grouped by name, in first-seen order.
#[derive(Debug, Default)]
pub struct StructCollection {
    names: Vec<String>,
    by_name: HashMap<String, Vec<SectionStruct>>,
    pub skipped: Vec<SkippedSection>,
    pub dropped_refs: Vec<(SectionRef, RelLoc)>,
}

impl StructCollection {
    pub fn push(&mut self, s: SectionStruct) {
        if !self.by_name.contains_key(&s.name) {
            self.names.push(s.name.clone());
        }
        self.by_name.entry(s.name.clone()).or_default().push(s);
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn get(&self, name: &str) -> Option<&[SectionStruct]> {
        self.by_name.get(name).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Phase one: run every diagram-bearing section through extraction.
///
/// Sections without a figure child are not candidates and are passed over. Errors
/// that are not section-scoped abort regardless of policy.
pub fn collect_structs<T: Tokenizer>(
    document: &Document,
    tokenizer: &T,
    policy: SectionPolicy,
) -> Result<StructCollection, ExtractError> {
    let mut out = StructCollection::default();
    for section in document.walk_sections() {
        if !section.has_figure() {
            continue;
        }
        match extract_section(section, tokenizer) {
            Ok(output) => {
                for s in output.structs {
                    out.push(s);
                }
                let reference = section.reference();
                out.dropped_refs
                    .extend(output.dropped_refs.into_iter().map(|r| (reference.clone(), r)));
            }
            Err(e) if policy == SectionPolicy::Skip && e.is_section_scoped() => {
                tracing::warn!(section = %section.reference(), error = %e, "skipping section");
                out.skipped.push(SkippedSection {
                    section: section.reference(),
                    error: e,
                });
            }
            Err(e) => return Err(e),
        }
    }
    Ok(out)
}

/// Phase two: build the protocol. A name defined by more than one section is fatal.
pub fn assemble(title: &str, structs: &StructCollection) -> Result<Protocol, ExtractError> {
    let mut protocol = Protocol::new(field_name_formatter(title));
    for name in structs.names() {
        match structs.get(name).unwrap_or_default() {
            [] => {}
            [single] => assemble_struct(&mut protocol, single)?,
            many => {
                return Err(ExtractError::DuplicateStructDefinition {
                    name: name.clone(),
                    sections: many.iter().map(|s| s.section.clone()).collect(),
                })
            }
        }
    }
    Ok(protocol)
}

fn assemble_struct(protocol: &mut Protocol, s: &SectionStruct) -> Result<(), ExtractError> {
    let mut fields = Vec::new();
    let mut constraints: Vec<Expression> = Vec::new();
    let actions: Vec<Expression> = Vec::new();

    for entry in &s.entries {
        let field = match entry {
            Entry::Field(f) => f,
            Entry::Ref(r) => {
                tracing::debug!(struct_name = %s.name, field = %r.name, "field ref is not a struct field");
                continue;
            }
        };
        let width = field.width.ok_or_else(|| ExtractError::MissingWidth {
            name: s.name.clone(),
            field: field.name.clone(),
        })?;
        let ty = protocol.intern_bitstring(width);
        fields.push(StructField {
            name: field.name.clone(),
            ty,
            is_present: None,
            transform: None,
        });
        constraints.extend(field.to_expressions());
    }

    protocol
        .define_struct(s.name.clone(), fields, constraints, actions)
        .map_err(|_| ExtractError::DuplicateStructDefinition {
            name: s.name.clone(),
            sections: vec![s.section.clone()],
        })?;
    Ok(())
}

/// Protocol plus the per-section diagnostics gathered while building it.
#[derive(Debug)]
pub struct Extraction {
    pub protocol: Protocol,
    pub skipped: Vec<SkippedSection>,
    pub dropped_refs: Vec<(SectionRef, RelLoc)>,
}

/// Whole-document extraction with a tokenizer and options.
#[derive(Debug, Clone, Default)]
pub struct Extractor<T> {
    tokenizer: T,
    options: ExtractOptions,
}

impl<T: Tokenizer> Extractor<T> {
    pub fn new(tokenizer: T, options: ExtractOptions) -> Self {
        Extractor { tokenizer, options }
    }

    pub fn extract(&self, document: &Document) -> Result<Extraction, ExtractError> {
        let structs = collect_structs(document, &self.tokenizer, self.options.on_section_error)?;
        let protocol = assemble(&document.title, &structs)?;
        Ok(Extraction {
            protocol,
            skipped: structs.skipped,
            dropped_refs: structs.dropped_refs,
        })
    }
}
