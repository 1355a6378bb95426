//! # diagramproto - protocol models from packet diagrams and field lists
//!
//! Protocol documents (RFCs and the like) describe wire formats with an ASCII-art packet diagram
//! followed by an itemized field list. This crate reconciles the two into one
//! authoritative field list per diagram and assembles a [`Protocol`] of structs with
//! interned bit-string types and per-field constraints.
//!
//! ## Section shape
//!
//! ```text
//! Paragraph*                     preamble
//! Figure+                        one packet diagram per figure
//! Paragraph*                     prose
//! (Paragraph  Paragraph[List])*  field title / field description
//! ...                            anything else
//! ```
//!
//! ## Field list
//!
//! ```text
//! Version (V): 4 bits
//!     The protocol version. This field MUST be set to 4.
//!
//! Control Bits: 6 bits; control
//!     URG: Urgent pointer field significant
//!     ACK: Acknowledgment field significant
//!
//! Length: 16 bits
//!     Insert "Marker" with value 1 after "Length" (see Section 3.2).
//! ```
//!
//! ## Pipeline
//!
//! [`zones::classify`] → [`extract::section_diagrams`] + [`extract::section_fields`] →
//! [`reconcile::reconcile`] → [`assemble::collect_structs`] → [`assemble::assemble`].
//! [`Extractor`] runs all of it over a [`Document`].
//!
//! ## Usage
//!
//! ```ignore
//! use diagramproto::{Document, ExtractOptions, Extractor, PestTokenizer};
//!
//! let doc = Document::load_json("rfc.json")?;
//! let extraction = Extractor::new(PestTokenizer, ExtractOptions::default()).extract(&doc)?;
//! for s in &extraction.protocol.structs {
//!     println!("{}: {} fields", s.name, s.fields.len());
//! }
//! ```

pub mod assemble;
pub mod ast;
pub mod document;
pub mod error;
pub mod extract;
pub mod names;
pub mod parser;
pub mod protocol;
pub mod reconcile;
pub mod tokenizer;
pub mod zones;

pub use assemble::{
    assemble, collect_structs, ExtractOptions, Extraction, Extractor, SectionPolicy,
    SkippedSection, StructCollection,
};
pub use ast::{ArtField, Attributes, Constraint, Entry, Field, FieldRef, Literal, RelLoc, SectionStruct};
pub use document::{Document, Node, NodeKind, Section, SectionRef};
pub use error::{ExtractError, Zone};
pub use extract::{extract_section, SectionOutput};
pub use parser::PestTokenizer;
pub use protocol::{BitStringType, Expression, Protocol, StructDef, StructField, TypeId};
pub use tokenizer::{TokenizeError, Tokenizer};
pub use zones::{classify, ZoneIndices};
