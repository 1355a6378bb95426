//! Field-level data model: what diagrams and field lists parse into, and what
//! reconciliation produces.

use crate::document::SectionRef;
use crate::protocol::{BinOp, Expression};
use serde::Serialize;
use std::fmt;

/// One field cell of a packet diagram, in diagram order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtField {
    pub name: String,
    /// Width in bits.
    pub width: u32,
}

impl ArtField {
    pub fn new(name: impl Into<String>, width: u32) -> Self {
        ArtField {
            name: name.into(),
            width,
        }
    }

    /// Diagram-only field: no description, no constraints.
    pub fn to_field(&self) -> Field {
        Field {
            name: self.name.clone(),
            width: Some(self.width),
            ..Field::default()
        }
    }
}

/// A field as described in text, possibly merged with its diagram cell.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Field {
    pub name: String,
    pub abbrev: Option<String>,
    /// Width in bits. Diagram width takes precedence over a width stated in text.
    pub width: Option<u32>,
    pub description: String,
    pub constraints: Vec<Constraint>,
    pub attributes: Attributes,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Field {
            name: name.into(),
            ..Field::default()
        }
    }

    /// Merge text-derived details into this (diagram-derived) field.
    ///
    /// Width already set here wins; the first non-empty description wins;
    /// constraints are appended without duplicates.
    pub fn merge(mut self, text: Field) -> Field {
        if self.width.is_none() {
            self.width = text.width;
        }
        if self.abbrev.is_none() {
            self.abbrev = text.abbrev;
        }
        if self.description.is_empty() {
            self.description = text.description;
        }
        for c in text.constraints {
            if !self.constraints.contains(&c) {
                self.constraints.push(c);
            }
        }
        self.attributes.extend(text.attributes);
        self
    }

    /// Constraint expressions over this field's value.
    pub fn to_expressions(&self) -> Vec<Expression> {
        self.constraints
            .iter()
            .map(|c| c.to_expression(&self.name))
            .collect()
    }
}

/// Semantic constraint on a field value stated in its description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Constraint {
    Equals(Literal),
    Range { min: i64, max: i64 },
    OneOf(Vec<Literal>),
}

impl Constraint {
    pub fn to_expression(&self, field: &str) -> Expression {
        let access = || Expression::FieldAccess(field.to_string());
        match self {
            Constraint::Equals(v) => {
                Expression::binary(BinOp::Eq, access(), Expression::Constant(v.clone()))
            }
            Constraint::Range { min, max } => Expression::binary(
                BinOp::And,
                Expression::binary(BinOp::Ge, access(), Expression::Constant(Literal::Int(*min))),
                Expression::binary(BinOp::Le, access(), Expression::Constant(Literal::Int(*max))),
            ),
            Constraint::OneOf(values) => values
                .iter()
                .map(|v| Expression::binary(BinOp::Eq, access(), Expression::Constant(v.clone())))
                .reduce(|lhs, rhs| Expression::binary(BinOp::Or, lhs, rhs))
                .unwrap_or(Expression::Constant(Literal::Bool(false))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Literal {
    Int(i64),
    Bool(bool),
    Hex(u64),
    String(String),
}

impl Literal {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Literal::Int(i) => Some(*i),
            Literal::Hex(h) => (*h).try_into().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(i) => write!(f, "{}", i),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Hex(h) => write!(f, "0x{:X}", h),
            Literal::String(s) => write!(f, "{:?}", s),
        }
    }
}

/// Attributes from a field title (`; control`, `; key=value`), in title order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Attributes(Vec<(String, Option<String>)>);

impl Attributes {
    pub fn insert(&mut self, key: impl Into<String>, value: Option<String>) {
        let key = key.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    /// Flag check: present without a value, or with a true-ish value.
    pub fn is_set(&self, key: &str) -> bool {
        match self.0.iter().find(|(k, _)| k == key) {
            Some((_, None)) => true,
            Some((_, Some(v))) => matches!(v.as_str(), "true" | "yes" | "1"),
            None => false,
        }
    }

    pub fn extend(&mut self, other: Attributes) {
        for (k, v) in other.0 {
            self.insert(k, v);
        }
    }
}

/// Directive to insert a synthetic field relative to an anchor field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelLoc {
    pub anchor: String,
    /// Insert position relative to the anchor's index (`+1` = directly after it).
    pub offset: i64,
    pub name: String,
    pub value: Literal,
    /// Section number the directive points to, if it cites one.
    pub section: Option<String>,
}

/// Synthetic field produced by applying a [`RelLoc`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldRef {
    pub name: String,
    pub value: Literal,
    pub section: Option<String>,
}

impl From<&RelLoc> for FieldRef {
    fn from(r: &RelLoc) -> Self {
        FieldRef {
            name: r.name.clone(),
            value: r.value.clone(),
            section: r.section.clone(),
        }
    }
}

/// Element of a reconciled field list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Entry {
    Field(Field),
    Ref(FieldRef),
}

impl Entry {
    pub fn name(&self) -> &str {
        match self {
            Entry::Field(f) => &f.name,
            Entry::Ref(r) => &r.name,
        }
    }

    pub fn as_field(&self) -> Option<&Field> {
        match self {
            Entry::Field(f) => Some(f),
            Entry::Ref(_) => None,
        }
    }
}

/// Reconciled fields of one diagram, named after the section it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionStruct {
    pub name: String,
    pub section: SectionRef,
    pub entries: Vec<Entry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_diagram_width() {
        let art = ArtField::new("Version", 4).to_field();
        let mut text = Field::new("Version");
        text.width = Some(8);
        text.description = "protocol version".into();
        let merged = art.merge(text);
        assert_eq!(merged.width, Some(4));
        assert_eq!(merged.description, "protocol version");
    }

    #[test]
    fn merge_dedups_constraints() {
        let mut a = Field::new("Reserved");
        a.constraints.push(Constraint::Equals(Literal::Int(0)));
        let b = a.clone();
        let merged = a.merge(b);
        assert_eq!(merged.constraints.len(), 1);
    }

    #[test]
    fn one_of_expression_is_disjunction() {
        let c = Constraint::OneOf(vec![Literal::Int(4), Literal::Int(6)]);
        match c.to_expression("Version") {
            Expression::Binary { op: BinOp::Or, .. } => {}
            other => panic!("expected disjunction, got {:?}", other),
        }
    }

    #[test]
    fn attribute_flags() {
        let mut attrs = Attributes::default();
        attrs.insert("control", None);
        attrs.insert("encoding", Some("be".into()));
        assert!(attrs.is_set("control"));
        assert!(!attrs.is_set("encoding"));
        assert_eq!(attrs.get("encoding"), Some("be"));
    }
}
