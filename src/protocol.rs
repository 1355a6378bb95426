//! Assembled protocol model handed to downstream consumers (code generators,
//! conformance checkers). Serializable; the format is the consumer's choice.

use crate::ast::Literal;
use serde::Serialize;
use std::collections::HashMap;

/// Index of a type in [`Protocol::types`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TypeId(pub usize);

/// Opaque bit string of a fixed width. One instance per width per protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BitStringType {
    pub name: String,
    pub width: u32,
}

impl BitStringType {
    pub fn type_name(width: u32) -> String {
        format!("BitString${}", width)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expression {
    /// Value of a field of the enclosing struct.
    FieldAccess(String),
    Constant(Literal),
    Binary {
        op: BinOp,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
}

impl Expression {
    pub fn binary(op: BinOp, lhs: Expression, rhs: Expression) -> Self {
        Expression::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructField {
    pub name: String,
    pub ty: TypeId,
    pub is_present: Option<Expression>,
    pub transform: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructDef {
    pub name: String,
    pub fields: Vec<StructField>,
    pub constraints: Vec<Expression>,
    pub actions: Vec<Expression>,
}

/// Protocol: name, struct definitions, interned bit-string types.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Protocol {
    pub name: String,
    pub types: Vec<BitStringType>,
    pub structs: Vec<StructDef>,
    pub constraints: Vec<Expression>,
    pub actions: Vec<Expression>,
    #[serde(skip)]
    types_by_width: HashMap<u32, TypeId>,
    #[serde(skip)]
    structs_by_name: HashMap<String, usize>,
}

impl Protocol {
    pub fn new(name: impl Into<String>) -> Self {
        Protocol {
            name: name.into(),
            ..Protocol::default()
        }
    }

    /// The bit-string type of `width`, defining it on first use.
    pub fn intern_bitstring(&mut self, width: u32) -> TypeId {
        if let Some(&id) = self.types_by_width.get(&width) {
            return id;
        }
        let id = TypeId(self.types.len());
        self.types.push(BitStringType {
            name: BitStringType::type_name(width),
            width,
        });
        self.types_by_width.insert(width, id);
        tracing::debug!(width, type_id = id.0, "interned bit-string type");
        id
    }

    pub fn get_type(&self, id: TypeId) -> Option<&BitStringType> {
        self.types.get(id.0)
    }

    /// Define a struct. Fails if the name is already taken.
    pub fn define_struct(
        &mut self,
        name: impl Into<String>,
        fields: Vec<StructField>,
        constraints: Vec<Expression>,
        actions: Vec<Expression>,
    ) -> Result<&StructDef, String> {
        let name = name.into();
        if self.structs_by_name.contains_key(&name) {
            return Err(format!("Duplicate struct name: {}", name));
        }
        let idx = self.structs.len();
        self.structs_by_name.insert(name.clone(), idx);
        self.structs.push(StructDef {
            name,
            fields,
            constraints,
            actions,
        });
        Ok(&self.structs[idx])
    }

    pub fn get_struct(&self, name: &str) -> Option<&StructDef> {
        self.structs_by_name.get(name).map(|&i| &self.structs[i])
    }

    /// Resolved type of a struct field.
    pub fn field_type(&self, field: &StructField) -> Option<&BitStringType> {
        self.get_type(field.ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_reuses_width() {
        let mut p = Protocol::new("P");
        let a = p.intern_bitstring(8);
        let b = p.intern_bitstring(16);
        let c = p.intern_bitstring(8);
        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(p.types.len(), 2);
        assert_eq!(p.get_type(b).map(|t| t.name.as_str()), Some("BitString$16"));
    }

    #[test]
    fn define_struct_rejects_duplicate() {
        let mut p = Protocol::new("P");
        p.define_struct("Header", vec![], vec![], vec![]).expect("first");
        assert!(p.define_struct("Header", vec![], vec![], vec![]).is_err());
        assert!(p.get_struct("Header").is_some());
    }
}
