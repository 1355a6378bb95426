//! Document tree consumed by the extractor.
//!
//! The tree is produced by an external markup converter; this crate only reads it.
//! Nodes follow the RFC XML vocabulary: `<t>` is a [`Node::Paragraph`], `<figure>` a
//! [`Node::Figure`] wrapping a single [`Node::Artwork`], `<list>` a [`Node::List`] whose
//! items are paragraphs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// One node of a section's content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "content", rename_all = "snake_case")]
pub enum Node {
    Text(String),
    Paragraph(Vec<Node>),
    Figure(Vec<Node>),
    Artwork(String),
    List(Vec<Node>),
    Section(Section),
    /// Any element the extractor does not interpret (tables, references, ...).
    Other(String),
}

/// Variant tag of a [`Node`], used in error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Text,
    Paragraph,
    Figure,
    Artwork,
    List,
    Section,
    Other,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeKind::Text => "text",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Figure => "figure",
            NodeKind::Artwork => "artwork",
            NodeKind::List => "list",
            NodeKind::Section => "section",
            NodeKind::Other => "other",
        };
        f.write_str(s)
    }
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Text(_) => NodeKind::Text,
            Node::Paragraph(_) => NodeKind::Paragraph,
            Node::Figure(_) => NodeKind::Figure,
            Node::Artwork(_) => NodeKind::Artwork,
            Node::List(_) => NodeKind::List,
            Node::Section(_) => NodeKind::Section,
            Node::Other(_) => NodeKind::Other,
        }
    }

    /// Child nodes; leaves have none.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Paragraph(c) | Node::Figure(c) | Node::List(c) => c,
            Node::Section(s) => &s.children,
            Node::Text(_) | Node::Artwork(_) | Node::Other(_) => &[],
        }
    }

    pub fn first_child(&self) -> Option<&Node> {
        self.children().first()
    }

    /// True for a paragraph whose first child is a list (a field description body).
    pub fn is_list_paragraph(&self) -> bool {
        matches!(self, Node::Paragraph(c) if matches!(c.first(), Some(Node::List(_))))
    }

    /// Concatenated text content of this node and its descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out.trim().to_string()
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(s) | Node::Artwork(s) => out.push_str(s),
            Node::Other(_) => {}
            _ => {
                for c in self.children() {
                    c.collect_text(out);
                }
            }
        }
    }
}

/// A document subdivision.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub anchor: Option<String>,
    #[serde(default)]
    pub children: Vec<Node>,
}

impl Section {
    pub fn new(title: impl Into<String>, children: Vec<Node>) -> Self {
        Section {
            title: title.into(),
            number: None,
            anchor: None,
            children,
        }
    }

    pub fn with_number(mut self, number: impl Into<String>) -> Self {
        self.number = Some(number.into());
        self
    }

    pub fn reference(&self) -> SectionRef {
        SectionRef {
            title: self.title.clone(),
            number: self.number.clone(),
            anchor: self.anchor.clone(),
        }
    }

    /// Direct subsections.
    pub fn subsections(&self) -> impl Iterator<Item = &Section> {
        self.children.iter().filter_map(|c| match c {
            Node::Section(s) => Some(s),
            _ => None,
        })
    }

    pub fn has_figure(&self) -> bool {
        self.children.iter().any(|c| matches!(c, Node::Figure(_)))
    }
}

/// Identity of a section in error reports and assembled structs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionRef {
    pub title: String,
    pub number: Option<String>,
    pub anchor: Option<String>,
}

impl fmt::Display for SectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.number {
            Some(n) => write!(f, "{} {:?}", n, self.title),
            None => write!(f, "{:?}", self.title),
        }
    }
}

/// A whole document: front-matter title plus top-level sections.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl Document {
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn load_json(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))?;
        Self::from_json_str(&text).map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))
    }

    /// All sections, depth-first in document order.
    pub fn walk_sections(&self) -> Vec<&Section> {
        fn visit<'a>(s: &'a Section, out: &mut Vec<&'a Section>) {
            out.push(s);
            for sub in s.subsections() {
                visit(sub, out);
            }
        }
        let mut out = Vec::new();
        for s in &self.sections {
            visit(s, &mut out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_paragraph_detection() {
        let body = Node::Paragraph(vec![Node::List(vec![])]);
        let title = Node::Paragraph(vec![Node::Text("Version: 4 bits".into())]);
        assert!(body.is_list_paragraph());
        assert!(!title.is_list_paragraph());
        assert!(!Node::Paragraph(vec![]).is_list_paragraph());
    }

    #[test]
    fn walk_sections_depth_first() {
        let inner = Section::new("Inner", vec![]);
        let outer = Section::new("Outer", vec![Node::Section(inner)]);
        let doc = Document {
            title: "Doc".into(),
            sections: vec![outer, Section::new("Last", vec![])],
        };
        let titles: Vec<_> = doc.walk_sections().iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["Outer", "Inner", "Last"]);
    }

    #[test]
    fn json_tagged_nodes() {
        let src = r#"{
            "title": "Test Protocol",
            "sections": [{
                "title": "Header",
                "children": [
                    {"kind": "paragraph", "content": [{"kind": "text", "content": "Intro."}]},
                    {"kind": "figure", "content": [{"kind": "artwork", "content": "+-+"}]}
                ]
            }]
        }"#;
        let doc = Document::from_json_str(src).expect("json");
        assert_eq!(doc.sections[0].children[1].kind(), NodeKind::Figure);
        assert_eq!(doc.sections[0].children[0].text(), "Intro.");
    }
}
