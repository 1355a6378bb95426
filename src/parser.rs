//! Grammar-based [`Tokenizer`] using PEST (`grammar.pest`).

use crate::ast::*;
use crate::tokenizer::{EntryPoint, TokenizeError, Tokenizer};
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser as PestParser;

#[derive(PestParser)]
#[grammar = "grammar.pest"]
struct FieldGrammar;

/// Default tokenizer for RFC-style packet diagrams and field lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct PestTokenizer;

impl PestTokenizer {
    pub fn new() -> Self {
        PestTokenizer
    }
}

impl Tokenizer for PestTokenizer {
    fn diagram(&self, text: &str) -> Result<Vec<ArtField>, TokenizeError> {
        let pair = parse_rule(Rule::diagram, text, EntryPoint::Diagram)?;
        build_diagram(pair)
    }

    fn field_title(&self, text: &str) -> Result<(Field, Attributes), TokenizeError> {
        let text = collapse_whitespace(text);
        let pair = parse_rule(Rule::field_title, &text, EntryPoint::FieldTitle)?;
        build_field_title(pair)
    }

    fn control_fields(&self, text: &str) -> Result<Vec<Field>, TokenizeError> {
        let pair = parse_rule(Rule::control_fields, text, EntryPoint::ControlFields)?;
        build_control_fields(pair)
    }

    fn field_body(&self, field: &mut Field, text: &str) -> Result<Vec<RelLoc>, TokenizeError> {
        let pair = parse_rule(Rule::field_body, text, EntryPoint::FieldBody)?;
        let refs = build_field_body(pair, field)?;
        let description = text.trim();
        if !description.is_empty() {
            if !field.description.is_empty() {
                field.description.push('\n');
            }
            field.description.push_str(description);
        }
        Ok(refs)
    }
}

fn parse_rule(rule: Rule, text: &str, entry: EntryPoint) -> Result<Pair<'_, Rule>, TokenizeError> {
    FieldGrammar::parse(rule, text)
        .map_err(|e| TokenizeError::Syntax {
            entry,
            message: e.to_string(),
        })?
        .next()
        .ok_or_else(|| TokenizeError::Syntax {
            entry,
            message: "empty parse".to_string(),
        })
}

fn invalid(entry: EntryPoint, message: impl Into<String>) -> TokenizeError {
    TokenizeError::Invalid {
        entry,
        message: message.into(),
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ---------------------------------------------------------------------------
// Diagram

/// Consecutive rows with no border between them: one row of fields whose names
/// may be written over several lines (e.g. vertical 1-bit labels).
struct RowGroup {
    line: usize,
    /// (start column, width in chars) per cell.
    layout: Vec<(usize, usize)>,
    names: Vec<Vec<String>>,
}

impl RowGroup {
    fn new(line: usize, cells: Vec<(usize, usize, &str)>) -> Self {
        let layout = cells.iter().map(|&(col, chars, _)| (col, chars)).collect();
        let names = cells
            .into_iter()
            .map(|(_, _, text)| fragment(text).into_iter().collect())
            .collect();
        RowGroup { line, layout, names }
    }

    fn push(&mut self, line: usize, cells: Vec<(usize, usize, &str)>) -> Result<(), TokenizeError> {
        let layout: Vec<_> = cells.iter().map(|&(col, chars, _)| (col, chars)).collect();
        if layout != self.layout {
            return Err(TokenizeError::Diagram {
                line,
                message: format!("cells do not line up with the row at line {}", self.line),
            });
        }
        for (names, (_, _, text)) in self.names.iter_mut().zip(cells) {
            names.extend(fragment(text));
        }
        Ok(())
    }

    fn finish(self) -> Result<Vec<ArtField>, TokenizeError> {
        let line = self.line;
        self.layout
            .into_iter()
            .zip(self.names)
            .map(|((col, chars), names)| {
                let width = (chars as u32 + 1) / 2;
                let sep = if width == 1 { "" } else { " " };
                let name = names.join(sep);
                if name.is_empty() {
                    return Err(TokenizeError::Diagram {
                        line,
                        message: format!("unnamed field at column {}", col),
                    });
                }
                Ok(ArtField::new(name, width))
            })
            .collect()
    }
}

fn fragment(text: &str) -> Option<String> {
    let t = text.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

fn build_diagram(pair: Pair<Rule>) -> Result<Vec<ArtField>, TokenizeError> {
    let mut fields = Vec::new();
    let mut group: Option<RowGroup> = None;
    for line in pair.into_inner() {
        match line.as_rule() {
            Rule::row => {
                let (line_no, _) = line.as_span().start_pos().line_col();
                let cells: Vec<_> = line
                    .into_inner()
                    .filter(|p| p.as_rule() == Rule::cell)
                    .map(|c| {
                        let (_, col) = c.as_span().start_pos().line_col();
                        (col, c.as_str().chars().count(), c.as_str())
                    })
                    .collect();
                match group.as_mut() {
                    Some(g) => g.push(line_no, cells)?,
                    None => group = Some(RowGroup::new(line_no, cells)),
                }
            }
            Rule::border | Rule::other_line | Rule::EOI => {
                if let Some(g) = group.take() {
                    fields.extend(g.finish()?);
                }
            }
            _ => {}
        }
    }
    Ok(fields)
}

// ---------------------------------------------------------------------------
// Field title

fn build_field_title(pair: Pair<Rule>) -> Result<(Field, Attributes), TokenizeError> {
    let entry = EntryPoint::FieldTitle;
    let mut field = Field::default();
    let mut attributes = Attributes::default();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::title_name => field.name = inner.as_str().trim().to_string(),
            Rule::abbrev => {
                field.abbrev = inner
                    .into_inner()
                    .next()
                    .and_then(|p| fragment(p.as_str()));
            }
            Rule::size => field.width = Some(build_size(inner)?),
            Rule::attribute => {
                let mut it = inner.into_inner();
                let key = it.next().ok_or_else(|| invalid(entry, "attribute: key"))?;
                let value = it
                    .next()
                    .and_then(|v| fragment(v.as_str().trim_end_matches('.')));
                attributes.insert(key.as_str(), value);
            }
            _ => {}
        }
    }
    if field.name.is_empty() {
        return Err(invalid(entry, "missing field name"));
    }
    Ok((field, attributes))
}

fn build_size(pair: Pair<Rule>) -> Result<u32, TokenizeError> {
    let entry = EntryPoint::FieldTitle;
    let mut it = pair.into_inner();
    let n: u32 = it
        .next()
        .and_then(|p| p.as_str().parse().ok())
        .ok_or_else(|| invalid(entry, "size: number"))?;
    let unit = it.next().ok_or_else(|| invalid(entry, "size: unit"))?;
    let unit = unit.as_str().to_ascii_lowercase();
    if unit.starts_with("bit") {
        Ok(n)
    } else {
        n.checked_mul(8)
            .ok_or_else(|| invalid(entry, format!("size {} {} overflows", n, unit)))
    }
}

// ---------------------------------------------------------------------------
// Control-bit group

fn build_control_fields(pair: Pair<Rule>) -> Result<Vec<Field>, TokenizeError> {
    let mut fields: Vec<Field> = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::control_field => {
                let mut it = inner.into_inner();
                let name = it
                    .next()
                    .ok_or_else(|| invalid(EntryPoint::ControlFields, "control field: name"))?;
                let mut field = Field::new(name.as_str());
                field.description = it.next().map(|d| d.as_str().trim().to_string()).unwrap_or_default();
                fields.push(field);
            }
            Rule::continuation => {
                let text = inner.as_str().trim();
                let last = fields.last_mut().ok_or_else(|| {
                    invalid(EntryPoint::ControlFields, format!("text before first control field: {:?}", text))
                })?;
                if !last.description.is_empty() {
                    last.description.push(' ');
                }
                last.description.push_str(text);
            }
            _ => {}
        }
    }
    Ok(fields)
}

// ---------------------------------------------------------------------------
// Field body

fn build_field_body(pair: Pair<Rule>, field: &mut Field) -> Result<Vec<RelLoc>, TokenizeError> {
    let mut refs = Vec::new();
    for sentence in pair.into_inner() {
        if sentence.as_rule() != Rule::directive {
            continue;
        }
        let mut rel = None;
        let mut section = None;
        for part in sentence.into_inner() {
            match part.as_rule() {
                Rule::value_constraint => {
                    let c = build_constraint(part)?;
                    if !field.constraints.contains(&c) {
                        field.constraints.push(c);
                    }
                }
                Rule::rel_loc => rel = Some(build_rel_loc(part)?),
                Rule::section_ref => {
                    section = part
                        .into_inner()
                        .find(|p| p.as_rule() == Rule::section_number)
                        .map(|p| p.as_str().to_string());
                }
                _ => {}
            }
        }
        if let Some(mut r) = rel {
            r.section = section;
            refs.push(r);
        }
    }
    Ok(refs)
}

fn build_constraint(pair: Pair<Rule>) -> Result<Constraint, TokenizeError> {
    let entry = EntryPoint::FieldBody;
    let form = pair
        .into_inner()
        .next()
        .ok_or_else(|| invalid(entry, "constraint: missing value"))?;
    let rule = form.as_rule();
    let literals: Vec<Literal> = form
        .into_inner()
        .filter(|p| p.as_rule() == Rule::literal)
        .map(|p| parse_literal(p.as_str()))
        .collect();
    match rule {
        Rule::range_spec => {
            let bound = |i: usize| {
                literals
                    .get(i)
                    .and_then(Literal::as_i64)
                    .ok_or_else(|| invalid(entry, "range bounds must be integers"))
            };
            let (min, max) = (bound(0)?, bound(1)?);
            if min > max {
                return Err(invalid(entry, format!("empty range {}..{}", min, max)));
            }
            Ok(Constraint::Range { min, max })
        }
        Rule::one_of_spec => Ok(Constraint::OneOf(literals)),
        Rule::equals_spec => literals
            .into_iter()
            .next()
            .map(Constraint::Equals)
            .ok_or_else(|| invalid(entry, "constraint: missing value")),
        other => Err(invalid(entry, format!("unexpected constraint {:?}", other))),
    }
}

fn build_rel_loc(pair: Pair<Rule>) -> Result<RelLoc, TokenizeError> {
    let entry = EntryPoint::FieldBody;
    let mut names = Vec::new();
    let mut value = None;
    let mut offset = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::quoted => {
                let text = inner.into_inner().next().map(|p| p.as_str().trim()).unwrap_or("");
                names.push(text.to_string());
            }
            Rule::literal => value = Some(parse_literal(inner.as_str())),
            Rule::placement => offset = Some(build_placement(inner)?),
            _ => {}
        }
    }
    let (name, anchor) = match <[String; 2]>::try_from(names) {
        Ok([name, anchor]) if !name.is_empty() && !anchor.is_empty() => (name, anchor),
        _ => return Err(invalid(entry, "insert directive needs a field name and an anchor")),
    };
    Ok(RelLoc {
        anchor,
        offset: offset.ok_or_else(|| invalid(entry, "insert directive: placement"))?,
        name,
        value: value.ok_or_else(|| invalid(entry, "insert directive: value"))?,
        section: None,
    })
}

/// `after` → +count, `before` → 1 - count (count defaults to 1).
fn build_placement(pair: Pair<Rule>) -> Result<i64, TokenizeError> {
    let mut count = 1i64;
    let mut after = true;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::count => {
                count = inner
                    .as_str()
                    .parse()
                    .map_err(|_| invalid(EntryPoint::FieldBody, "placement: count"))?;
            }
            Rule::direction => after = inner.as_str().eq_ignore_ascii_case("after"),
            _ => {}
        }
    }
    if count == 0 {
        return Err(invalid(EntryPoint::FieldBody, "placement: count must be positive"));
    }
    Ok(if after { count } else { 1 - count })
}

fn parse_literal(s: &str) -> Literal {
    let s = s.trim();
    if s == "true" {
        return Literal::Bool(true);
    }
    if s == "false" {
        return Literal::Bool(false);
    }
    if s.eq_ignore_ascii_case("zero") {
        return Literal::Int(0);
    }
    if s.starts_with("0x") || s.starts_with("0X") {
        if let Ok(n) = u64::from_str_radix(&s[2..], 16) {
            return Literal::Hex(n);
        }
    }
    if let Ok(n) = s.parse::<i64>() {
        return Literal::Int(n);
    }
    Literal::String(s.to_string())
}
