//! Extract a protocol model from a document tree in JSON form.
//!
//! Usage:
//!   extract_protocol [OPTIONS] FILE.json
//!
//! Options:
//!   --strict, -s   Fail on the first section that does not reconcile (default: skip it)
//!   --summary, -S  Print a text summary instead of the protocol as JSON
//!
//! Skipped sections and dropped refs are reported on stderr. Exit code 1 on failure.

use diagramproto::{
    Document, ExtractOptions, Extraction, Extractor, PestTokenizer, Protocol, SectionPolicy,
};
use std::io::Write;

fn print_summary(protocol: &Protocol) -> std::io::Result<()> {
    let mut out = std::io::stdout().lock();
    writeln!(out, "protocol {}", protocol.name)?;
    for t in &protocol.types {
        writeln!(out, "  type {} ({} bits)", t.name, t.width)?;
    }
    for s in &protocol.structs {
        writeln!(out, "  struct {} {{", s.name)?;
        for f in &s.fields {
            let ty = protocol
                .field_type(f)
                .map(|t| t.name.as_str())
                .unwrap_or("?");
            writeln!(out, "    {}: {}", f.name, ty)?;
        }
        if !s.constraints.is_empty() {
            writeln!(out, "    // {} constraint(s)", s.constraints.len())?;
        }
        writeln!(out, "  }}")?;
    }
    Ok(())
}

fn report(extraction: &Extraction) {
    for s in &extraction.skipped {
        eprintln!("skipped section {}: {}", s.section, s.error);
    }
    for (section, r) in &extraction.dropped_refs {
        eprintln!(
            "section {}: dropped {:?} (anchor {:?} not in diagram)",
            section, r.name, r.anchor
        );
    }
}

fn main() -> anyhow::Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let strict = if let Some(pos) = args.iter().position(|a| a == "--strict" || a == "-s") {
        args.remove(pos);
        true
    } else {
        false
    };
    let summary = if let Some(pos) = args.iter().position(|a| a == "--summary" || a == "-S") {
        args.remove(pos);
        true
    } else {
        false
    };
    let path = match args.as_slice() {
        [path] => path,
        _ => {
            eprintln!("usage: extract_protocol [--strict] [--summary] FILE.json");
            std::process::exit(1);
        }
    };

    let document = Document::load_json(path)?;
    let options = ExtractOptions {
        on_section_error: if strict {
            SectionPolicy::Fail
        } else {
            SectionPolicy::Skip
        },
    };
    let extraction = match Extractor::new(PestTokenizer, options).extract(&document) {
        Ok(x) => x,
        Err(e) => {
            eprintln!("{}: {}", path, e);
            std::process::exit(1);
        }
    };
    report(&extraction);

    if summary {
        print_summary(&extraction.protocol)?;
    } else {
        let json = serde_json::to_string_pretty(&extraction.protocol)?;
        println!("{}", json);
    }
    Ok(())
}
