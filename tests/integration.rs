//! Integration tests: whole sections and documents through the default tokenizer,
//! from zone classification to the assembled protocol.

use diagramproto::ast::Constraint;
use diagramproto::{
    classify, collect_structs, extract_section, Document, Entry, ExtractError, ExtractOptions,
    Extractor, Literal, Node, PestTokenizer, SectionPolicy, Section, ZoneIndices,
};
use std::io::Write;

const TCP_ART: &str = r#"
 0                   1                   2                   3
 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
|          Source Port          |       Destination Port        |
+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
|  Data |           |U|A|P|R|S|F|                               |
| Offset| Reserved  |R|C|S|S|Y|I|            Window             |
|       |           |G|K|H|T|N|N|                               |
+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
"#;

const VERSION_ART: &str = r#"
 0 1 2 3 4 5 6 7
+-+-+-+-+-+-+-+-+
|Version| Flags |
+-+-+-+-+-+-+-+-+
"#;

fn para(s: &str) -> Node {
    Node::Paragraph(vec![Node::Text(s.to_string())])
}

fn body(items: &[&str]) -> Node {
    Node::Paragraph(vec![Node::List(items.iter().map(|s| para(s)).collect())])
}

fn fig(art: &str) -> Node {
    Node::Figure(vec![Node::Artwork(art.to_string())])
}

fn tcp_section() -> Section {
    Section::new(
        "TCP Header Format",
        vec![
            para("TCP segments are sent as internet datagrams."),
            fig(TCP_ART),
            para("where:"),
            para("Source Port (SP): 16 bits"),
            body(&["The source port number."]),
            para("Destination Port: 16 bits"),
            body(&["The destination port number."]),
            para("Data Offset: 4 bits"),
            body(&[
                "The number of 32 bit words in the TCP Header.",
                "This field MUST be between 5 and 15.",
            ]),
            para("Reserved: 6 bits"),
            body(&["Reserved for future use. This field MUST be set to zero."]),
            para("Control Bits: 6 bits; control"),
            body(&[
                "URG: Urgent Pointer field significant\n\
                 ACK: Acknowledgment field significant\n\
                 PSH: Push Function\n\
                 RST: Reset the connection\n\
                 SYN: Synchronize sequence numbers\n\
                 FIN: No more data from sender",
            ]),
            para("Window: 16 bits"),
            body(&[
                "The number of data octets the sender is willing to accept. \
                 Insert \"Window Marker\" with value 0x1 after \"Window\" (see Section 3.1).",
            ]),
        ],
    )
    .with_number("3.1")
}

#[test]
fn tcp_section_zones() {
    let z = classify(&tcp_section()).expect("classify");
    assert_eq!(
        z,
        ZoneIndices {
            preamble: 1,
            diagrams: 1,
            paired: 1,
            trailing: 12,
            remainder: 0,
        }
    );
}

#[test]
fn tcp_section_reconciles() {
    let out = extract_section(&tcp_section(), &PestTokenizer).expect("extract");
    assert_eq!(out.structs.len(), 1);
    assert!(out.dropped_refs.is_empty());
    let s = &out.structs[0];
    assert_eq!(s.name, "TCP_Header_Format");
    let names: Vec<_> = s.entries.iter().map(Entry::name).collect();
    assert_eq!(
        names,
        [
            "Source_Port",
            "Destination_Port",
            "Data_Offset",
            "Reserved",
            "URG",
            "ACK",
            "PSH",
            "RST",
            "SYN",
            "FIN",
            "Window",
            "Window_Marker",
        ]
    );

    let field = |i: usize| s.entries[i].as_field().expect("field");
    assert_eq!(field(0).width, Some(16));
    assert_eq!(field(0).abbrev.as_deref(), Some("SP"));
    assert_eq!(field(2).width, Some(4));
    assert_eq!(field(2).constraints, [Constraint::Range { min: 5, max: 15 }]);
    assert_eq!(field(3).constraints, [Constraint::Equals(Literal::Int(0))]);
    assert_eq!(field(4).width, Some(1));
    assert_eq!(field(4).description, "Urgent Pointer field significant");
    match &s.entries[11] {
        Entry::Ref(r) => {
            assert_eq!(r.value, Literal::Hex(1));
            assert_eq!(r.section.as_deref(), Some("3.1"));
        }
        other => panic!("expected ref, got {:?}", other),
    }
}

#[test]
fn version_flags_scenario() {
    let section = Section::new(
        "Header",
        vec![
            para("The header is one octet."),
            fig(VERSION_ART),
            para("Version: 4 bits"),
            body(&["protocol version"]),
        ],
    );
    let z = classify(&section).expect("classify");
    assert_eq!((z.preamble, z.diagrams, z.paired, z.trailing, z.remainder), (1, 1, 0, 2, 0));

    let out = extract_section(&section, &PestTokenizer).expect("extract");
    let fields: Vec<_> = out.structs[0]
        .entries
        .iter()
        .map(|e| e.as_field().expect("field"))
        .map(|f| (f.name.as_str(), f.width, f.description.as_str()))
        .collect();
    assert_eq!(
        fields,
        [("Version", Some(4), "protocol version"), ("Flags", Some(4), "")]
    );
}

#[test]
fn text_field_missing_from_diagram() {
    let section = Section::new(
        "Header",
        vec![fig(VERSION_ART), para("Length: 8 bits"), body(&["payload length"])],
    );
    match extract_section(&section, &PestTokenizer) {
        Err(ExtractError::UnknownField { field, .. }) => assert_eq!(field, "Length"),
        other => panic!("expected UnknownField, got {:?}", other),
    }
}

const AB_ART: &str = "+-+-+-+-+-+-+-+-+\n|   A   |   B   |\n+-+-+-+-+-+-+-+-+";

#[test]
fn huge_insert_count_is_out_of_range() {
    let section = Section::new(
        "Header",
        vec![
            fig(AB_ART),
            para("A: 4 bits"),
            body(&["Insert \"M\" with value 1 9223372036854775807 fields after \"B\"."]),
        ],
    );
    match extract_section(&section, &PestTokenizer) {
        Err(ExtractError::RefOutOfRange { anchor, offset, .. }) => {
            assert_eq!(anchor, "B");
            assert_eq!(offset, i64::MAX);
        }
        other => panic!("expected RefOutOfRange, got {:?}", other),
    }
}

#[test]
fn punctuation_cell_label_is_rejected() {
    let art = "+-+-+-+-+-+-+-+-+\n|   -   |   B   |\n+-+-+-+-+-+-+-+-+";
    let section = Section::new("Header", vec![fig(art)]);
    match extract_section(&section, &PestTokenizer) {
        Err(e @ ExtractError::UnnamedField { .. }) => assert!(e.is_section_scoped()),
        other => panic!("expected UnnamedField, got {:?}", other),
    }
}

fn tcp_document() -> Document {
    let mut broken = Section::new(
        "Options",
        vec![fig(VERSION_ART), para("Kinds:"), Node::List(vec![para("none")])],
    );
    broken.number = Some("3.2".into());
    Document {
        title: "Transmission Control Protocol".into(),
        sections: vec![
            Section::new("Introduction", vec![para("This document describes TCP.")]),
            Section::new(
                "Functional Specification",
                vec![
                    para("Overview."),
                    Node::Section(tcp_section()),
                    Node::Section(broken),
                ],
            ),
        ],
    }
}

#[test]
fn document_skips_broken_section() {
    let extractor = Extractor::new(PestTokenizer, ExtractOptions::default());
    let x = extractor.extract(&tcp_document()).expect("extract");
    assert_eq!(x.protocol.name, "Transmission_Control_Protocol");
    assert_eq!(x.protocol.structs.len(), 1);
    assert_eq!(x.skipped.len(), 1);
    assert_eq!(x.skipped[0].section.title, "Options");
    assert!(matches!(x.skipped[0].error, ExtractError::StructureMismatch { position: 2, .. }));

    let tcp = x.protocol.get_struct("TCP_Header_Format").expect("struct");
    // ref entries are not struct fields
    assert_eq!(tcp.fields.len(), 11);
    assert_eq!(tcp.constraints.len(), 2);
    // widths 16, 4, 6, 1
    assert_eq!(x.protocol.types.len(), 4);
    let window = tcp.fields.last().expect("window");
    let src = &tcp.fields[0];
    assert_eq!(window.ty, src.ty);
    assert_eq!(x.protocol.field_type(window).map(|t| t.width), Some(16));
}

#[test]
fn document_strict_policy_fails() {
    let extractor = Extractor::new(
        PestTokenizer,
        ExtractOptions {
            on_section_error: SectionPolicy::Fail,
        },
    );
    match extractor.extract(&tcp_document()) {
        Err(e @ ExtractError::StructureMismatch { .. }) => assert!(e.is_section_scoped()),
        other => panic!("expected StructureMismatch, got {:?}", other),
    }
}

#[test]
fn duplicate_header_sections_yield_no_protocol() {
    let header = || {
        Section::new(
            "Header",
            vec![fig(VERSION_ART), para("Version: 4 bits"), body(&["v"])],
        )
    };
    let doc = Document {
        title: "Dup".into(),
        sections: vec![header(), header()],
    };
    let structs = collect_structs(&doc, &PestTokenizer, SectionPolicy::Fail).expect("collect");
    assert_eq!(structs.get("Header").map(<[_]>::len), Some(2));
    let extractor = Extractor::new(PestTokenizer, ExtractOptions::default());
    match extractor.extract(&doc) {
        Err(ExtractError::DuplicateStructDefinition { name, sections }) => {
            assert_eq!(name, "Header");
            assert_eq!(sections.len(), 2);
        }
        other => panic!("expected DuplicateStructDefinition, got {:?}", other),
    }
}

#[test]
fn unanchored_ref_is_reported() {
    let section = Section::new(
        "Header",
        vec![
            fig(VERSION_ART),
            para("Version: 4 bits"),
            body(&["Insert \"Pad\" with value 0 after \"Checksum\"."]),
        ],
    );
    let doc = Document {
        title: "P".into(),
        sections: vec![section],
    };
    let x = Extractor::new(PestTokenizer, ExtractOptions::default())
        .extract(&doc)
        .expect("extract");
    assert_eq!(x.dropped_refs.len(), 1);
    assert_eq!(x.dropped_refs[0].1.anchor, "Checksum");
    assert_eq!(x.protocol.get_struct("Header").map(|s| s.fields.len()), Some(2));
}

#[test]
fn load_document_from_json_file() {
    let doc = tcp_document();
    let json = serde_json::to_string(&doc).expect("serialize");
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    file.write_all(json.as_bytes()).expect("write");

    let loaded = Document::load_json(file.path()).expect("load");
    assert_eq!(loaded, doc);
    let x = Extractor::new(PestTokenizer, ExtractOptions::default())
        .extract(&loaded)
        .expect("extract");
    assert!(x.protocol.get_struct("TCP_Header_Format").is_some());
}

#[test]
fn protocol_serializes() {
    let x = Extractor::new(PestTokenizer, ExtractOptions::default())
        .extract(&tcp_document())
        .expect("extract");
    let value = serde_json::to_value(&x.protocol).expect("json");
    assert_eq!(value["name"], "Transmission_Control_Protocol");
    assert_eq!(value["types"][0]["name"], "BitString$16");
    assert_eq!(value["structs"][0]["fields"][0]["name"], "Source_Port");
}
