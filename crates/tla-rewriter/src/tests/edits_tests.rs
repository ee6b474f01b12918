use crate::edits::*;
use tla_common::ByteSpan;
use tla_common::source_map::vlq;

/// Absolute `[generated_column, source, original_line, original_column]`
/// segments per generated line.
fn decode_mappings(mappings: &str) -> Vec<Vec<[i32; 4]>> {
    let mut lines = Vec::new();
    let (mut source, mut line, mut column) = (0, 0, 0);
    for text in mappings.split(';') {
        let mut segments = Vec::new();
        let mut generated = 0;
        for segment in text.split(',').filter(|s| !s.is_empty()) {
            let mut rest = segment;
            let mut fields = Vec::new();
            while !rest.is_empty() {
                let (value, used) = vlq::decode(rest).expect("valid vlq");
                fields.push(value);
                rest = &rest[used..];
            }
            generated += fields[0];
            source += fields[1];
            line += fields[2];
            column += fields[3];
            segments.push([generated, source, line, column]);
        }
        lines.push(segments);
    }
    lines
}

#[test]
fn test_push_rejects_overlap() {
    let mut edits = EditList::new();
    assert!(edits.push(ByteSpan::new(0, 5), "a".into()));
    assert!(!edits.push(ByteSpan::new(3, 8), "b".into()));
    assert!(!edits.push(ByteSpan::new(0, 5), "c".into()));
    assert!(edits.push(ByteSpan::new(5, 8), "d".into()));
    assert_eq!(edits.len(), 2);
}

#[test]
fn test_push_keeps_offset_order() {
    let mut edits = EditList::new();
    assert!(edits.push(ByteSpan::new(10, 12), "late".into()));
    assert!(edits.push(ByteSpan::new(0, 2), "early".into()));
    let (code, _) = edits.apply("abcdefghijklmn", "m.js");
    assert_eq!(code, "earlycdefghijlatemn");
}

#[test]
fn test_covers() {
    let mut edits = EditList::new();
    assert!(edits.push(ByteSpan::new(3, 11), String::new()));
    assert!(!edits.covers(2));
    assert!(edits.covers(3));
    assert!(edits.covers(10));
    assert!(!edits.covers(11));
}

#[test]
fn test_apply_replaces_statement() {
    let source = "let a = 1;\nawait x;\nlog(a);";
    let start = source.find("await").unwrap() as u32;
    let mut edits = EditList::new();
    assert!(edits.push(ByteSpan::new(start, start + 8), "Y;".into()));
    let (code, _) = edits.apply(source, "m.js");
    assert_eq!(code, "let a = 1;\nY;\nlog(a);");
}

#[test]
fn test_apply_without_edits_copies_source() {
    let edits = EditList::new();
    let (code, map) = edits.apply("a;\nb;", "m.js");
    assert_eq!(code, "a;\nb;");
    assert_eq!(map.mappings, "AAAA;AACA");
}

#[test]
fn test_apply_maps_copied_and_replaced_lines() {
    let source = "a;\nawait x;\nb;";
    let mut edits = EditList::new();
    assert!(edits.push(ByteSpan::new(3, 11), "r1;\nr2;".into()));

    let (code, map) = edits.apply(source, "mod.js");
    assert_eq!(code, "a;\nr1;\nr2;\nb;");
    assert_eq!(map.version, 3);
    assert_eq!(map.file, "mod.js");
    assert_eq!(map.sources, vec!["mod.js".to_string()]);
    assert_eq!(map.sources_content, vec![Some(source.to_string())]);
    assert_eq!(map.mappings, "AAAA;AACA;AAAA,GAAQ;AACR");

    let lines = decode_mappings(&map.mappings);
    assert_eq!(lines[0], vec![[0, 0, 0, 0]]);
    // Both replacement lines point at the replaced statement
    assert_eq!(lines[1], vec![[0, 0, 1, 0]]);
    assert_eq!(lines[2], vec![[0, 0, 1, 0], [3, 0, 1, 8]]);
    assert_eq!(lines[3], vec![[0, 0, 2, 0]]);
}

#[test]
fn test_apply_uses_utf16_columns() {
    let source = "const é = 1; await x;";
    let start = source.find("await").unwrap() as u32;
    let mut edits = EditList::new();
    assert!(edits.push(ByteSpan::new(start, source.len() as u32), "z;".into()));

    let (code, map) = edits.apply(source, "u.js");
    assert_eq!(code, "const é = 1; z;");
    let lines = decode_mappings(&map.mappings);
    assert_eq!(lines[0], vec![[0, 0, 0, 0], [13, 0, 0, 13]]);
}

#[test]
fn test_apply_handles_crlf() {
    let source = "a;\r\nawait x;\r\nb;";
    let start = source.find("await").unwrap() as u32;
    let mut edits = EditList::new();
    assert!(edits.push(ByteSpan::new(start, start + 8), "r;".into()));

    let (code, map) = edits.apply(source, "crlf.js");
    assert_eq!(code, "a;\r\nr;\r\nb;");
    let lines = decode_mappings(&map.mappings);
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[1][0], [0, 0, 1, 0]);
    assert_eq!(lines[2][0], [0, 0, 2, 0]);
}
