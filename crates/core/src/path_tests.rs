// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parses_plain_concrete_path() {
    let p = parse("Device.LocalAgent.MTP.1.Enable").unwrap();
    assert_eq!(
        p.segments,
        vec![
            Segment::Name("Device".into()),
            Segment::Name("LocalAgent".into()),
            Segment::Name("MTP".into()),
            Segment::Instance(1),
            Segment::Name("Enable".into()),
        ]
    );
    assert!(!p.has_wildcards());
    assert!(!p.trailing_dot);
}

#[test]
fn parses_object_path_trailing_dot() {
    let p = parse("Device.LocalAgent.MTP.").unwrap();
    assert!(p.trailing_dot);
    assert_eq!(p.to_canonical(), "Device.LocalAgent.MTP.");
}

#[test]
fn parses_wildcard_segment() {
    let p = parse("Device.LocalAgent.MTP.*.Status").unwrap();
    assert!(p.has_wildcards());
    assert!(p.segments.contains(&Segment::Wildcard));
}

#[test]
fn parses_simple_filter() {
    let p = parse("Device.X.[Enable==true].Name").unwrap();
    match &p.segments[1] {
        Segment::Filter { expr, ordered } => {
            assert!(!ordered);
            assert_eq!(expr.clauses.len(), 1);
            assert_eq!(expr.clauses[0].name, "Enable");
            assert_eq!(expr.clauses[0].op, FilterOp::Eq);
            assert_eq!(expr.clauses[0].literal, "true");
        }
        other => panic!("expected filter segment, got {other:?}"),
    }
}

#[test]
fn parses_compound_ordered_filter() {
    let p = parse("Device.X.[+Enable==true && Port>1000].Name").unwrap();
    match &p.segments[1] {
        Segment::Filter { expr, ordered } => {
            assert!(ordered);
            assert_eq!(expr.clauses.len(), 2);
            assert_eq!(expr.clauses[1].op, FilterOp::Gt);
        }
        other => panic!("expected filter segment, got {other:?}"),
    }
}

#[test]
fn parses_reference_segment() {
    let p = parse("Device.X.Ref#.Name").unwrap();
    assert!(p.segments.contains(&Segment::Reference("Ref".into())));
}

#[test]
fn rejects_empty_path() {
    assert_eq!(parse(""), Err(PathParseError::Empty));
}

#[test]
fn rejects_unterminated_filter() {
    assert_eq!(parse("Device.X.[Enable==true"), Err(PathParseError::UnterminatedFilter));
}

#[test]
fn rejects_too_long_path() {
    let long = "A.".repeat(MAX_DM_PATH);
    assert_eq!(parse(&long), Err(PathParseError::TooLong));
}

#[test]
fn rejects_malformed_filter_clause() {
    assert!(matches!(parse("Device.X.[Enable].Name"), Err(PathParseError::BadFilterClause(_))));
}

#[test]
fn display_round_trips_plain_path() {
    let s = "Device.LocalAgent.MTP.1.Enable";
    assert_eq!(parse(s).unwrap().to_string(), s);
}

#[test]
fn resolution_is_idempotent_on_parse() {
    // Parsing twice back-to-back without state change yields identical output
    // (the syntactic half of the Path resolution soundness property; the
    // semantic half lives in uspa-engine::resolver's tests).
    let s = "Device.X.*.[Enable==true].Name";
    assert_eq!(parse(s).unwrap(), parse(s).unwrap());
}
