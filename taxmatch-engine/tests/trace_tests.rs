//! Shape of the structured trace attached to matches

mod helpers;

use helpers::{build_matcher_with, query, reference_corpus};
use serde_json::json;
use taxmatch_engine::{TraceLevel, TraceNode};

/// Labels and keys only, indented by depth
fn skeleton(node: &TraceNode) -> String {
    fn walk(node: &TraceNode, depth: usize, out: &mut String) {
        let keys: Vec<&str> = node.values.iter().map(|e| e.key.as_str()).collect();
        out.push_str(&format!("{}{} [{}]\n", "  ".repeat(depth), node.label, keys.join(", ")));
        for child in &node.children {
            walk(child, depth + 1, out);
        }
    }
    let mut out = String::new();
    walk(node, 0, &mut out);
    out
}

fn traced(level: TraceLevel, pairs: &[(&str, &str)]) -> TraceNode {
    let matcher = build_matcher_with(reference_corpus(), |settings| settings.with_trace(Some(level)));
    let result = matcher.find_match(query(&matcher, pairs)).unwrap();
    result.trace().expect("trace requested").to_node()
}

#[test]
fn test_summary_trace_skeleton() {
    let root = traced(TraceLevel::Summary, &[("scientificName", "Acacia dealbata")]);

    let expected = "\
trace []
  match [name, valid, matched, probability, fidelity, issues]
    candidate [id]
      inference [signature, prior, evidenceMass, posterior]
";
    assert_eq!(skeleton(&root), expected);

    let matched = root.child("match").unwrap();
    assert_eq!(matched.value("name").unwrap(), "Acacia dealbata");
    assert_eq!(matched.value("matched").unwrap(), "s1");
    assert_eq!(matched.value("valid").unwrap(), true);
}

#[test]
fn test_info_trace_records_relaxation() {
    let root = traced(
        TraceLevel::Info,
        &[("scientificName", "Acacia dealbata"), ("taxonRank", "genus")],
    );
    let matched = root.child("match").unwrap();

    let relaxation = matched.child("relaxation").expect("relaxation node");
    assert_eq!(relaxation.value("removed").unwrap(), "taxonRank");
    assert_eq!(relaxation.value("kept").unwrap(), true);
    assert!(relaxation.child("candidate").is_some());
    assert!(relaxation.child("disambiguation").is_some());

    let disambiguation = matched.child("disambiguation").unwrap();
    assert_eq!(disambiguation.value("outcome").unwrap(), "resolved");

    // per-observable messages appear from Info upward
    let inference = matched
        .child("candidate")
        .and_then(|c| c.child("inference"))
        .unwrap();
    let rank = inference.child("taxonRank").expect("taxonRank message");
    assert!(rank.value("c").is_some());
    assert!(rank.value("p").is_none());
}

#[test]
fn test_trace_level_gates_detail() {
    let debug = traced(TraceLevel::Debug, &[("scientificName", "Acacia dealbata")]);
    let inference = debug
        .child("match")
        .and_then(|m| m.child("candidate"))
        .and_then(|c| c.child("inference"))
        .unwrap();
    let name = inference.child("scientificName").unwrap();
    assert_eq!(name.value("parent").unwrap(), "soundexScientificName");
    assert_eq!(name.value("evidence").unwrap(), "matches");
    assert!(name.value("formula").is_none());

    let full = traced(TraceLevel::Trace, &[("scientificName", "Acacia dealbata")]);
    let inference = full
        .child("match")
        .and_then(|m| m.child("candidate"))
        .and_then(|c| c.child("inference"))
        .unwrap();
    assert!(inference.child("scientificName").unwrap().value("formula").is_some());
}

#[test]
fn test_identifier_trace() {
    let root = traced(TraceLevel::Summary, &[("taxonId", "sy1")]);
    let identifier = root
        .child("match")
        .and_then(|m| m.child("identifier"))
        .expect("identifier node");
    assert_eq!(identifier.value("id").unwrap(), "sy1");
    assert_eq!(identifier.value("accepted").unwrap(), "s1");
}

#[test]
fn test_identifier_trace_golden_json() {
    let root = traced(TraceLevel::Summary, &[("taxonId", "s1")]);

    let expected = json!({
        "label": "trace",
        "children": [{
            "label": "match",
            "values": [
                { "key": "valid", "value": true },
                { "key": "matched", "value": "s1" },
                { "key": "probability", "value": 1.0 },
                { "key": "fidelity", "value": 1.0 },
                { "key": "issues", "value": [] }
            ],
            "children": [{
                "label": "identifier",
                "values": [
                    { "key": "id", "value": "s1" },
                    { "key": "accepted", "value": "s1" }
                ]
            }]
        }]
    });
    assert_eq!(serde_json::to_value(&root).unwrap(), expected);
}

#[test]
fn test_no_trace_by_default() {
    let matcher = helpers::build_matcher(reference_corpus());
    let result = matcher
        .find_match(query(&matcher, &[("scientificName", "Acacia dealbata")]))
        .unwrap();
    assert!(result.trace().is_none());
}
