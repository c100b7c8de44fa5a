//! Integration tests for the complete Aggregraph pipeline
//!
//! These tests verify end-to-end functionality across crates:
//! - JSON member tree on disk → `SchemaDocument`
//! - `SchemaDocument` → resolved graph (keys, refs, navigation)
//! - resolved graph → renderers claiming output paths concurrently
//!
//! Run with: cargo test --test integration_tests

use std::sync::Arc;
use std::thread;

use aggregraph_core::{
    compile, compile_best_effort, render_dot, render_mermaid, DeleteBehavior, EdgeKind,
    Multiplicity, OutputPathError, OutputPathRegistry, ResolveOptions, SchemaErrorKind,
};
use aggregraph_schema::SchemaDocument;
use tempfile::tempdir;

const LIBRARY: &str = r#"{
  "application_name": "Library",
  "enums": [
    { "name": "Format", "items": [ { "name": "Hardcover" }, { "name": "Paperback" }, { "name": "Ebook", "value": 10 } ] }
  ],
  "shapes": [
    { "name": "Address", "members": [
      { "name": "Street", "kind": "word" },
      { "name": "City", "kind": "word", "is_display_name": true }
    ] }
  ],
  "aggregates": [
    { "name": "Loan", "members": [
      { "name": "LoanNo", "kind": "integer", "is_key": true },
      { "name": "copy", "kind": "ref", "ref_to": "ref-to:Book/Copies", "is_required": true },
      { "name": "member", "kind": "ref", "ref_to": "Member" }
    ] },
    { "name": "Book", "members": [
      { "name": "Isbn", "kind": "word", "is_key": true },
      { "name": "Title", "kind": "sentence", "is_display_name": true },
      { "name": "Copies", "kind": "children", "members": [
        { "name": "Format", "kind": "Format" },
        { "name": "Condition", "kind": "variation", "cases": [
          { "name": "Good", "discriminator": 0, "members": [] },
          { "name": "Damaged", "discriminator": 1, "members": [
            { "name": "Note", "kind": "sentence" }
          ] }
        ] }
      ] }
    ] },
    { "name": "Member", "members": [
      { "name": "MemberId", "kind": "uuid", "is_key": true },
      { "name": "Home", "kind": "child", "shape": "Address" },
      { "name": "Work", "kind": "child", "shape": "Address" }
    ] }
  ]
}"#;

fn load_library() -> SchemaDocument {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("library.json");
    std::fs::write(&path, LIBRARY).expect("write schema");
    SchemaDocument::from_json_file(&path).expect("load schema")
}

#[test]
fn test_library_schema_resolves_end_to_end() {
    let doc = load_library();
    let graph = compile(&doc, &ResolveOptions::default()).expect("compile");

    let loan = graph.find_by_path("Loan").expect("loan");
    let copies = graph.find_by_path("Book/Copies").expect("copies");
    let damaged = graph.find_by_path("Book/Copies/Damaged").expect("damaged");

    // Collection rows without keys get a surrogate; variation cases share it.
    assert_eq!(
        graph.key_column_names(copies),
        vec!["Book_Isbn", "__surrogate_id"]
    );
    assert_eq!(graph.primary_key(damaged), graph.primary_key(copies));

    // Ref to a collection row imports the full composite key.
    let to_copy = graph
        .navigation_edges(loan)
        .into_iter()
        .find(|e| e.relation == "copy")
        .expect("copy edge");
    assert_eq!(to_copy.principal.aggregate, copies);
    assert_eq!(to_copy.relevant.multiplicity, Multiplicity::Many);
    assert_eq!(to_copy.on_principal_deleted, DeleteBehavior::Restrict);
    assert!(to_copy.required);
    assert_eq!(
        to_copy.foreign_key_columns(&graph),
        vec!["copy_Book_Isbn", "copy___surrogate_id"]
    );

    let to_damaged = graph
        .navigation_edges(damaged)
        .into_iter()
        .find(|e| matches!(e.kind, EdgeKind::Variation { .. }))
        .expect("variation edge");
    assert_eq!(to_damaged.on_principal_deleted, DeleteBehavior::Cascade);

    // Enums: auto values skip explicit ones; variation group synthesized.
    let format = graph.enums().get("Format").expect("format enum");
    let values: Vec<i32> = format.items.iter().map(|i| i.value).collect();
    assert_eq!(values, vec![0, 1, 10]);
    assert!(graph.enums().get("E_Condition").is_some());

    // Each shape use is its own aggregate.
    let home = graph.find_by_path("Member/Home").expect("home");
    let work = graph.find_by_path("Member/Work").expect("work");
    assert_ne!(graph.unique_name(home), graph.unique_name(work));
}

#[test]
fn test_library_graph_serializes_and_renders() {
    let doc = load_library();
    let graph = compile(&doc, &ResolveOptions::default())
        .expect("compile")
        .into_graph();

    let json: serde_json::Value =
        serde_json::from_str(&graph.to_json_pretty().expect("json")).expect("parse json");
    assert_eq!(json["application_name"], "Library");
    assert_eq!(
        json["aggregates"].as_array().map(Vec::len),
        Some(graph.len())
    );

    let mermaid = render_mermaid(&graph);
    let dot = render_dot(&graph);
    for id in graph.ids() {
        let name = graph.unique_name(id);
        assert!(mermaid.contains(&name));
        assert!(dot.contains(&name));
    }
}

#[test]
fn test_renderers_share_the_graph_and_claim_paths_once() {
    let doc = load_library();
    let graph = Arc::new(
        compile(&doc, &ResolveOptions::default())
            .expect("compile")
            .into_graph(),
    );
    let registry = Arc::new(OutputPathRegistry::new());

    let handles: Vec<_> = ["entities", "controllers", "types"]
        .into_iter()
        .map(|renderer| {
            let graph = Arc::clone(&graph);
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for id in graph.ids() {
                    let path = format!("out/{renderer}/{}.txt", graph.unique_name(id));
                    registry.claim(&path, renderer).expect("unique path per renderer");
                }
                // Every renderer also tries the shared index file.
                registry.claim("out/index.txt", renderer)
            })
        })
        .collect();

    let results: Vec<Result<(), OutputPathError>> =
        handles.into_iter().map(|h| h.join().expect("join")).collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(registry.len(), graph.len() * 3 + 1);
}

#[test]
fn test_broken_schema_reports_all_independent_errors() {
    let mut doc = load_library();
    doc.aggregates[0].members[0].is_key = false;
    doc.aggregates[0].members[2].ref_to = Some("Members".into());
    doc.aggregates[2].members[1].shape = Some("Adress".into());

    let compilation = compile_best_effort(&doc, &ResolveOptions::default());
    assert_eq!(compilation.errors.count(SchemaErrorKind::MissingKey), 1);
    assert_eq!(compilation.errors.count(SchemaErrorKind::UnresolvedReference), 1);
    assert_eq!(compilation.errors.count(SchemaErrorKind::Structural), 1);
    assert_eq!(compilation.errors.len(), 3);

    let graph = compilation.graph.expect("partial graph");
    assert!(graph.find_by_path("Member/Home").is_none());
    assert!(graph.find_by_path("Member/Work").is_some());
}
