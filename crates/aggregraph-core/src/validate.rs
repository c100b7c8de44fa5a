//! Validator
//!
//! Checks that run around the resolution phases. Nothing here stops the pass
//! except an ownership cycle, which is found before any aggregate is built:
//!
//! - schema: application name present;
//! - shapes: white/gray/black DFS over the shape nesting graph;
//! - members: one name per aggregate, payload consistent with the kind tag,
//!   no key or label flags on owning members;
//! - navigation: foreign keys mirror the principal key column for column.

use std::collections::{HashMap, HashSet};

use aggregraph_schema::{KindTag, MemberDecl, RefPath, SchemaDocument, VariationCaseDecl};

use crate::error::{Diagnostics, SchemaErrorKind, SchemaLocation};
use crate::graph::AggregateGraph;
use crate::options::ResolveOptions;

pub(crate) fn application_name(
    doc: &SchemaDocument,
    options: &ResolveOptions,
    diag: &mut Diagnostics,
) {
    if options.require_application_name && doc.application_name.trim().is_empty() {
        diag.structural(SchemaLocation::Schema, "application name is empty");
    }
}

// ============================================================================
// Ownership cycles
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

fn collect_shape_uses<'a>(members: &'a [MemberDecl], out: &mut Vec<&'a str>) {
    for m in members {
        if let Some(shape) = &m.shape {
            out.push(shape);
        }
        if let Some(nested) = &m.members {
            collect_shape_uses(nested, out);
        }
        for case in m.cases.iter().flatten() {
            if let Some(shape) = &case.shape {
                out.push(shape);
            }
            if let Some(nested) = &case.members {
                collect_shape_uses(nested, out);
            }
        }
    }
}

struct CycleSearch<'a> {
    edges: HashMap<&'a str, Vec<&'a str>>,
    color: HashMap<&'a str, Color>,
    stack: Vec<&'a str>,
    cycles: Vec<Vec<&'a str>>,
}

impl<'a> CycleSearch<'a> {
    fn visit(&mut self, node: &'a str) {
        self.color.insert(node, Color::Gray);
        self.stack.push(node);
        let next: Vec<&'a str> = self.edges.get(node).cloned().unwrap_or_default();
        for target in next {
            match self.color.get(target).copied() {
                // Unknown shape; reported by the builder where it is used.
                None => {}
                Some(Color::White) => self.visit(target),
                Some(Color::Gray) => {
                    let start = self
                        .stack
                        .iter()
                        .position(|&s| s == target)
                        .unwrap_or(0);
                    let mut cycle = self.stack[start..].to_vec();
                    cycle.push(target);
                    self.cycles.push(cycle);
                }
                Some(Color::Black) => {}
            }
        }
        self.stack.pop();
        self.color.insert(node, Color::Black);
    }
}

/// Reports every shape that transitively nests itself, and every repeated
/// shape name. Returns whether any cycle was found.
pub(crate) fn ownership_cycles(doc: &SchemaDocument, diag: &mut Diagnostics) -> bool {
    let mut search = CycleSearch {
        edges: HashMap::new(),
        color: HashMap::new(),
        stack: Vec::new(),
        cycles: Vec::new(),
    };
    // The builder instantiates the first declaration of a name; later ones
    // are ignored here too.
    for shape in &doc.shapes {
        if search.edges.contains_key(shape.name.as_str()) {
            diag.structural(
                SchemaLocation::Shape {
                    name: shape.name.clone(),
                },
                format!("duplicate shape `{}`; the first declaration is used", shape.name),
            );
            continue;
        }
        let mut uses = Vec::new();
        collect_shape_uses(&shape.members, &mut uses);
        search.edges.insert(shape.name.as_str(), uses);
        search.color.insert(shape.name.as_str(), Color::White);
    }
    for shape in &doc.shapes {
        if search.color.get(shape.name.as_str()) == Some(&Color::White) {
            search.visit(&shape.name);
        }
    }

    for cycle in &search.cycles {
        diag.push(
            SchemaErrorKind::OwnershipCycle,
            SchemaLocation::Shape {
                name: cycle[0].to_string(),
            },
            format!("shape owns itself: {}", cycle.join(" -> ")),
        );
    }
    !search.cycles.is_empty()
}

// ============================================================================
// Members
// ============================================================================

/// Member and variation-case names declared so far in one aggregate.
#[derive(Debug, Default)]
pub(crate) struct MemberNamespace<'a> {
    seen: HashSet<&'a str>,
}

impl<'a> MemberNamespace<'a> {
    /// `false` if the name is blank or already taken; the error is reported.
    pub(crate) fn claim(&mut self, name: &'a str, path: &RefPath, diag: &mut Diagnostics) -> bool {
        if name.trim().is_empty() {
            diag.structural(SchemaLocation::aggregate(path), "member with an empty name");
            return false;
        }
        if !self.seen.insert(name) {
            diag.structural(
                SchemaLocation::member(path, name),
                format!("duplicate member name `{name}`"),
            );
            return false;
        }
        true
    }
}

fn nested_payload_problem(members: Option<&Vec<MemberDecl>>, shape: Option<&String>) -> Option<&'static str> {
    match (members, shape) {
        (Some(_), Some(_)) => Some("declares both inline members and a shape"),
        (None, None) => Some("declares neither inline members nor a shape"),
        _ => None,
    }
}

fn case_problems(cases: &[VariationCaseDecl]) -> Vec<String> {
    let mut problems = Vec::new();
    if cases.is_empty() {
        problems.push("variation declares no cases".to_string());
    }
    let mut discriminators = HashSet::new();
    for case in cases {
        if !discriminators.insert(case.discriminator) {
            problems.push(format!(
                "case `{}` reuses discriminator {}",
                case.name, case.discriminator
            ));
        }
        if let Some(p) = nested_payload_problem(case.members.as_ref(), case.shape.as_ref()) {
            problems.push(format!("case `{}` {p}", case.name));
        }
    }
    problems
}

/// Payload and flag consistency of one declared member against its kind tag.
/// Returns `false` when the member must be dropped.
pub(crate) fn member_is_well_formed(decl: &MemberDecl, path: &RefPath, diag: &mut Diagnostics) -> bool {
    let tag = decl.kind_tag();
    let mut problems: Vec<String> = Vec::new();

    let has_nested = decl.members.is_some() || decl.shape.is_some();
    let owning = matches!(tag, KindTag::Child | KindTag::Children | KindTag::Variation);

    if decl.ref_to.is_some() && tag != KindTag::Ref {
        problems.push(format!("`{tag}` member carries a ref path"));
    }
    if has_nested && !matches!(tag, KindTag::Child | KindTag::Children) {
        problems.push(format!("`{tag}` member carries nested members"));
    }
    if decl.cases.is_some() && tag != KindTag::Variation {
        problems.push(format!("`{tag}` member carries variation cases"));
    }
    if owning && decl.is_key {
        problems.push(format!("`{tag}` member cannot be a key"));
    }

    match tag {
        KindTag::Ref => {
            if decl.ref_to.is_none() {
                problems.push("ref member has no target path".to_string());
            }
        }
        KindTag::Child | KindTag::Children => {
            if decl.is_display_name {
                problems.push(format!("`{tag}` member cannot be a display name"));
            }
            if let Some(p) = nested_payload_problem(decl.members.as_ref(), decl.shape.as_ref()) {
                problems.push(format!("`{tag}` member {p}"));
            }
        }
        KindTag::Variation => match &decl.cases {
            Some(cases) => problems.extend(case_problems(cases)),
            None => problems.push("variation declares no cases".to_string()),
        },
        KindTag::Scalar(name) => {
            if name.is_empty() {
                problems.push("member has an empty kind".to_string());
            }
        }
    }

    for p in &problems {
        diag.structural(SchemaLocation::member(path, &decl.name), p.clone());
    }
    problems.is_empty()
}

// ============================================================================
// Navigation
// ============================================================================

/// Foreign keys must mirror the principal key column for column.
pub(crate) fn navigation_symmetry(graph: &AggregateGraph, diag: &mut Diagnostics) {
    for edge in graph.navigation() {
        let principal_key = graph.primary_key(edge.principal.aggregate);
        let mirrored = edge.foreign_key.len() == principal_key.len()
            && edge
                .foreign_key
                .iter()
                .zip(principal_key)
                .all(|(pair, k)| pair.principal == *k && pair.relevant.value_type == k.value_type);
        if !mirrored {
            diag.structural(
                SchemaLocation::member(graph.aggregate(edge.relevant.aggregate).path(), &edge.relation),
                format!(
                    "foreign key of `{}` does not mirror the key of {}",
                    edge.relation,
                    graph.aggregate(edge.principal.aggregate).path()
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use aggregraph_schema::{AggregateDecl, ShapeDecl};

    use super::*;

    fn path(s: &str) -> RefPath {
        RefPath::new(vec![s.to_string()])
    }

    #[test]
    fn self_nesting_and_mutual_shapes_are_cycles() {
        let mut doc = SchemaDocument::new("App", vec![]);
        doc.shapes = vec![
            ShapeDecl {
                name: "Node".into(),
                members: vec![MemberDecl::children_shape("Kids", "Node")],
            },
            ShapeDecl {
                name: "A".into(),
                members: vec![MemberDecl::child("Inner", vec![MemberDecl::child_shape("B", "B")])],
            },
            ShapeDecl {
                name: "B".into(),
                members: vec![MemberDecl::child_shape("A", "A")],
            },
            ShapeDecl {
                name: "Leaf".into(),
                members: vec![MemberDecl::scalar("X", "word")],
            },
        ];
        let mut diag = Diagnostics::default();
        assert!(ownership_cycles(&doc, &mut diag));
        let errors = diag.into_errors();
        assert_eq!(errors.count(SchemaErrorKind::OwnershipCycle), 2);
        assert!(errors.iter().any(|e| e.message.contains("Node -> Node")));
        assert!(errors.iter().any(|e| e.message.contains("A -> B -> A")));
    }

    #[test]
    fn duplicate_shape_names_are_checked_by_their_first_declaration() {
        let mut doc = SchemaDocument::new("App", vec![]);
        doc.shapes = vec![
            ShapeDecl {
                name: "X".into(),
                members: vec![MemberDecl::child_shape("Again", "X")],
            },
            ShapeDecl {
                name: "X".into(),
                members: vec![MemberDecl::scalar("Leaf", "word")],
            },
        ];
        let mut diag = Diagnostics::default();
        assert!(ownership_cycles(&doc, &mut diag));
        let errors = diag.into_errors();
        assert_eq!(errors.count(SchemaErrorKind::Structural), 1);
        assert_eq!(errors.count(SchemaErrorKind::OwnershipCycle), 1);
        assert!(errors.iter().any(|e| e.message.contains("X -> X")));
    }

    #[test]
    fn shared_shapes_without_cycles_pass() {
        let mut doc = SchemaDocument::new(
            "App",
            vec![AggregateDecl::new(
                "Customer",
                vec![
                    MemberDecl::child_shape("Home", "Address"),
                    MemberDecl::child_shape("Work", "Address"),
                ],
            )],
        );
        doc.shapes = vec![ShapeDecl {
            name: "Address".into(),
            members: vec![MemberDecl::scalar("Street", "word")],
        }];
        let mut diag = Diagnostics::default();
        assert!(!ownership_cycles(&doc, &mut diag));
        assert_eq!(diag.len(), 0);
    }

    #[test]
    fn conflicting_payloads_are_structural() {
        let mut diag = Diagnostics::default();
        let mut both = MemberDecl::child("C", vec![]);
        both.ref_to = Some("Other".into());
        assert!(!member_is_well_formed(&both, &path("A"), &mut diag));

        let keyed_children = MemberDecl::children("Lines", vec![]).key();
        assert!(!member_is_well_formed(&keyed_children, &path("A"), &mut diag));

        assert!(!member_is_well_formed(&MemberDecl::variation("V", vec![]), &path("A"), &mut diag));
        assert!(member_is_well_formed(&MemberDecl::scalar("Name", "word"), &path("A"), &mut diag));
        assert_eq!(diag.len(), 3);
    }

    #[test]
    fn duplicate_discriminators_are_reported() {
        let mut diag = Diagnostics::default();
        let v = MemberDecl::variation(
            "Payment",
            vec![
                VariationCaseDecl::new("Cash", 1, vec![]),
                VariationCaseDecl::new("Card", 1, vec![]),
            ],
        );
        assert!(!member_is_well_formed(&v, &path("Order"), &mut diag));
        let errors = diag.into_errors();
        assert!(errors.as_slice()[0].message.contains("reuses discriminator 1"));
    }

    #[test]
    fn namespace_rejects_repeats() {
        let mut diag = Diagnostics::default();
        let mut ns = MemberNamespace::default();
        assert!(ns.claim("Name", &path("A"), &mut diag));
        assert!(!ns.claim("Name", &path("A"), &mut diag));
        assert!(!ns.claim(" ", &path("A"), &mut diag));
        assert_eq!(diag.len(), 2);
    }
}
