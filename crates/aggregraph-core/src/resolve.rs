//! Member Resolver
//!
//! Pass 1 classifies each raw member into a typed `Member`, leaving every
//! `Ref` unresolved. Pass 2 runs against the complete path index, so forward,
//! mutual and self references bind the same way regardless of declaration
//! order. Lookups are memoized per declared path text.

use std::collections::HashMap;

use aggregraph_schema::{parse_ref_path, KindTag, RefPath};

use crate::builder::{RawMember, Skeleton};
use crate::error::{Diagnostics, SchemaErrorKind, SchemaLocation};
use crate::graph::{AggregateGraph, AggregateId};
use crate::member::{
    Member, OwnedMember, RefMember, RefTarget, ValueMember, ValueType, VariationCase,
    VariationMember,
};

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct ResolveStats {
    pub(crate) members: usize,
    pub(crate) refs_bound: usize,
    pub(crate) refs_unresolved: usize,
}

pub(crate) fn resolve_members(skeleton: Skeleton<'_>, diag: &mut Diagnostics) -> (AggregateGraph, ResolveStats) {
    let Skeleton { mut graph, raw } = skeleton;
    let mut stats = ResolveStats::default();

    for (index, raw_members) in raw.into_iter().enumerate() {
        let path = graph.aggregates[index].path.clone();
        let mut members = Vec::with_capacity(raw_members.len());
        for raw in raw_members {
            if let Some(member) = classify(&mut graph, &path, raw, diag) {
                members.push(member);
            }
        }
        stats.members += members.len();
        graph.aggregates[index].members = members;
    }

    bind_refs(&mut graph, &mut stats, diag);
    tracing::debug!(
        members = stats.members,
        refs_bound = stats.refs_bound,
        refs_unresolved = stats.refs_unresolved,
        "members resolved"
    );
    (graph, stats)
}

/// Built-in scalar first, then a declared enumeration of that name.
fn value_type(graph: &AggregateGraph, tag: &str) -> Option<ValueType> {
    ValueType::builtin(tag)
        .or_else(|| graph.enums.get(tag).map(|e| ValueType::Enumeration(e.name.clone())))
}

fn classify(
    graph: &mut AggregateGraph,
    path: &RefPath,
    raw: RawMember<'_>,
    diag: &mut Diagnostics,
) -> Option<Member> {
    match raw {
        RawMember::Scalar(decl) => {
            let KindTag::Scalar(tag) = decl.kind_tag() else {
                return None;
            };
            let Some(value_type) = value_type(graph, tag) else {
                diag.structural(
                    SchemaLocation::member(path, &decl.name),
                    format!("unknown member type `{tag}`"),
                );
                return None;
            };
            Some(Member::Value(ValueMember {
                name: decl.name.clone(),
                value_type,
                is_key: decl.is_key,
                is_display_name: decl.is_display_name,
                is_required: decl.is_required || decl.is_key,
            }))
        }
        RawMember::Ref(decl) => Some(Member::Ref(RefMember {
            name: decl.name.clone(),
            path: decl.ref_to.clone().unwrap_or_default(),
            target: RefTarget::Unresolved,
            is_key: decl.is_key,
            is_display_name: decl.is_display_name,
            is_required: decl.is_required || decl.is_key,
        })),
        RawMember::Owned {
            decl,
            is_collection,
            aggregate,
        } => {
            let owned = OwnedMember {
                name: decl.name.clone(),
                aggregate,
                is_required: decl.is_required,
            };
            Some(if is_collection {
                Member::Children(owned)
            } else {
                Member::Child(owned)
            })
        }
        RawMember::Variation { decl, cases } => {
            let variation = VariationMember {
                name: decl.name.clone(),
                cases: cases
                    .into_iter()
                    .map(|(case, aggregate)| VariationCase {
                        name: case.name.clone(),
                        discriminator: case.discriminator,
                        aggregate,
                    })
                    .collect(),
                is_display_name: decl.is_display_name,
                is_required: decl.is_required,
            };
            let synthesized = variation.as_enum();
            if graph.enums.get(&synthesized.name).is_some() {
                diag.structural(
                    SchemaLocation::member(path, &decl.name),
                    format!(
                        "variation enum `{}` collides with an existing enumeration",
                        synthesized.name
                    ),
                );
            } else {
                graph.enums.push(synthesized);
            }
            Some(Member::Variation(variation))
        }
    }
}

fn lookup(graph: &AggregateGraph, text: &str) -> Result<AggregateId, (SchemaErrorKind, String)> {
    let path = parse_ref_path(text)
        .map_err(|e| (SchemaErrorKind::UnresolvedReference, e.to_string()))?;
    graph.lookup(&path).ok_or_else(|| {
        (
            SchemaErrorKind::UnresolvedReference,
            format!("no aggregate at `{path}`"),
        )
    })
}

fn bind_refs(graph: &mut AggregateGraph, stats: &mut ResolveStats, diag: &mut Diagnostics) {
    let mut memo: HashMap<String, Result<AggregateId, (SchemaErrorKind, String)>> = HashMap::new();
    let mut bindings = Vec::new();

    let view: &AggregateGraph = graph;
    for agg in view.aggregates() {
        for (member_index, member) in agg.members().iter().enumerate() {
            let Member::Ref(r) = member else {
                continue;
            };
            let result = memo
                .entry(r.path.clone())
                .or_insert_with(|| lookup(view, &r.path))
                .clone();
            match result {
                Ok(target) => {
                    stats.refs_bound += 1;
                    bindings.push((agg.id(), member_index, target));
                }
                Err((kind, message)) => {
                    stats.refs_unresolved += 1;
                    diag.push(kind, SchemaLocation::member(agg.path(), &r.name), message);
                }
            }
        }
    }

    for (id, member_index, target) in bindings {
        if let Member::Ref(r) = &mut graph.aggregate_mut(id).members[member_index] {
            r.target = RefTarget::Resolved(target);
        }
    }
}
