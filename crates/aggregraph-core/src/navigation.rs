//! Navigation Resolver
//!
//! One `NavigationEdge` per ownership edge and per bound `Ref`:
//!
//! | edge       | principal | relevant | multiplicity | on delete |
//! |------------|-----------|----------|--------------|-----------|
//! | child      | owner     | owned    | One / One    | Cascade   |
//! | children   | owner     | owned    | One / Many   | Cascade   |
//! | variation  | owner     | case     | One / One    | Cascade   |
//! | ref        | target    | referrer | One / Many*  | Restrict  |
//!
//! (*) `One` only when every column of the referrer's primary key was
//! imported through this ref, i.e. the referrer is a 1:1 extension of the
//! target. Inherited or own key columns make it `Many`.
//!
//! The foreign key zips the principal's primary key with the columns that
//! mirror it on the relevant side, in order. Edges touching an aggregate
//! without a resolved key are skipped; the missing key is already an error.

use aggregraph_schema::Name;
use serde::Serialize;

use crate::graph::{AggregateGraph, AggregateId, OwnershipKind};
use crate::keys::{KeyColumn, RefHop};
use crate::member::{Member, RefMember};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Multiplicity {
    One,
    Many,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteBehavior {
    /// Deleting the principal deletes the relevant rows.
    Cascade,
    /// Deleting the principal leaves the relevant pointer dangling; callers must
    /// guard against it.
    Restrict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EdgeKind {
    Child,
    Children,
    Variation { group: Name, discriminator: i32 },
    Ref { member: Name },
}

impl EdgeKind {
    pub fn is_ownership(&self) -> bool {
        !matches!(self, EdgeKind::Ref { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EdgeEndpoint {
    pub aggregate: AggregateId,
    pub multiplicity: Multiplicity,
}

/// A principal key column and the column mirroring it on the relevant side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKeyPair {
    pub principal: KeyColumn,
    pub relevant: KeyColumn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationEdge {
    /// Owning member name or ref member name.
    pub relation: Name,
    pub kind: EdgeKind,
    pub principal: EdgeEndpoint,
    pub relevant: EdgeEndpoint,
    pub foreign_key: Vec<ForeignKeyPair>,
    pub on_principal_deleted: DeleteBehavior,
    /// The relevant side cannot exist without a principal.
    pub required: bool,
}

impl NavigationEdge {
    pub fn is_ownership(&self) -> bool {
        self.kind.is_ownership()
    }

    /// Endpoint on the far side from `id`, if `id` is on this edge.
    pub fn opposite(&self, id: AggregateId) -> Option<&EdgeEndpoint> {
        if self.principal.aggregate == id {
            Some(&self.relevant)
        } else if self.relevant.aggregate == id {
            Some(&self.principal)
        } else {
            None
        }
    }

    /// Relevant-side column names of the foreign key.
    pub fn foreign_key_columns(&self, graph: &AggregateGraph) -> Vec<String> {
        self.foreign_key
            .iter()
            .map(|p| p.relevant.column_name(graph, self.relevant.aggregate))
            .collect()
    }
}

fn ownership_edge(graph: &AggregateGraph, owned: AggregateId) -> Option<NavigationEdge> {
    let agg = graph.aggregate(owned);
    let ownership = agg.ownership()?;
    let owner = graph.aggregate(ownership.parent);
    if !owner.has_primary_key() || !agg.has_primary_key() {
        return None;
    }

    let principal_key = owner.primary_key();
    let foreign_key = principal_key
        .iter()
        .zip(agg.primary_key())
        .map(|(p, r)| ForeignKeyPair {
            principal: p.clone(),
            relevant: r.clone(),
        })
        .collect();

    let (kind, relation, relevant_multiplicity) = match ownership.kind {
        OwnershipKind::Child => (EdgeKind::Child, ownership.member.clone(), Multiplicity::One),
        OwnershipKind::Children => (
            EdgeKind::Children,
            ownership.member.clone(),
            Multiplicity::Many,
        ),
        OwnershipKind::Variation { discriminator } => (
            EdgeKind::Variation {
                group: ownership.member.clone(),
                discriminator,
            },
            agg.display_name().to_string(),
            Multiplicity::One,
        ),
    };

    Some(NavigationEdge {
        relation,
        kind,
        principal: EdgeEndpoint {
            aggregate: ownership.parent,
            multiplicity: Multiplicity::One,
        },
        relevant: EdgeEndpoint {
            aggregate: owned,
            multiplicity: relevant_multiplicity,
        },
        foreign_key,
        on_principal_deleted: DeleteBehavior::Cascade,
        required: true,
    })
}

/// `One` only for a 1:1 extension: the referrer's whole primary key comes
/// in through `r`.
fn referrer_multiplicity(graph: &AggregateGraph, referrer: AggregateId, r: &RefMember) -> Multiplicity {
    if !r.is_key {
        return Multiplicity::Many;
    }
    let key = graph.primary_key(referrer);
    let through_this_ref = |k: &KeyColumn| {
        k.via_refs
            .first()
            .is_some_and(|hop| hop.owner == referrer && hop.member == r.name)
    };
    if !key.is_empty() && key.iter().all(through_this_ref) {
        Multiplicity::One
    } else {
        Multiplicity::Many
    }
}

fn ref_edge(graph: &AggregateGraph, referrer: AggregateId, r: &RefMember) -> Option<NavigationEdge> {
    let target = r.target_id()?;
    let principal = graph.aggregate(target);
    if !principal.has_primary_key() {
        return None;
    }

    let hop = RefHop {
        owner: referrer,
        member: r.name.clone(),
        target,
    };
    let foreign_key = principal
        .primary_key()
        .iter()
        .map(|p| {
            let mut via_refs = vec![hop.clone()];
            via_refs.extend(p.via_refs.iter().cloned());
            ForeignKeyPair {
                principal: p.clone(),
                relevant: KeyColumn {
                    via_refs,
                    ..p.clone()
                },
            }
        })
        .collect();

    Some(NavigationEdge {
        relation: r.name.clone(),
        kind: EdgeKind::Ref {
            member: r.name.clone(),
        },
        principal: EdgeEndpoint {
            aggregate: target,
            multiplicity: Multiplicity::One,
        },
        relevant: EdgeEndpoint {
            aggregate: referrer,
            multiplicity: referrer_multiplicity(graph, referrer, r),
        },
        foreign_key,
        on_principal_deleted: DeleteBehavior::Restrict,
        required: r.is_required || r.is_key,
    })
}

/// All edges in aggregate order: each aggregate's incoming ownership edge,
/// then its refs in declaration order.
pub(crate) fn build_edges(graph: &AggregateGraph) -> Vec<NavigationEdge> {
    let mut edges = Vec::new();
    for agg in graph.aggregates() {
        edges.extend(ownership_edge(graph, agg.id()));
        for member in agg.members() {
            if let Member::Ref(r) = member {
                edges.extend(ref_edge(graph, agg.id(), r));
            }
        }
    }
    edges
}

pub(crate) fn resolve_navigation(graph: &mut AggregateGraph) -> usize {
    let edges = build_edges(graph);
    let count = edges.len();
    graph.navigation = edges;
    count
}
