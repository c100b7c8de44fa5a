//! Key Resolver
//!
//! Rules, applied per aggregate:
//!
//! - root: own key members in declaration order (value members flagged as key,
//!   plus the full key of every key-flagged ref target at that position);
//! - nested: the parent key, followed by own key members;
//! - `children` with no own key members: parent key plus a surrogate column;
//! - `child` with no own key members: parent key verbatim;
//! - variation case: parent key verbatim, own key flags ignored.
//!
//! Parents and key-ref targets are resolved on demand with memoization, so
//! declaration order never matters. A ref-key chain that comes back to an
//! aggregate still being resolved is a cycle.

use aggregraph_schema::Name;
use serde::Serialize;

use crate::error::{Diagnostics, SchemaErrorKind, SchemaLocation};
use crate::graph::{AggregateGraph, AggregateId, OwnershipKind};
use crate::member::{Member, ValueType};

/// One ref traversed to import a foreign key column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RefHop {
    pub owner: AggregateId,
    pub member: Name,
    pub target: AggregateId,
}

/// One primary-key column of an aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct KeyColumn {
    /// Member name in the declaring aggregate.
    pub member: Name,
    /// Aggregate that declares (or, for surrogates, owns) the member.
    pub declaring: AggregateId,
    pub value_type: ValueType,
    pub surrogate: bool,
    /// Refs walked to reach `declaring`, outermost first.
    pub via_refs: Vec<RefHop>,
}

impl KeyColumn {
    /// Column name as seen from `owner`: ref member names, then the declaring
    /// aggregate's name when the column is inherited, then the member name.
    pub fn column_name(&self, graph: &AggregateGraph, owner: AggregateId) -> String {
        let mut parts: Vec<&str> = self.via_refs.iter().map(|h| h.member.as_str()).collect();
        let holder = self.via_refs.last().map(|h| h.target).unwrap_or(owner);
        if self.declaring != holder {
            parts.push(graph.aggregate(self.declaring).display_name());
        }
        parts.push(&self.member);
        parts.join(&graph.options().column_separator)
    }

    fn through(&self, hop: RefHop) -> KeyColumn {
        let mut via_refs = Vec::with_capacity(self.via_refs.len() + 1);
        via_refs.push(hop);
        via_refs.extend(self.via_refs.iter().cloned());
        KeyColumn {
            via_refs,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone)]
enum KeyState {
    Pending,
    InProgress,
    Resolved(Vec<KeyColumn>),
    Failed,
}

pub(crate) struct KeyResolver<'g> {
    graph: &'g AggregateGraph,
    state: Vec<KeyState>,
    stack: Vec<AggregateId>,
}

impl<'g> KeyResolver<'g> {
    pub(crate) fn new(graph: &'g AggregateGraph) -> Self {
        Self {
            graph,
            state: vec![KeyState::Pending; graph.len()],
            stack: Vec::new(),
        }
    }

    /// Keys for every aggregate, `None` where resolution failed.
    pub(crate) fn resolve_all(mut self, diag: &mut Diagnostics) -> Vec<Option<Vec<KeyColumn>>> {
        for id in self.graph.ids().collect::<Vec<_>>() {
            self.resolve(id, diag);
        }
        self.state
            .into_iter()
            .map(|s| match s {
                KeyState::Resolved(k) => Some(k),
                _ => None,
            })
            .collect()
    }

    fn resolve(&mut self, id: AggregateId, diag: &mut Diagnostics) -> Option<Vec<KeyColumn>> {
        match &self.state[id.index()] {
            KeyState::Resolved(k) => return Some(k.clone()),
            KeyState::Failed => return None,
            KeyState::InProgress => return None,
            KeyState::Pending => {}
        }
        self.state[id.index()] = KeyState::InProgress;
        self.stack.push(id);
        let result = self.compute(id, diag);
        self.stack.pop();
        self.state[id.index()] = match &result {
            Some(k) => KeyState::Resolved(k.clone()),
            None => KeyState::Failed,
        };
        result
    }

    fn compute(&mut self, id: AggregateId, diag: &mut Diagnostics) -> Option<Vec<KeyColumn>> {
        let graph = self.graph;
        let agg = graph.aggregate(id);

        let mut key = Vec::new();
        if let Some(ownership) = agg.ownership() {
            if self.closes_cycle(ownership.parent) {
                self.report_cycle(id, ownership.parent, None, diag);
                return None;
            }
            key = self.resolve(ownership.parent, diag)?;

            if let OwnershipKind::Variation { .. } = ownership.kind {
                let ignored: Vec<&str> = agg
                    .members()
                    .iter()
                    .filter(|m| declares_key(m))
                    .map(|m| m.name())
                    .collect();
                if !ignored.is_empty() {
                    tracing::warn!(
                        aggregate = %agg.path(),
                        members = ?ignored,
                        "key flags on a variation case are ignored; it shares its owner's key"
                    );
                }
                return Some(key);
            }
        }

        let mut own = Vec::new();
        let mut ref_failed = false;
        for member in agg.members() {
            match member {
                Member::Value(v) if v.is_key => own.push(KeyColumn {
                    member: v.name.clone(),
                    declaring: id,
                    value_type: v.value_type.clone(),
                    surrogate: false,
                    via_refs: Vec::new(),
                }),
                Member::Ref(r) if r.is_key => {
                    let Some(target) = r.target_id() else {
                        ref_failed = true;
                        continue;
                    };
                    if self.closes_cycle(target) {
                        self.report_cycle(id, target, Some(&r.name), diag);
                        return None;
                    }
                    match self.resolve(target, diag) {
                        Some(target_key) => {
                            let hop = RefHop {
                                owner: id,
                                member: r.name.clone(),
                                target,
                            };
                            own.extend(target_key.iter().map(|c| c.through(hop.clone())));
                        }
                        None => ref_failed = true,
                    }
                }
                Member::Value(_)
                | Member::Ref(_)
                | Member::Child(_)
                | Member::Children(_)
                | Member::Variation(_) => {}
            }
        }

        if ref_failed {
            // Already reported against the ref or its target.
            return None;
        }

        if own.is_empty() {
            match agg.ownership().map(|o| o.kind) {
                None => {
                    diag.push(
                        SchemaErrorKind::MissingKey,
                        SchemaLocation::aggregate(agg.path()),
                        "root aggregate declares no key members",
                    );
                    return None;
                }
                Some(OwnershipKind::Children) => own.push(KeyColumn {
                    member: graph.options().surrogate_key_name.clone(),
                    declaring: id,
                    value_type: ValueType::OpaqueId,
                    surrogate: true,
                    via_refs: Vec::new(),
                }),
                Some(OwnershipKind::Child) | Some(OwnershipKind::Variation { .. }) => {}
            }
        }

        key.extend(own);
        if key.is_empty() {
            diag.push(
                SchemaErrorKind::MissingKey,
                SchemaLocation::aggregate(agg.path()),
                "aggregate ends key resolution with no key members",
            );
            return None;
        }
        Some(key)
    }

    fn closes_cycle(&self, target: AggregateId) -> bool {
        matches!(self.state[target.index()], KeyState::InProgress)
    }

    fn report_cycle(
        &self,
        at: AggregateId,
        back_to: AggregateId,
        member: Option<&str>,
        diag: &mut Diagnostics,
    ) {
        let start = self.stack.iter().position(|&a| a == back_to).unwrap_or(0);
        let mut names: Vec<String> = self.stack[start..]
            .iter()
            .map(|&a| self.graph.aggregate(a).path().to_string())
            .collect();
        names.push(self.graph.aggregate(back_to).path().to_string());

        let path = self.graph.aggregate(at).path();
        let location = match member {
            Some(m) => SchemaLocation::member(path, m),
            None => SchemaLocation::aggregate(path),
        };
        diag.structural(
            location,
            format!("key depends on itself: {}", names.join(" -> ")),
        );
    }
}

fn declares_key(member: &Member) -> bool {
    match member {
        Member::Value(v) => v.is_key,
        Member::Ref(r) => r.is_key,
        Member::Child(_) | Member::Children(_) | Member::Variation(_) => false,
    }
}

pub(crate) fn resolve_keys(graph: &mut AggregateGraph, diag: &mut Diagnostics) -> usize {
    let keys = KeyResolver::new(graph).resolve_all(diag);
    let mut resolved = 0;
    for (index, key) in keys.into_iter().enumerate() {
        if key.is_some() {
            resolved += 1;
        }
        graph.aggregates[index].primary_key = key;
    }
    resolved
}
