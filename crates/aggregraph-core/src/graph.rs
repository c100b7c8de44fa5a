//! The resolved aggregate graph.
//!
//! Aggregates live in one arena indexed by `AggregateId`. Ids are assigned in
//! depth-first pre-order over the declaration tree, so they are reproducible
//! across runs for the same input. Ownership is stored as parent / children
//! indices; refs are stored on members and never show up in ancestor or
//! descendant enumeration.
//!
//! Everything here is read-only once `compile` returns.

use std::collections::HashMap;
use std::fmt;

use aggregraph_schema::digest::aggregate_unique_name;
use aggregraph_schema::{parse_ref_path, Name, RefPath};
use serde::{Deserialize, Serialize};

use crate::enums::EnumCatalog;
use crate::keys::KeyColumn;
use crate::member::{Member, MemberKind, RefMember};
use crate::navigation::NavigationEdge;
use crate::options::ResolveOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateId(u32);

impl AggregateId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for AggregateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OwnershipKind {
    Child,
    Children,
    Variation { discriminator: i32 },
}

impl OwnershipKind {
    pub fn member_kind(self) -> MemberKind {
        match self {
            OwnershipKind::Child => MemberKind::Child,
            OwnershipKind::Children => MemberKind::Children,
            OwnershipKind::Variation { .. } => MemberKind::Variation,
        }
    }
}

/// The single incoming ownership edge of a nested aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ownership {
    pub parent: AggregateId,
    pub kind: OwnershipKind,
    /// Owning member in the parent (the group name for variation cases).
    pub member: Name,
}

#[derive(Debug, Clone, Serialize)]
pub struct Aggregate {
    pub(crate) id: AggregateId,
    pub(crate) display_name: Name,
    pub(crate) path: RefPath,
    pub(crate) ownership: Option<Ownership>,
    pub(crate) members: Vec<Member>,
    pub(crate) children: Vec<AggregateId>,
    /// `None` until key resolution succeeds for this aggregate.
    pub(crate) primary_key: Option<Vec<KeyColumn>>,
}

impl Aggregate {
    pub fn id(&self) -> AggregateId {
        self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn path(&self) -> &RefPath {
        &self.path
    }

    pub fn ownership(&self) -> Option<&Ownership> {
        self.ownership.as_ref()
    }

    pub fn is_root(&self) -> bool {
        self.ownership.is_none()
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.name() == name)
    }

    /// Directly owned aggregates, in declaration order.
    pub fn owned(&self) -> &[AggregateId] {
        &self.children
    }

    pub fn primary_key(&self) -> &[KeyColumn] {
        self.primary_key.as_deref().unwrap_or(&[])
    }

    pub fn has_primary_key(&self) -> bool {
        self.primary_key.is_some()
    }
}

/// How an aggregate's human-readable instance label is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayName<'g> {
    Members(Vec<&'g Member>),
    Keys(&'g [KeyColumn]),
    Unlabeled,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregateGraph {
    pub(crate) application_name: Name,
    pub(crate) aggregates: Vec<Aggregate>,
    pub(crate) enums: EnumCatalog,
    pub(crate) navigation: Vec<NavigationEdge>,
    #[serde(skip)]
    pub(crate) path_index: HashMap<RefPath, AggregateId>,
    #[serde(skip)]
    pub(crate) options: ResolveOptions,
}

impl AggregateGraph {
    pub(crate) fn new(application_name: &str, enums: EnumCatalog, options: ResolveOptions) -> Self {
        Self {
            application_name: application_name.to_string(),
            aggregates: Vec::new(),
            enums,
            navigation: Vec::new(),
            path_index: HashMap::new(),
            options,
        }
    }

    pub fn application_name(&self) -> &str {
        &self.application_name
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.aggregates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aggregates.is_empty()
    }

    /// Every aggregate in id (pre-order) order.
    pub fn aggregates(&self) -> &[Aggregate] {
        &self.aggregates
    }

    /// Panics on an id that did not come from this graph.
    pub fn aggregate(&self, id: AggregateId) -> &Aggregate {
        &self.aggregates[id.index()]
    }

    pub fn get(&self, id: AggregateId) -> Option<&Aggregate> {
        self.aggregates.get(id.index())
    }

    pub(crate) fn aggregate_mut(&mut self, id: AggregateId) -> &mut Aggregate {
        &mut self.aggregates[id.index()]
    }

    pub fn ids(&self) -> impl Iterator<Item = AggregateId> + '_ {
        self.aggregates.iter().map(|a| a.id)
    }

    pub fn root_aggregates(&self) -> Vec<AggregateId> {
        self.aggregates
            .iter()
            .filter(|a| a.is_root())
            .map(|a| a.id)
            .collect()
    }

    pub fn parent(&self, id: AggregateId) -> Option<AggregateId> {
        self.aggregate(id).ownership.as_ref().map(|o| o.parent)
    }

    /// Ancestors, root first, excluding `id` itself.
    pub fn ancestors(&self, id: AggregateId) -> Vec<AggregateId> {
        let mut out = Vec::new();
        let mut cursor = self.parent(id);
        while let Some(p) = cursor {
            // The builder rejects cycles before any aggregate exists.
            if out.len() >= self.aggregates.len() {
                break;
            }
            out.push(p);
            cursor = self.parent(p);
        }
        out.reverse();
        out
    }

    pub fn root_of(&self, id: AggregateId) -> AggregateId {
        self.ancestors(id).first().copied().unwrap_or(id)
    }

    /// Ancestors followed by `id`.
    pub fn path_from_root(&self, id: AggregateId) -> Vec<AggregateId> {
        let mut out = self.ancestors(id);
        out.push(id);
        out
    }

    /// `id` and everything it owns transitively, in pre-order.
    pub fn this_and_descendants(&self, id: AggregateId) -> Vec<AggregateId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.aggregate(next).children.iter().rev().copied());
        }
        out
    }

    pub fn descendants(&self, id: AggregateId) -> Vec<AggregateId> {
        let mut all = self.this_and_descendants(id);
        all.remove(0);
        all
    }

    pub fn is_ancestor_of(&self, ancestor: AggregateId, id: AggregateId) -> bool {
        let mut cursor = self.parent(id);
        let mut steps = 0;
        while let Some(p) = cursor {
            if p == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.aggregates.len() {
                return false;
            }
            cursor = self.parent(p);
        }
        false
    }

    pub fn lookup(&self, path: &RefPath) -> Option<AggregateId> {
        self.path_index.get(path).copied()
    }

    /// Accepts the same notation as `Ref` paths, prefix included.
    pub fn find_by_path(&self, path: &str) -> Option<AggregateId> {
        parse_ref_path(path).ok().and_then(|p| self.lookup(&p))
    }

    pub fn members(&self, id: AggregateId) -> &[Member] {
        &self.aggregate(id).members
    }

    pub fn members_of_kind(
        &self,
        id: AggregateId,
        kind: MemberKind,
    ) -> impl Iterator<Item = &Member> + '_ {
        self.aggregate(id)
            .members
            .iter()
            .filter(move |m| m.kind() == kind)
    }

    pub fn primary_key(&self, id: AggregateId) -> &[KeyColumn] {
        self.aggregate(id).primary_key()
    }

    /// Renderer-facing names of the primary key columns.
    pub fn key_column_names(&self, id: AggregateId) -> Vec<String> {
        self.primary_key(id)
            .iter()
            .map(|k| k.column_name(self, id))
            .collect()
    }

    pub fn navigation(&self) -> &[NavigationEdge] {
        &self.navigation
    }

    /// Edges where `id` is principal or relevant.
    pub fn navigation_edges(&self, id: AggregateId) -> Vec<&NavigationEdge> {
        self.navigation
            .iter()
            .filter(|e| e.principal.aggregate == id || e.relevant.aggregate == id)
            .collect()
    }

    pub fn unique_id(&self, id: AggregateId) -> AggregateId {
        self.aggregate(id).id
    }

    /// Stable digest of the aggregate's root path.
    pub fn unique_name(&self, id: AggregateId) -> String {
        aggregate_unique_name(self.aggregate(id).path.segments())
    }

    pub fn display_name_members(&self, id: AggregateId) -> DisplayName<'_> {
        let agg = self.aggregate(id);
        let flagged: Vec<&Member> = agg.members.iter().filter(|m| m.is_display_name()).collect();
        if !flagged.is_empty() {
            DisplayName::Members(flagged)
        } else if self.options.keys_as_display_name && agg.primary_key.is_some() {
            DisplayName::Keys(agg.primary_key())
        } else {
            DisplayName::Unlabeled
        }
    }

    /// `(aggregate, member)` pairs whose ref points at `id`.
    pub fn referrers(&self, id: AggregateId) -> Vec<(AggregateId, &RefMember)> {
        let mut out = Vec::new();
        for agg in &self.aggregates {
            for member in &agg.members {
                if let Member::Ref(r) = member {
                    if r.target_id() == Some(id) {
                        out.push((agg.id, r));
                    }
                }
            }
        }
        out
    }

    pub fn enums(&self) -> &EnumCatalog {
        &self.enums
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
