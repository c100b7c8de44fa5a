//! Graph Builder
//!
//! Depth-first pre-order instantiation of one `Aggregate` per declaration tree
//! node. Shapes are expanded in place, so every use of a shape yields distinct
//! aggregates. Members are left raw: the member resolver classifies them once
//! the whole arena (and its path index) exists.

use aggregraph_schema::{KindTag, MemberDecl, RefPath, SchemaDocument, VariationCaseDecl};

use crate::enums::EnumCatalog;
use crate::error::{Diagnostics, SchemaLocation};
use crate::graph::{Aggregate, AggregateGraph, AggregateId, Ownership, OwnershipKind};
use crate::options::ResolveOptions;
use crate::validate::{self, MemberNamespace};

/// A declared member whose owned aggregates (if any) already exist.
#[derive(Debug)]
pub(crate) enum RawMember<'doc> {
    Scalar(&'doc MemberDecl),
    Ref(&'doc MemberDecl),
    Owned {
        decl: &'doc MemberDecl,
        is_collection: bool,
        aggregate: AggregateId,
    },
    Variation {
        decl: &'doc MemberDecl,
        cases: Vec<(&'doc VariationCaseDecl, AggregateId)>,
    },
}

/// The arena with ownership wired and members still raw.
pub(crate) struct Skeleton<'doc> {
    pub(crate) graph: AggregateGraph,
    /// Indexed like `graph.aggregates`.
    pub(crate) raw: Vec<Vec<RawMember<'doc>>>,
}

pub(crate) struct GraphBuilder<'doc> {
    doc: &'doc SchemaDocument,
    graph: AggregateGraph,
    raw: Vec<Vec<RawMember<'doc>>>,
}

impl<'doc> GraphBuilder<'doc> {
    pub(crate) fn new(doc: &'doc SchemaDocument, enums: EnumCatalog, options: ResolveOptions) -> Self {
        Self {
            doc,
            graph: AggregateGraph::new(&doc.application_name, enums, options),
            raw: Vec::new(),
        }
    }

    pub(crate) fn build(mut self, diag: &mut Diagnostics) -> Skeleton<'doc> {
        let doc = self.doc;
        let mut roots = MemberNamespace::default();
        for root in &doc.aggregates {
            let path = RefPath::new(vec![root.name.clone()]);
            if root.name.trim().is_empty() {
                diag.structural(SchemaLocation::Schema, "root aggregate with an empty name");
                continue;
            }
            if !roots.claim(&root.name, &path, diag) {
                continue;
            }
            self.instantiate(&root.name, path, None, &root.members, diag);
        }

        tracing::debug!(aggregates = self.graph.len(), "graph built");
        Skeleton {
            graph: self.graph,
            raw: self.raw,
        }
    }

    fn instantiate(
        &mut self,
        name: &str,
        path: RefPath,
        ownership: Option<Ownership>,
        members: &'doc [MemberDecl],
        diag: &mut Diagnostics,
    ) -> AggregateId {
        let id = AggregateId::new(self.graph.aggregates.len() as u32);
        if let Some(o) = &ownership {
            self.graph.aggregate_mut(o.parent).children.push(id);
        }
        self.graph.path_index.insert(path.clone(), id);
        self.graph.aggregates.push(Aggregate {
            id,
            display_name: name.to_string(),
            path: path.clone(),
            ownership,
            members: Vec::new(),
            children: Vec::new(),
            primary_key: None,
        });
        self.raw.push(Vec::new());

        let mut names = MemberNamespace::default();
        for decl in members {
            if !names.claim(&decl.name, &path, diag) {
                continue;
            }
            if !validate::member_is_well_formed(decl, &path, diag) {
                continue;
            }
            let raw = match decl.kind_tag() {
                KindTag::Scalar(_) => RawMember::Scalar(decl),
                KindTag::Ref => RawMember::Ref(decl),
                KindTag::Child | KindTag::Children => {
                    let kind = if decl.kind_tag() == KindTag::Child {
                        OwnershipKind::Child
                    } else {
                        OwnershipKind::Children
                    };
                    let Some(nested) = self.nested_members(
                        decl.members.as_deref(),
                        decl.shape.as_deref(),
                        &path,
                        &decl.name,
                        diag,
                    ) else {
                        continue;
                    };
                    let aggregate = self.instantiate(
                        &decl.name,
                        path.child(&decl.name),
                        Some(Ownership {
                            parent: id,
                            kind,
                            member: decl.name.clone(),
                        }),
                        nested,
                        diag,
                    );
                    RawMember::Owned {
                        decl,
                        is_collection: kind == OwnershipKind::Children,
                        aggregate,
                    }
                }
                KindTag::Variation => {
                    let mut cases = Vec::new();
                    for case in decl.cases.iter().flatten() {
                        if !names.claim(&case.name, &path, diag) {
                            continue;
                        }
                        let Some(nested) = self.nested_members(
                            case.members.as_deref(),
                            case.shape.as_deref(),
                            &path,
                            &case.name,
                            diag,
                        ) else {
                            continue;
                        };
                        let aggregate = self.instantiate(
                            &case.name,
                            path.child(&case.name),
                            Some(Ownership {
                                parent: id,
                                kind: OwnershipKind::Variation {
                                    discriminator: case.discriminator,
                                },
                                member: decl.name.clone(),
                            }),
                            nested,
                            diag,
                        );
                        cases.push((case, aggregate));
                    }
                    RawMember::Variation { decl, cases }
                }
            };
            self.raw[id.index()].push(raw);
        }
        id
    }

    fn nested_members(
        &self,
        inline: Option<&'doc [MemberDecl]>,
        shape: Option<&str>,
        path: &RefPath,
        member: &str,
        diag: &mut Diagnostics,
    ) -> Option<&'doc [MemberDecl]> {
        if let Some(members) = inline {
            return Some(members);
        }
        let name = shape?;
        let doc = self.doc;
        match doc.shape(name) {
            Some(s) => Some(s.members.as_slice()),
            None => {
                diag.structural(
                    SchemaLocation::member(path, member),
                    format!("unknown shape `{name}`"),
                );
                None
            }
        }
    }
}
