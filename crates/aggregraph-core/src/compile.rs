//! One compilation pass: Builder -> Member Resolver -> Keys -> Navigation,
//! with validation around each phase.

use std::ops::Deref;

use aggregraph_schema::SchemaDocument;

use crate::builder::GraphBuilder;
use crate::enums::EnumCatalog;
use crate::error::{Diagnostics, SchemaErrors};
use crate::graph::AggregateGraph;
use crate::keys::resolve_keys;
use crate::navigation::resolve_navigation;
use crate::options::ResolveOptions;
use crate::resolve::resolve_members;
use crate::validate;

/// A graph that compiled without a single error. Safe to hand to renderers.
#[derive(Debug, Clone)]
pub struct ResolvedSchema {
    graph: AggregateGraph,
}

impl ResolvedSchema {
    pub fn graph(&self) -> &AggregateGraph {
        &self.graph
    }

    pub fn into_graph(self) -> AggregateGraph {
        self.graph
    }
}

impl Deref for ResolvedSchema {
    type Target = AggregateGraph;

    fn deref(&self) -> &AggregateGraph {
        &self.graph
    }
}

/// Everything one pass produced, errors included.
///
/// `graph` is `None` only when an ownership cycle stopped the pass.
#[derive(Debug)]
pub struct Compilation {
    pub graph: Option<AggregateGraph>,
    pub errors: SchemaErrors,
}

impl Compilation {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty() && self.graph.is_some()
    }

    pub fn into_result(self) -> Result<ResolvedSchema, SchemaErrors> {
        match self.graph {
            Some(graph) if self.errors.is_empty() => Ok(ResolvedSchema { graph }),
            _ => Err(self.errors),
        }
    }
}

pub fn compile(doc: &SchemaDocument, options: &ResolveOptions) -> Result<ResolvedSchema, SchemaErrors> {
    compile_best_effort(doc, options).into_result()
}

pub fn compile_best_effort(doc: &SchemaDocument, options: &ResolveOptions) -> Compilation {
    let mut diag = Diagnostics::default();

    validate::application_name(doc, options, &mut diag);
    let enums = EnumCatalog::build(&doc.enums, &mut diag);

    if validate::ownership_cycles(doc, &mut diag) {
        let errors = diag.into_errors();
        tracing::warn!(errors = errors.len(), "ownership cycle; resolution stopped");
        return Compilation {
            graph: None,
            errors,
        };
    }

    let skeleton = GraphBuilder::new(doc, enums, options.clone()).build(&mut diag);
    let (mut graph, _) = resolve_members(skeleton, &mut diag);

    let keyed = resolve_keys(&mut graph, &mut diag);
    tracing::debug!(keyed, aggregates = graph.len(), "keys resolved");

    let edges = resolve_navigation(&mut graph);
    tracing::debug!(edges, "navigation resolved");
    validate::navigation_symmetry(&graph, &mut diag);

    let errors = diag.into_errors();
    tracing::info!(
        application = %graph.application_name(),
        aggregates = graph.len(),
        edges,
        errors = errors.len(),
        "schema compiled"
    );
    Compilation {
        graph: Some(graph),
        errors,
    }
}
