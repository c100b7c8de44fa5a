//! Debug renderers for the resolved graph.
//!
//! Both formats draw one node per aggregate (labelled with its path and key
//! columns) and one edge per navigation edge: solid for ownership, dashed for
//! refs, always drawn from principal to relevant. Node ids are the stable
//! unique names, so output diffs cleanly across runs.

use crate::graph::{AggregateGraph, AggregateId};
use crate::navigation::{EdgeKind, Multiplicity, NavigationEdge};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    Mermaid,
    Dot,
}

impl GraphFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mermaid" | "mmd" => Some(Self::Mermaid),
            "dot" | "graphviz" => Some(Self::Dot),
            _ => None,
        }
    }
}

pub fn render(graph: &AggregateGraph, format: GraphFormat) -> String {
    match format {
        GraphFormat::Mermaid => render_mermaid(graph),
        GraphFormat::Dot => render_dot(graph),
    }
}

fn multiplicity(m: Multiplicity) -> &'static str {
    match m {
        Multiplicity::One => "1",
        Multiplicity::Many => "*",
    }
}

fn edge_label(edge: &NavigationEdge) -> String {
    let kind = match &edge.kind {
        EdgeKind::Child => "child".to_string(),
        EdgeKind::Children => "children".to_string(),
        EdgeKind::Variation { group, discriminator } => format!("{group}={discriminator}"),
        EdgeKind::Ref { .. } => "ref".to_string(),
    };
    format!(
        "{} ({kind}) {}:{}",
        edge.relation,
        multiplicity(edge.principal.multiplicity),
        multiplicity(edge.relevant.multiplicity)
    )
}

fn node_label(graph: &AggregateGraph, id: AggregateId) -> (String, Vec<String>) {
    (graph.aggregate(id).path().to_string(), graph.key_column_names(id))
}

pub fn render_mermaid(graph: &AggregateGraph) -> String {
    fn mermaid_escape(s: &str) -> String {
        s.replace('"', "#quot;")
    }

    let mut out = String::new();
    out.push_str("graph TD;\n");
    for agg in graph.aggregates() {
        let (path, keys) = node_label(graph, agg.id());
        let label = if keys.is_empty() {
            mermaid_escape(&path)
        } else {
            format!("{}<br/>{}", mermaid_escape(&path), mermaid_escape(&keys.join(", ")))
        };
        out.push_str(&format!("  {}[\"{}\"]\n", graph.unique_name(agg.id()), label));
    }
    for edge in graph.navigation() {
        let arrow = if edge.is_ownership() { "-->" } else { "-.->" };
        out.push_str(&format!(
            "  {} {}|\"{}\"| {}\n",
            graph.unique_name(edge.principal.aggregate),
            arrow,
            mermaid_escape(&edge_label(edge)),
            graph.unique_name(edge.relevant.aggregate)
        ));
    }
    out
}

pub fn render_dot(graph: &AggregateGraph) -> String {
    fn dot_escape(s: &str) -> String {
        s.replace('\\', "\\\\").replace('"', "\\\"")
    }

    let mut out = String::new();
    out.push_str("digraph aggregraph {\n");
    out.push_str("  rankdir=LR;\n");
    out.push_str("  node [shape=box, fontname=\"Helvetica\"];\n");
    out.push_str("  edge [fontname=\"Helvetica\"];\n\n");

    for agg in graph.aggregates() {
        let (path, keys) = node_label(graph, agg.id());
        let mut label = dot_escape(&path);
        if !keys.is_empty() {
            label.push_str("\\n");
            label.push_str(&dot_escape(&keys.join(", ")));
        }
        let style = if agg.is_root() { ", style=bold" } else { "" };
        out.push_str(&format!(
            "  {} [label=\"{}\"{}];\n",
            graph.unique_name(agg.id()),
            label,
            style
        ));
    }
    out.push('\n');

    for edge in graph.navigation() {
        let style = if edge.is_ownership() { "solid" } else { "dashed" };
        out.push_str(&format!(
            "  {} -> {} [label=\"{}\", style={}];\n",
            graph.unique_name(edge.principal.aggregate),
            graph.unique_name(edge.relevant.aggregate),
            dot_escape(&edge_label(edge)),
            style
        ));
    }
    out.push_str("}\n");
    out
}
