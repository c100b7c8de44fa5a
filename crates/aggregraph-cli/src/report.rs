//! Human-readable console output.

use aggregraph_core::{AggregateGraph, MemberKind, SchemaErrorKind, SchemaErrors};
use colored::Colorize;

fn kind_label(kind: SchemaErrorKind) -> colored::ColoredString {
    let text = kind.to_string();
    match kind {
        SchemaErrorKind::OwnershipCycle => text.red().bold(),
        SchemaErrorKind::MissingKey | SchemaErrorKind::UnresolvedReference => text.red(),
        SchemaErrorKind::Structural => text.yellow(),
    }
}

pub fn print_errors(errors: &SchemaErrors) {
    for e in errors {
        eprintln!(
            "{} {}: {}",
            kind_label(e.kind),
            e.location.to_string().bold(),
            e.message
        );
    }
    eprintln!("{} {} error(s)", "failed:".red().bold(), errors.len());
}

pub fn print_summary(graph: &AggregateGraph) {
    let roots = graph.root_aggregates();
    let refs: usize = graph
        .ids()
        .map(|id| graph.members_of_kind(id, MemberKind::Ref).count())
        .sum();
    println!("  Application: {}", graph.application_name().cyan());
    println!("  Aggregates: {} ({} roots)", graph.len(), roots.len());
    println!("  Refs: {}", refs);
    println!("  Navigation edges: {}", graph.navigation().len());
    println!("  Enums: {}", graph.enums().len());
    for root in roots {
        println!(
            "    Root {}: {} nested",
            graph.aggregate(root).display_name().yellow(),
            graph.descendants(root).len()
        );
    }
}

pub fn print_keys(graph: &AggregateGraph) {
    for agg in graph.aggregates() {
        let id = agg.id();
        let depth = graph.ancestors(id).len();
        let columns: Vec<String> = graph
            .primary_key(id)
            .iter()
            .map(|k| {
                let name = k.column_name(graph, id);
                if k.surrogate {
                    format!("{} {}", name, "(surrogate)".dimmed())
                } else {
                    format!("{}: {}", name, k.value_type)
                }
            })
            .collect();
        println!(
            "{}{} [{}]",
            "  ".repeat(depth),
            agg.display_name().bold(),
            columns.join(", ")
        );
    }
}
