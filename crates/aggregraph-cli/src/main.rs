//! Aggregraph CLI
//!
//! Command-line front end over the resolution engine, for schema authors:
//! - `check`: compile a schema and list every error
//! - `keys`: print each aggregate's primary key columns
//! - `graph`: render the ownership / reference structure (Mermaid or DOT)
//! - `dump`: emit the resolved graph (or the error list) as JSON

use std::fs;
use std::path::{Path, PathBuf};

use aggregraph_core::{
    compile, compile_best_effort, render, AggregateGraph, GraphFormat, ResolveOptions,
    ResolvedSchema, SchemaErrors,
};
use aggregraph_schema::SchemaDocument;
use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;

mod report;

#[derive(Parser)]
#[command(name = "aggregraph")]
#[command(author, version, about = "Aggregraph: aggregate graph resolution for schema-driven code generation")]
struct Cli {
    /// Log engine phases at debug level (overrides `RUST_LOG`).
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct SchemaArgs {
    /// Schema document (JSON member tree)
    input: PathBuf,
    /// Resolve options (JSON); defaults apply when omitted
    #[arg(long)]
    options: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a schema and report every error found.
    Check {
        #[command(flatten)]
        schema: SchemaArgs,
    },

    /// Print the primary key of every aggregate.
    Keys {
        #[command(flatten)]
        schema: SchemaArgs,
    },

    /// Render the resolved graph.
    Graph {
        #[command(flatten)]
        schema: SchemaArgs,
        /// Output format: mermaid | dot
        #[arg(long, default_value = "mermaid")]
        format: String,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Emit the resolved graph as JSON. With errors, emits the error list and
    /// (with `--best-effort`) the partial graph.
    Dump {
        #[command(flatten)]
        schema: SchemaArgs,
        #[arg(long)]
        best_effort: bool,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load(schema: &SchemaArgs) -> Result<(SchemaDocument, ResolveOptions)> {
    tracing::debug!(input = %schema.input.display(), "loading schema");
    let doc = SchemaDocument::from_json_file(&schema.input)?;
    let options = match &schema.options {
        Some(path) => ResolveOptions::from_json_file(path)
            .with_context(|| format!("failed to load options from `{}`", path.display()))?,
        None => ResolveOptions::default(),
    };
    Ok((doc, options))
}

fn compile_or_report(schema: &SchemaArgs) -> Result<ResolvedSchema> {
    let (doc, options) = load(schema)?;
    compile(&doc, &options).map_err(|errors| {
        report::print_errors(&errors);
        schema_failed(&schema.input, &errors)
    })
}

fn schema_failed(input: &Path, errors: &SchemaErrors) -> anyhow::Error {
    anyhow!(
        "`{}` has {} schema error(s)",
        input.display(),
        errors.len()
    )
}

fn write_output(out: Option<&PathBuf>, text: &str) -> Result<()> {
    match out {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("failed to write `{}`", path.display()))?;
            eprintln!("{} {}", "wrote".green().bold(), path.display().to_string().bold());
        }
        None => print!("{text}"),
    }
    Ok(())
}

fn cmd_check(schema: &SchemaArgs) -> Result<()> {
    println!("{} {}", "Checking".green().bold(), schema.input.display());
    let resolved = compile_or_report(schema)?;
    report::print_summary(resolved.graph());
    println!("{}", "Valid.".green());
    Ok(())
}

fn cmd_keys(schema: &SchemaArgs) -> Result<()> {
    let resolved = compile_or_report(schema)?;
    report::print_keys(resolved.graph());
    Ok(())
}

fn cmd_graph(schema: &SchemaArgs, format: &str, out: Option<&PathBuf>) -> Result<()> {
    let format = GraphFormat::parse(format)
        .ok_or_else(|| anyhow!("unknown graph format `{format}` (expected mermaid|dot)"))?;
    let resolved = compile_or_report(schema)?;
    write_output(out, &render(resolved.graph(), format))
}

#[derive(Serialize)]
struct DumpOutput<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    graph: Option<&'a AggregateGraph>,
    errors: &'a SchemaErrors,
}

fn cmd_dump(schema: &SchemaArgs, best_effort: bool, out: Option<&PathBuf>) -> Result<()> {
    let (doc, options) = load(schema)?;
    let compilation = compile_best_effort(&doc, &options);
    let failed = !compilation.errors.is_empty();

    let graph = if failed && !best_effort {
        None
    } else {
        compilation.graph.as_ref()
    };
    let text = serde_json::to_string_pretty(&DumpOutput {
        graph,
        errors: &compilation.errors,
    })?;
    write_output(out, &format!("{text}\n"))?;

    if failed {
        report::print_errors(&compilation.errors);
        return Err(schema_failed(&schema.input, &compilation.errors));
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Check { schema } => cmd_check(&schema),
        Commands::Keys { schema } => cmd_keys(&schema),
        Commands::Graph {
            schema,
            format,
            out,
        } => cmd_graph(&schema, &format, out.as_ref()),
        Commands::Dump {
            schema,
            best_effort,
            out,
        } => cmd_dump(&schema, best_effort, out.as_ref()),
    }
}
