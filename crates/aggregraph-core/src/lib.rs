//! Aggregraph: aggregate graph resolution engine
//!
//! Turns a declared member tree (`aggregraph_schema::SchemaDocument`) into an
//! arena of `Aggregate` nodes with:
//!
//! - typed members (`Member::{Value, Child, Children, Variation, Ref}`),
//! - refs bound by path against the whole schema,
//! - composite primary keys propagated through ownership and key-refs,
//! - navigation edges (principal / relevant, multiplicity, foreign key,
//!   delete behavior) for every ownership edge and every ref.
//!
//! Errors are accumulated across the whole pass and returned as one flat
//! `SchemaErrors` list; `compile` only hands out a graph when that list is
//! empty.

mod builder;
mod compile;
pub mod enums;
pub mod error;
pub mod graph;
pub mod keys;
pub mod member;
pub mod navigation;
pub mod options;
pub mod output_paths;
pub mod render;
mod resolve;
mod validate;

pub use compile::{compile, compile_best_effort, Compilation, ResolvedSchema};
pub use enums::{EnumCatalog, EnumDefinition, EnumItem};
pub use error::{SchemaError, SchemaErrorKind, SchemaErrors, SchemaLocation};
pub use graph::{Aggregate, AggregateGraph, AggregateId, DisplayName, Ownership, OwnershipKind};
pub use keys::{KeyColumn, RefHop};
pub use member::{
    Member, MemberKind, OwnedMember, RefMember, RefTarget, ValueMember, ValueType, VariationCase,
    VariationMember,
};
pub use navigation::{DeleteBehavior, EdgeEndpoint, EdgeKind, ForeignKeyPair, Multiplicity, NavigationEdge};
pub use options::{OptionsLoadError, ResolveOptions};
pub use output_paths::{OutputPathError, OutputPathRegistry};
pub use render::{render, render_dot, render_mermaid, GraphFormat};

pub use aggregraph_schema as schema;
