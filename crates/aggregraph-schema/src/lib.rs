//! Aggregraph declared member tree (input contract)
//!
//! Every schema notation (XML, JSON, reflection) is turned into the same
//! `SchemaDocument` shape before the resolution engine sees it. This crate owns
//! that shape, the `Ref` path notation, and the digests used to derive stable
//! names from aggregate paths.
//!
//! Nothing in here resolves anything: kind tags stay strings, refs stay path
//! strings, and shapes stay names. `aggregraph-core` does the rest.

pub mod digest;
pub mod document;
pub mod ref_path;

pub use document::{
    AggregateDecl, EnumDecl, EnumItemDecl, KindTag, MemberDecl, Name, SchemaDocument,
    SchemaLoadError, ShapeDecl, VariationCaseDecl,
};
pub use ref_path::{parse_ref_path, RefPath, RefPathError};
