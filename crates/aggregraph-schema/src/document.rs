//! `SchemaDocument`: the declared member tree
//!
//! One `AggregateDecl` per root aggregate, each holding its members in
//! declaration order. Nested aggregates (child / children / variation cases)
//! either carry their members inline or name a `ShapeDecl` to instantiate.
//!
//! The struct layout is deliberately permissive: a member may carry payloads
//! that contradict its kind tag (a `child` with `ref_to`, a `ref` with nested
//! members, ...). Adapters pass such input through unchanged and the engine
//! reports it as a structural error against the offending member.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Name = String;

pub const KIND_REF: &str = "ref";
pub const KIND_CHILD: &str = "child";
pub const KIND_CHILDREN: &str = "children";
pub const KIND_VARIATION: &str = "variation";

fn is_false(b: &bool) -> bool {
    !*b
}

// ============================================================================
// AST
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchemaDocument {
    #[serde(default)]
    pub application_name: Name,
    #[serde(default)]
    pub aggregates: Vec<AggregateDecl>,
    /// Named member lists that nested members can instantiate by name.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shapes: Vec<ShapeDecl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enums: Vec<EnumDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AggregateDecl {
    pub name: Name,
    #[serde(default)]
    pub members: Vec<MemberDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemberDecl {
    pub name: Name,
    /// Scalar type name, enum name, or one of `ref` / `child` / `children` / `variation`.
    pub kind: Name,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_key: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_display_name: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_required: bool,
    /// `ref` payload: path of the target aggregate over the whole schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_to: Option<String>,
    /// `child` / `children` payload, inline form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<MemberDecl>>,
    /// `child` / `children` payload, shape form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<Name>,
    /// `variation` payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cases: Option<Vec<VariationCaseDecl>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VariationCaseDecl {
    pub name: Name,
    pub discriminator: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<MemberDecl>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<Name>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShapeDecl {
    pub name: Name,
    #[serde(default)]
    pub members: Vec<MemberDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnumDecl {
    pub name: Name,
    #[serde(default)]
    pub items: Vec<EnumItemDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnumItemDecl {
    pub name: Name,
    /// When absent, the lowest unused non-negative integer is assigned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Kind tag of a declared member, before any payload checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindTag<'a> {
    Ref,
    Child,
    Children,
    Variation,
    /// Scalar type name or enum name; resolved later.
    Scalar(&'a str),
}

impl std::fmt::Display for KindTag<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KindTag::Ref => f.write_str(KIND_REF),
            KindTag::Child => f.write_str(KIND_CHILD),
            KindTag::Children => f.write_str(KIND_CHILDREN),
            KindTag::Variation => f.write_str(KIND_VARIATION),
            KindTag::Scalar(name) => write!(f, "{name}"),
        }
    }
}

impl MemberDecl {
    pub fn kind_tag(&self) -> KindTag<'_> {
        match self.kind.trim() {
            KIND_REF => KindTag::Ref,
            KIND_CHILD => KindTag::Child,
            KIND_CHILDREN => KindTag::Children,
            KIND_VARIATION => KindTag::Variation,
            other => KindTag::Scalar(other),
        }
    }

    fn bare(name: &str, kind: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: kind.to_string(),
            is_key: false,
            is_display_name: false,
            is_required: false,
            ref_to: None,
            members: None,
            shape: None,
            cases: None,
        }
    }

    pub fn scalar(name: &str, kind: &str) -> Self {
        Self::bare(name, kind)
    }

    pub fn reference(name: &str, path: &str) -> Self {
        Self {
            ref_to: Some(path.to_string()),
            ..Self::bare(name, KIND_REF)
        }
    }

    pub fn child(name: &str, members: Vec<MemberDecl>) -> Self {
        Self {
            members: Some(members),
            ..Self::bare(name, KIND_CHILD)
        }
    }

    pub fn children(name: &str, members: Vec<MemberDecl>) -> Self {
        Self {
            members: Some(members),
            ..Self::bare(name, KIND_CHILDREN)
        }
    }

    pub fn child_shape(name: &str, shape: &str) -> Self {
        Self {
            shape: Some(shape.to_string()),
            ..Self::bare(name, KIND_CHILD)
        }
    }

    pub fn children_shape(name: &str, shape: &str) -> Self {
        Self {
            shape: Some(shape.to_string()),
            ..Self::bare(name, KIND_CHILDREN)
        }
    }

    pub fn variation(name: &str, cases: Vec<VariationCaseDecl>) -> Self {
        Self {
            cases: Some(cases),
            ..Self::bare(name, KIND_VARIATION)
        }
    }

    pub fn key(mut self) -> Self {
        self.is_key = true;
        self.is_required = true;
        self
    }

    pub fn display_name(mut self) -> Self {
        self.is_display_name = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }
}

impl VariationCaseDecl {
    pub fn new(name: &str, discriminator: i32, members: Vec<MemberDecl>) -> Self {
        Self {
            name: name.to_string(),
            discriminator,
            members: Some(members),
            shape: None,
        }
    }

    pub fn with_shape(name: &str, discriminator: i32, shape: &str) -> Self {
        Self {
            name: name.to_string(),
            discriminator,
            members: None,
            shape: Some(shape.to_string()),
        }
    }
}

impl AggregateDecl {
    pub fn new(name: &str, members: Vec<MemberDecl>) -> Self {
        Self {
            name: name.to_string(),
            members,
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

#[derive(Debug, Error)]
pub enum SchemaLoadError {
    #[error("failed to read `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid schema document: {0}")]
    Json(#[from] serde_json::Error),
}

impl SchemaDocument {
    pub fn new(application_name: &str, aggregates: Vec<AggregateDecl>) -> Self {
        Self {
            application_name: application_name.to_string(),
            aggregates,
            shapes: Vec::new(),
            enums: Vec::new(),
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self, SchemaLoadError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SchemaLoadError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SchemaLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn to_json_pretty(&self) -> Result<String, SchemaLoadError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn shape(&self, name: &str) -> Option<&ShapeDecl> {
        self.shapes.iter().find(|s| s.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tags_classify_structural_kinds_and_pass_scalars_through() {
        assert_eq!(MemberDecl::reference("r", "A").kind_tag(), KindTag::Ref);
        assert_eq!(MemberDecl::child("c", vec![]).kind_tag(), KindTag::Child);
        assert_eq!(MemberDecl::children("cs", vec![]).kind_tag(), KindTag::Children);
        assert_eq!(MemberDecl::variation("v", vec![]).kind_tag(), KindTag::Variation);
        assert_eq!(
            MemberDecl::scalar("n", " word ").kind_tag(),
            KindTag::Scalar("word")
        );
    }

    #[test]
    fn parses_minimal_json_document_with_defaults() {
        let doc = SchemaDocument::from_json_str(
            r#"{
                "application_name": "Shop",
                "aggregates": [
                    { "name": "Order", "members": [
                        { "name": "OrderId", "kind": "word", "is_key": true },
                        { "name": "Lines", "kind": "children", "members": [
                            { "name": "Qty", "kind": "integer" }
                        ] }
                    ] }
                ]
            }"#,
        )
        .expect("parse");

        assert_eq!(doc.application_name, "Shop");
        assert!(doc.shapes.is_empty());
        let order = &doc.aggregates[0];
        assert!(order.members[0].is_key);
        assert!(!order.members[0].is_required);
        assert_eq!(order.members[1].kind_tag(), KindTag::Children);
        assert_eq!(order.members[1].members.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn load_error_names_the_missing_file() {
        let err = SchemaDocument::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }

    #[test]
    fn key_builder_marks_member_required() {
        let m = MemberDecl::scalar("Id", "word").key();
        assert!(m.is_key && m.is_required);
    }
}
