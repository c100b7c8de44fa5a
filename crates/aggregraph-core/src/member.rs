//! Resolved members.
//!
//! `Member` is closed: every phase matches it exhaustively. Owning variants
//! (`Child`, `Children`, `Variation`) point at arena ids; `Ref` carries its
//! binding state so an unresolved pointer can never be dereferenced by
//! accident.

use std::fmt;

use aggregraph_schema::Name;
use serde::{Deserialize, Serialize};

use crate::enums::{EnumDefinition, EnumItem};
use crate::graph::AggregateId;

pub const VARIATION_ENUM_PREFIX: &str = "E_";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "name", rename_all = "snake_case")]
pub enum ValueType {
    Word,
    Sentence,
    Integer,
    Decimal,
    Boolean,
    Date,
    YearMonth,
    Timestamp,
    /// Generated opaque identifier; also the type of surrogate keys.
    OpaqueId,
    Enumeration(Name),
    /// Value of a variation group, typed by its synthesized `E_<group>` enum.
    Discriminator(Name),
}

impl ValueType {
    /// Built-in scalar for a kind tag. Enum names are looked up separately.
    pub fn builtin(tag: &str) -> Option<ValueType> {
        let vt = match tag {
            "word" | "string" => ValueType::Word,
            "sentence" | "text" => ValueType::Sentence,
            "int" | "integer" => ValueType::Integer,
            "decimal" | "numeric" => ValueType::Decimal,
            "bool" | "boolean" => ValueType::Boolean,
            "date" => ValueType::Date,
            "year-month" | "yearmonth" => ValueType::YearMonth,
            "datetime" | "timestamp" => ValueType::Timestamp,
            "id" | "uuid" | "opaque-id" => ValueType::OpaqueId,
            _ => return None,
        };
        Some(vt)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Word => f.write_str("word"),
            ValueType::Sentence => f.write_str("sentence"),
            ValueType::Integer => f.write_str("integer"),
            ValueType::Decimal => f.write_str("decimal"),
            ValueType::Boolean => f.write_str("boolean"),
            ValueType::Date => f.write_str("date"),
            ValueType::YearMonth => f.write_str("year-month"),
            ValueType::Timestamp => f.write_str("timestamp"),
            ValueType::OpaqueId => f.write_str("opaque-id"),
            ValueType::Enumeration(name) => write!(f, "enum {name}"),
            ValueType::Discriminator(name) => write!(f, "discriminator {name}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueMember {
    pub name: Name,
    pub value_type: ValueType,
    pub is_key: bool,
    pub is_display_name: bool,
    pub is_required: bool,
}

/// `child` or `children`: one owned aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnedMember {
    pub name: Name,
    pub aggregate: AggregateId,
    pub is_required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariationCase {
    pub name: Name,
    pub discriminator: i32,
    pub aggregate: AggregateId,
}

/// A variation group. The member itself holds the discriminator value; every
/// case aggregate exists regardless of which one is live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariationMember {
    pub name: Name,
    pub cases: Vec<VariationCase>,
    pub is_display_name: bool,
    pub is_required: bool,
}

impl VariationMember {
    pub fn enum_name(&self) -> String {
        format!("{VARIATION_ENUM_PREFIX}{}", self.name)
    }

    pub fn value_type(&self) -> ValueType {
        ValueType::Discriminator(self.enum_name())
    }

    pub fn case_for(&self, discriminator: i32) -> Option<&VariationCase> {
        self.cases.iter().find(|c| c.discriminator == discriminator)
    }

    /// The group as an enumeration of its cases, in declaration order.
    pub fn as_enum(&self) -> EnumDefinition {
        EnumDefinition {
            name: self.enum_name(),
            items: self
                .cases
                .iter()
                .map(|c| EnumItem {
                    name: c.name.clone(),
                    value: c.discriminator,
                    display_name: None,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "target", rename_all = "snake_case")]
pub enum RefTarget {
    Unresolved,
    Resolved(AggregateId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefMember {
    pub name: Name,
    /// Path text exactly as declared.
    pub path: String,
    pub target: RefTarget,
    pub is_key: bool,
    pub is_display_name: bool,
    pub is_required: bool,
}

impl RefMember {
    pub fn target_id(&self) -> Option<AggregateId> {
        match self.target {
            RefTarget::Resolved(id) => Some(id),
            RefTarget::Unresolved => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Value,
    Child,
    Children,
    Variation,
    Ref,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MemberKind::Value => "value",
            MemberKind::Child => "child",
            MemberKind::Children => "children",
            MemberKind::Variation => "variation",
            MemberKind::Ref => "ref",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Member {
    Value(ValueMember),
    Child(OwnedMember),
    Children(OwnedMember),
    Variation(VariationMember),
    Ref(RefMember),
}

impl Member {
    pub fn name(&self) -> &str {
        match self {
            Member::Value(m) => &m.name,
            Member::Child(m) | Member::Children(m) => &m.name,
            Member::Variation(m) => &m.name,
            Member::Ref(m) => &m.name,
        }
    }

    pub fn kind(&self) -> MemberKind {
        match self {
            Member::Value(_) => MemberKind::Value,
            Member::Child(_) => MemberKind::Child,
            Member::Children(_) => MemberKind::Children,
            Member::Variation(_) => MemberKind::Variation,
            Member::Ref(_) => MemberKind::Ref,
        }
    }

    pub fn is_display_name(&self) -> bool {
        match self {
            Member::Value(m) => m.is_display_name,
            Member::Variation(m) => m.is_display_name,
            Member::Ref(m) => m.is_display_name,
            Member::Child(_) | Member::Children(_) => false,
        }
    }

    /// Aggregates this member owns, in declaration order.
    pub fn owned_aggregates(&self) -> Vec<AggregateId> {
        match self {
            Member::Child(m) | Member::Children(m) => vec![m.aggregate],
            Member::Variation(m) => m.cases.iter().map(|c| c.aggregate).collect(),
            Member::Value(_) | Member::Ref(_) => Vec::new(),
        }
    }
}
