//! Schema errors.
//!
//! Every phase reports into one `Diagnostics` sink instead of returning early,
//! so a single compilation surfaces every independently fixable mistake. The
//! sink is drained into `SchemaErrors` when the pass ends.

use std::fmt;

use aggregraph_schema::{Name, RefPath};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaErrorKind {
    /// Malformed member-kind combinations, duplicate names, unknown types.
    Structural,
    UnresolvedReference,
    MissingKey,
    /// Fatal to the whole pass.
    OwnershipCycle,
}

impl fmt::Display for SchemaErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SchemaErrorKind::Structural => "structural error",
            SchemaErrorKind::UnresolvedReference => "unresolved reference",
            SchemaErrorKind::MissingKey => "missing key",
            SchemaErrorKind::OwnershipCycle => "ownership cycle",
        })
    }
}

/// Where in the declared schema an error originates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum SchemaLocation {
    Schema,
    Enum {
        name: Name,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        item: Option<Name>,
    },
    Shape {
        name: Name,
    },
    Aggregate {
        path: RefPath,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        member: Option<Name>,
    },
}

impl SchemaLocation {
    pub fn aggregate(path: &RefPath) -> Self {
        SchemaLocation::Aggregate {
            path: path.clone(),
            member: None,
        }
    }

    pub fn member(path: &RefPath, member: &str) -> Self {
        SchemaLocation::Aggregate {
            path: path.clone(),
            member: Some(member.to_string()),
        }
    }

    pub fn enum_decl(name: &str) -> Self {
        SchemaLocation::Enum {
            name: name.to_string(),
            item: None,
        }
    }

    pub fn enum_item(name: &str, item: &str) -> Self {
        SchemaLocation::Enum {
            name: name.to_string(),
            item: Some(item.to_string()),
        }
    }
}

impl fmt::Display for SchemaLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaLocation::Schema => f.write_str("<schema>"),
            SchemaLocation::Enum { name, item: None } => write!(f, "enum {name}"),
            SchemaLocation::Enum {
                name,
                item: Some(item),
            } => write!(f, "enum {name}.{item}"),
            SchemaLocation::Shape { name } => write!(f, "shape {name}"),
            SchemaLocation::Aggregate { path, member: None } => write!(f, "{path}"),
            SchemaLocation::Aggregate {
                path,
                member: Some(member),
            } => write!(f, "{path}.{member}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{kind} at {location}: {message}")]
pub struct SchemaError {
    pub kind: SchemaErrorKind,
    pub location: SchemaLocation,
    pub message: String,
}

/// Flat list of every error found by one compilation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaErrors(Vec<SchemaError>);

impl SchemaErrors {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SchemaError> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[SchemaError] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<SchemaError> {
        self.0
    }

    pub fn count(&self, kind: SchemaErrorKind) -> usize {
        self.0.iter().filter(|e| e.kind == kind).count()
    }

    pub fn of_kind(&self, kind: SchemaErrorKind) -> impl Iterator<Item = &SchemaError> {
        self.0.iter().filter(move |e| e.kind == kind)
    }
}

impl fmt::Display for SchemaErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaErrors {}

impl<'a> IntoIterator for &'a SchemaErrors {
    type Item = &'a SchemaError;
    type IntoIter = std::slice::Iter<'a, SchemaError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Debug, Default)]
pub(crate) struct Diagnostics {
    errors: Vec<SchemaError>,
}

impl Diagnostics {
    pub(crate) fn push(
        &mut self,
        kind: SchemaErrorKind,
        location: SchemaLocation,
        message: impl Into<String>,
    ) {
        self.errors.push(SchemaError {
            kind,
            location,
            message: message.into(),
        });
    }

    pub(crate) fn structural(&mut self, location: SchemaLocation, message: impl Into<String>) {
        self.push(SchemaErrorKind::Structural, location, message);
    }

    pub(crate) fn len(&self) -> usize {
        self.errors.len()
    }

    pub(crate) fn into_errors(self) -> SchemaErrors {
        SchemaErrors(self.errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(segments: &[&str]) -> RefPath {
        RefPath::new(segments.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn locations_render_as_paths() {
        let p = path(&["Order", "Lines"]);
        assert_eq!(SchemaLocation::aggregate(&p).to_string(), "Order/Lines");
        assert_eq!(SchemaLocation::member(&p, "Qty").to_string(), "Order/Lines.Qty");
        assert_eq!(SchemaLocation::enum_item("Color", "Red").to_string(), "enum Color.Red");
    }

    #[test]
    fn errors_display_one_per_line_and_count_by_kind() {
        let mut diag = Diagnostics::default();
        diag.push(
            SchemaErrorKind::MissingKey,
            SchemaLocation::aggregate(&path(&["A"])),
            "no key",
        );
        diag.structural(SchemaLocation::Schema, "application name is empty");
        let errors = diag.into_errors();

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.count(SchemaErrorKind::MissingKey), 1);
        let text = errors.to_string();
        assert_eq!(text.lines().count(), 2);
        assert!(text.starts_with("missing key at A: no key"));
    }

    #[test]
    fn errors_serialize_as_a_flat_list() {
        let mut diag = Diagnostics::default();
        diag.structural(SchemaLocation::member(&path(&["A"]), "x"), "bad");
        let json = serde_json::to_value(diag.into_errors()).expect("serialize");
        let first = &json.as_array().expect("array")[0];
        assert_eq!(first["kind"], "structural");
        assert_eq!(first["location"]["scope"], "aggregate");
        assert_eq!(first["location"]["path"][0], "A");
        assert_eq!(first["location"]["member"], "x");
    }
}
