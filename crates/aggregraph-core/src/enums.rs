//! Schema-level enumerations.
//!
//! Items may omit their value; those take the lowest non-negative integer not
//! used by any explicit value or earlier auto-assigned item.

use std::collections::{BTreeSet, HashSet};

use aggregraph_schema::{EnumDecl, Name};
use serde::Serialize;

use crate::error::{Diagnostics, SchemaLocation};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumItem {
    pub name: Name,
    pub value: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumDefinition {
    pub name: Name,
    pub items: Vec<EnumItem>,
}

impl EnumDefinition {
    pub fn item(&self, name: &str) -> Option<&EnumItem> {
        self.items.iter().find(|i| i.name == name)
    }

    pub fn item_by_value(&self, value: i32) -> Option<&EnumItem> {
        self.items.iter().find(|i| i.value == value)
    }

    fn from_decl(decl: &EnumDecl, diag: &mut Diagnostics) -> Option<Self> {
        let before = diag.len();
        if decl.items.is_empty() {
            diag.structural(
                SchemaLocation::enum_decl(&decl.name),
                "enumeration declares no items",
            );
            return None;
        }

        let mut names = HashSet::new();
        let mut used = BTreeSet::new();
        for item in &decl.items {
            if !names.insert(item.name.as_str()) {
                diag.structural(
                    SchemaLocation::enum_item(&decl.name, &item.name),
                    format!("duplicate item name `{}`", item.name),
                );
            }
            if let Some(value) = item.value {
                if !used.insert(value) {
                    diag.structural(
                        SchemaLocation::enum_item(&decl.name, &item.name),
                        format!("duplicate item value {value}"),
                    );
                }
            }
        }
        if diag.len() > before {
            return None;
        }

        let mut next = 0i32;
        let items = decl
            .items
            .iter()
            .map(|item| {
                let value = match item.value {
                    Some(v) => v,
                    None => {
                        while used.contains(&next) {
                            next += 1;
                        }
                        used.insert(next);
                        next
                    }
                };
                EnumItem {
                    name: item.name.clone(),
                    value,
                    display_name: item.display_name.clone(),
                }
            })
            .collect();

        Some(EnumDefinition {
            name: decl.name.clone(),
            items,
        })
    }
}

/// Every enumeration usable as a member type, declared and synthesized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EnumCatalog {
    definitions: Vec<EnumDefinition>,
}

impl EnumCatalog {
    pub(crate) fn build(decls: &[EnumDecl], diag: &mut Diagnostics) -> Self {
        let mut catalog = EnumCatalog::default();
        for decl in decls {
            if decl.name.trim().is_empty() {
                diag.structural(SchemaLocation::Schema, "enumeration with an empty name");
                continue;
            }
            if catalog.get(&decl.name).is_some() {
                diag.structural(
                    SchemaLocation::enum_decl(&decl.name),
                    format!("duplicate enumeration `{}`", decl.name),
                );
                continue;
            }
            if let Some(def) = EnumDefinition::from_decl(decl, diag) {
                catalog.definitions.push(def);
            }
        }
        catalog
    }

    pub fn get(&self, name: &str) -> Option<&EnumDefinition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EnumDefinition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub(crate) fn push(&mut self, def: EnumDefinition) {
        self.definitions.push(def);
    }
}
