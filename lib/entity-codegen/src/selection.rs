use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::schema::OperationKind;

/// One node of the authored selection tree.
///
/// The tree is written by hand in configuration, so its depth is finite even when the
/// schema's own type graph is cyclic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSelection {
    pub name: String,
    /// Name of the schema type the selection is applied to.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Drop every field of the original type that is not listed in `sub_fields`.
    #[serde(default)]
    pub prune: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Narrow an interface or union to a concrete type, e.g. `... on DashboardEntity`.
    #[serde(
        default,
        alias = "fragmentName",
        skip_serializing_if = "Option::is_none"
    )]
    pub fragment_name: Option<String>,
    #[serde(default, alias = "subFields", skip_serializing_if = "Vec::is_empty")]
    pub sub_fields: Vec<FieldSelection>,
}

impl FieldSelection {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            prune: false,
            alias: None,
            fragment_name: None,
            sub_fields: Vec::new(),
        }
    }

    pub fn pruned(mut self) -> Self {
        self.prune = true;
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_fragment(mut self, fragment_name: impl Into<String>) -> Self {
        self.fragment_name = Some(fragment_name.into());
        self
    }

    pub fn with_sub_field(mut self, sub_field: FieldSelection) -> Self {
        self.sub_fields.push(sub_field);
        self
    }

    /// The key the selection occupies in its parent: the alias if set, otherwise the name.
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Bare type name of the fragment marker. Accepts both `Foo` and `... on Foo`.
    pub fn fragment_type(&self) -> Option<&str> {
        self.fragment_name.as_deref().map(normalize_fragment_name)
    }
}

fn normalize_fragment_name(fragment_name: &str) -> &str {
    let trimmed = fragment_name.trim();
    let without_spread = trimmed.strip_prefix("...").unwrap_or(trimmed).trim_start();

    match without_spread.strip_prefix("on") {
        Some(rest) if rest.starts_with(char::is_whitespace) => rest.trim(),
        _ => without_spread,
    }
}

/// Per-entity configuration: which root fields to build for each operation key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntityConfig {
    pub name: String,
    /// Operation key (`create`, `update`, `delete`, or any custom key) to root selections.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub mutations: IndexMap<String, Vec<FieldSelection>>,
    /// Operation key (`read`, `list`, or any custom key) to root selections.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub queries: IndexMap<String, Vec<FieldSelection>>,
}

impl EntityConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_query(mut self, operation: impl Into<String>, root: FieldSelection) -> Self {
        self.queries.insert(operation.into(), vec![root]);
        self
    }

    pub fn with_mutation(mut self, operation: impl Into<String>, root: FieldSelection) -> Self {
        self.mutations.insert(operation.into(), vec![root]);
        self
    }

    /// All configured operations, mutations first, each with its kind.
    pub fn operations(&self) -> impl Iterator<Item = (OperationKind, &str, &[FieldSelection])> {
        self.mutations
            .iter()
            .map(|(name, roots)| (OperationKind::Mutation, name.as_str(), roots.as_slice()))
            .chain(
                self.queries
                    .iter()
                    .map(|(name, roots)| (OperationKind::Query, name.as_str(), roots.as_slice())),
            )
    }
}
