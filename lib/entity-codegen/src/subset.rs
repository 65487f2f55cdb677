use std::{fmt::Display, sync::Arc};

use indexmap::IndexMap;
use tracing::{debug, instrument, warn};

use crate::{
    schema::{Field, InputValue, OperationKind, SchemaState, TypeDefinition, TypeKind, TypeNode},
    selection::FieldSelection,
};

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("Root field '{field}' was not found on the {kind} type")]
    MissingRootField { kind: OperationKind, field: String },
    #[error("Expected exactly one root selection, found {count}")]
    RootSelectionCount { count: usize },
    #[error("Root selection '{field}' cannot carry a fragment marker")]
    RootFragment { field: String },
    #[error("Root field '{field}' on the {kind} type is deprecated")]
    DeprecatedRootField { kind: OperationKind, field: String },
    #[error("Type '{type_name}' selected by '{field}' was not found in the schema")]
    TypeNotFound { field: String, type_name: String },
    #[error("Type '{type_name}' selected by '{field}' is a {kind}, only object and interface types can be subset")]
    UnsupportedKind {
        field: String,
        type_name: String,
        kind: TypeKind,
    },
}

impl BuildError {
    /// Errors caused by the shape of the configuration rather than by type resolution.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            BuildError::MissingRootField { .. }
                | BuildError::RootSelectionCount { .. }
                | BuildError::RootFragment { .. }
                | BuildError::DeprecatedRootField { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeKind {
    Object,
    Interface,
}

/// Filtered, possibly aliased copy of one object or interface type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltType {
    /// Caller-visible name: the alias when one is set, otherwise the source type name.
    pub name: String,
    /// Name of the schema type this one was built from.
    pub source_type: String,
    pub alias: Option<String>,
    pub kind: CompositeKind,
    pub description: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: IndexMap<String, BuiltField>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltField {
    /// Schema field name.
    pub name: String,
    pub alias: Option<String>,
    /// Type condition for a narrowing fragment, e.g. `DashboardEntity`.
    pub fragment: Option<String>,
    pub description: Option<String>,
    pub arguments: Vec<InputValue>,
    pub field_type: FieldType,
    pub deprecation: Option<String>,
}

impl BuiltField {
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecation.is_some()
    }
}

impl From<&Field> for BuiltField {
    fn from(field: &Field) -> Self {
        BuiltField {
            name: field.name.clone(),
            alias: None,
            fragment: None,
            description: field.description.clone(),
            arguments: field.arguments.clone(),
            field_type: (&field.field_type).into(),
            deprecation: field.deprecation.clone(),
        }
    }
}

/// Declared type of a built field. Wrapper kinds stay as they were in the schema,
/// only the innermost named type may be replaced by a built type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Named(String),
    Built(Arc<BuiltType>),
    List(Box<FieldType>),
    NonNull(Box<FieldType>),
}

impl FieldType {
    /// Rebuilds the wrappers of `node` around `built`.
    pub fn wrap_like(node: &TypeNode, built: Arc<BuiltType>) -> FieldType {
        match node {
            TypeNode::List(inner) => FieldType::List(Box::new(Self::wrap_like(inner, built))),
            TypeNode::NonNull(inner) => {
                FieldType::NonNull(Box::new(Self::wrap_like(inner, built)))
            }
            TypeNode::Named(_) => FieldType::Built(built),
        }
    }

    pub fn inner_type(&self) -> &str {
        match self {
            FieldType::Named(name) => name,
            FieldType::Built(built) => &built.name,
            FieldType::List(inner) | FieldType::NonNull(inner) => inner.inner_type(),
        }
    }

    pub fn built(&self) -> Option<&Arc<BuiltType>> {
        match self {
            FieldType::Built(built) => Some(built),
            FieldType::Named(_) => None,
            FieldType::List(inner) | FieldType::NonNull(inner) => inner.built(),
        }
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, FieldType::NonNull(_))
    }

    pub fn is_list(&self) -> bool {
        match self {
            FieldType::List(_) => true,
            FieldType::NonNull(inner) => inner.is_list(),
            FieldType::Named(_) | FieldType::Built(_) => false,
        }
    }
}

impl From<&TypeNode> for FieldType {
    fn from(node: &TypeNode) -> Self {
        match node {
            TypeNode::List(inner) => FieldType::List(Box::new(inner.as_ref().into())),
            TypeNode::NonNull(inner) => FieldType::NonNull(Box::new(inner.as_ref().into())),
            TypeNode::Named(name) => FieldType::Named(name.clone()),
        }
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::List(inner) => write!(f, "[{}]", inner),
            FieldType::NonNull(inner) => write!(f, "{}!", inner),
            FieldType::Named(name) => write!(f, "{}", name),
            FieldType::Built(built) => write!(f, "{}", built.name),
        }
    }
}

/// Assembles a [`BuiltType`] from an empty record, copying in only what it keeps.
pub struct BuiltTypeBuilder<'a> {
    source_name: &'a str,
    source_fields: &'a IndexMap<String, Field>,
    kind: CompositeKind,
    description: Option<&'a str>,
    interfaces: &'a [String],
    alias: Option<String>,
    fields: IndexMap<String, BuiltField>,
}

impl<'a> BuiltTypeBuilder<'a> {
    pub fn new(source: &'a TypeDefinition, field: &str) -> Result<Self, BuildError> {
        let (kind, source_fields, interfaces) = match source {
            TypeDefinition::Object(object_type) => (
                CompositeKind::Object,
                &object_type.fields,
                object_type.interfaces.as_slice(),
            ),
            TypeDefinition::Interface(interface_type) => (
                CompositeKind::Interface,
                &interface_type.fields,
                interface_type.interfaces.as_slice(),
            ),
            TypeDefinition::Scalar(_)
            | TypeDefinition::Union(_)
            | TypeDefinition::Enum(_)
            | TypeDefinition::InputObject(_) => {
                return Err(BuildError::UnsupportedKind {
                    field: field.to_string(),
                    type_name: source.name().to_string(),
                    kind: source.kind(),
                })
            }
        };

        Ok(Self {
            source_name: source.name(),
            source_fields,
            kind,
            description: source.description(),
            interfaces,
            alias: None,
            fields: IndexMap::new(),
        })
    }

    /// Copies every field of the source type, as owned values.
    pub fn retain_source_fields(mut self) -> Self {
        for (name, field) in self.source_fields {
            self.fields.insert(name.clone(), field.into());
        }
        self
    }

    pub fn with_alias(mut self, alias: Option<&str>) -> Self {
        self.alias = alias.map(str::to_string);
        self
    }

    /// Places the field built for `selection` under its response key, replacing any
    /// field already there.
    pub fn splice(&mut self, selection: &FieldSelection, built: Arc<BuiltType>) {
        let fragment = selection.fragment_type().map(str::to_string);
        let field = match self.source_fields.get(&selection.name) {
            Some(original) => {
                if original.is_deprecated() {
                    warn!(
                        "selection '{}' targets deprecated field '{}.{}'; it will be skipped downstream",
                        selection.name, self.source_name, original.name
                    );
                }

                BuiltField {
                    name: original.name.clone(),
                    alias: selection.alias.clone(),
                    fragment,
                    description: original.description.clone(),
                    arguments: original.arguments.clone(),
                    field_type: FieldType::wrap_like(&original.field_type, built),
                    deprecation: original.deprecation.clone(),
                }
            }
            None => {
                if fragment.is_none() {
                    warn!(
                        "selection '{}' has no matching field on '{}', synthesizing a stub field",
                        selection.name, self.source_name
                    );
                }

                BuiltField {
                    name: selection.name.clone(),
                    alias: selection.alias.clone(),
                    fragment,
                    description: None,
                    arguments: Vec::new(),
                    field_type: FieldType::Built(built),
                    deprecation: None,
                }
            }
        };

        self.fields
            .insert(selection.response_key().to_string(), field);
    }

    pub fn build(self) -> BuiltType {
        BuiltType {
            name: self
                .alias
                .clone()
                .unwrap_or_else(|| self.source_name.to_string()),
            source_type: self.source_name.to_string(),
            alias: self.alias,
            kind: self.kind,
            description: self.description.map(str::to_string),
            interfaces: self.interfaces.to_vec(),
            fields: self.fields,
        }
    }
}

/// Applies selection trees to a schema, producing built fields.
///
/// Recursion follows the selection tree only, never the schema's type graph.
pub struct TypeSubsetter<'a> {
    schema: &'a SchemaState,
}

impl<'a> TypeSubsetter<'a> {
    pub fn new(schema: &'a SchemaState) -> Self {
        Self { schema }
    }

    #[instrument(level = "debug", skip(self, selections), fields(selections = selections.len()))]
    pub fn build_root_field(
        &self,
        kind: OperationKind,
        selections: &[FieldSelection],
    ) -> Result<BuiltField, BuildError> {
        let [selection] = selections else {
            return Err(BuildError::RootSelectionCount {
                count: selections.len(),
            });
        };

        if selection.fragment_name.is_some() {
            return Err(BuildError::RootFragment {
                field: selection.name.clone(),
            });
        }

        let original = self
            .schema
            .root_fields(kind)
            .and_then(|fields| fields.get(&selection.name))
            .ok_or_else(|| BuildError::MissingRootField {
                kind,
                field: selection.name.clone(),
            })?;

        if original.is_deprecated() {
            return Err(BuildError::DeprecatedRootField {
                kind,
                field: selection.name.clone(),
            });
        }

        let built = self.build_type(selection)?;

        Ok(BuiltField {
            name: original.name.clone(),
            alias: selection.alias.clone(),
            fragment: None,
            description: original.description.clone(),
            arguments: original.arguments.clone(),
            field_type: FieldType::wrap_like(&original.field_type, built),
            deprecation: original.deprecation.clone(),
        })
    }

    #[instrument(level = "debug", skip(self, selection), fields(name = %selection.name, type_name = %selection.type_name))]
    pub fn build_type(&self, selection: &FieldSelection) -> Result<Arc<BuiltType>, BuildError> {
        let source = self
            .schema
            .definition(&selection.type_name)
            .ok_or_else(|| BuildError::TypeNotFound {
                field: selection.name.clone(),
                type_name: selection.type_name.clone(),
            })?;

        let mut builder = BuiltTypeBuilder::new(source, &selection.name)?;
        if !selection.prune {
            builder = builder.retain_source_fields();
        }

        for sub_field in &selection.sub_fields {
            let sub_type = self.build_type(sub_field)?;
            builder.splice(sub_field, sub_type);
        }

        let built = builder.with_alias(selection.alias.as_deref()).build();
        debug!(
            "built type '{}' from '{}' with {} field(s)",
            built.name,
            built.source_type,
            built.fields.len()
        );

        Ok(Arc::new(built))
    }
}
