use std::{
    fmt::{Debug, Display},
    sync::Arc,
};

use graphql_parser::query::{Directive, Value};
use graphql_parser::schema as input;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::instrument;

static BUILTIN_SCALARS: [&str; 5] = ["String", "Int", "Float", "Boolean", "ID"];

/// Reason recorded for a bare `@deprecated` without an explicit `reason` argument.
pub const DEFAULT_DEPRECATION_REASON: &str = "No longer supported";

pub type SchemaDocument = input::Document<'static, String>;

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Failed to parse schema: {0}")]
    Parse(#[from] input::ParseError),
    #[error("Schema has no query root type '{0}'")]
    MissingQueryType(String),
}

pub fn parse_schema(sdl: &str) -> Result<SchemaState, SchemaError> {
    let document = parse_schema_document(sdl)?;
    SchemaState::new(&document)
}

#[inline]
pub fn parse_schema_document(sdl: &str) -> Result<SchemaDocument, SchemaError> {
    Ok(input::parse_schema::<String>(sdl)?.into_static())
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    #[serde(rename = "query")]
    Query,
    #[serde(rename = "mutation")]
    Mutation,
}

impl Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationKind::Query => write!(f, "query"),
            OperationKind::Mutation => write!(f, "mutation"),
        }
    }
}

/// Read-only view of a GraphQL schema: every named type plus the root operation containers.
#[derive(Debug)]
pub struct SchemaState {
    /// All named types, in declaration order. Built-in scalars are always present.
    pub definitions: IndexMap<String, Arc<TypeDefinition>>,
    pub query_type: String,
    pub mutation_type: Option<String>,
}

impl SchemaState {
    #[instrument(level = "trace", skip(schema), name = "new_schema_state")]
    pub fn new(schema: &SchemaDocument) -> Result<Self, SchemaError> {
        let mut definitions = Self::build_map(schema);

        for builtin in BUILTIN_SCALARS {
            definitions.entry(builtin.to_string()).or_insert_with(|| {
                Arc::new(TypeDefinition::Scalar(ScalarType {
                    name: builtin.to_string(),
                    description: None,
                }))
            });
        }

        let schema_definition = schema.definitions.iter().find_map(|d| match d {
            input::Definition::SchemaDefinition(schema_definition) => Some(schema_definition),
            _ => None,
        });

        let query_type = schema_definition
            .and_then(|s| s.query.clone())
            .unwrap_or_else(|| "Query".to_string());
        let mutation_type = match schema_definition {
            Some(s) => s.mutation.clone(),
            None if definitions.contains_key("Mutation") => Some("Mutation".to_string()),
            None => None,
        };

        if !matches!(
            definitions.get(&query_type).map(|d| d.as_ref()),
            Some(TypeDefinition::Object(_))
        ) {
            return Err(SchemaError::MissingQueryType(query_type));
        }

        Ok(Self {
            definitions,
            query_type,
            mutation_type,
        })
    }

    pub fn definition(&self, name: &str) -> Option<&Arc<TypeDefinition>> {
        self.definitions.get(name)
    }

    /// Fields of the root container for the given operation kind, if the schema declares one.
    pub fn root_fields(&self, kind: OperationKind) -> Option<&IndexMap<String, Field>> {
        let root_type = match kind {
            OperationKind::Query => Some(&self.query_type),
            OperationKind::Mutation => self.mutation_type.as_ref(),
        }?;

        match self.definitions.get(root_type)?.as_ref() {
            TypeDefinition::Object(object_type) => Some(&object_type.fields),
            _ => None,
        }
    }

    pub fn is_scalar_type(&self, type_name: &str) -> bool {
        matches!(
            self.definitions.get(type_name).map(|d| d.as_ref()),
            Some(TypeDefinition::Scalar(_))
        )
    }

    #[instrument(level = "trace", skip(schema))]
    fn build_map(schema: &SchemaDocument) -> IndexMap<String, Arc<TypeDefinition>> {
        schema
            .definitions
            .iter()
            .filter_map(|definition| match definition {
                input::Definition::TypeDefinition(type_definition) => {
                    let built = Self::build_definition(type_definition);
                    Some((built.name().to_string(), Arc::new(built)))
                }
                _ => None,
            })
            .collect()
    }

    fn build_definition(definition: &input::TypeDefinition<'static, String>) -> TypeDefinition {
        match definition {
            input::TypeDefinition::Scalar(scalar_type) => TypeDefinition::Scalar(ScalarType {
                name: scalar_type.name.clone(),
                description: scalar_type.description.clone(),
            }),
            input::TypeDefinition::Object(object_type) => TypeDefinition::Object(ObjectType {
                name: object_type.name.clone(),
                description: object_type.description.clone(),
                interfaces: object_type.implements_interfaces.clone(),
                fields: Self::build_fields(&object_type.fields),
            }),
            input::TypeDefinition::Interface(interface_type) => {
                TypeDefinition::Interface(InterfaceType {
                    name: interface_type.name.clone(),
                    description: interface_type.description.clone(),
                    interfaces: interface_type.implements_interfaces.clone(),
                    fields: Self::build_fields(&interface_type.fields),
                })
            }
            input::TypeDefinition::Union(union_type) => TypeDefinition::Union(UnionType {
                name: union_type.name.clone(),
                description: union_type.description.clone(),
                members: union_type.types.clone(),
            }),
            input::TypeDefinition::Enum(enum_type) => TypeDefinition::Enum(EnumType {
                name: enum_type.name.clone(),
                description: enum_type.description.clone(),
                values: enum_type
                    .values
                    .iter()
                    .map(|value| EnumValue {
                        name: value.name.clone(),
                        description: value.description.clone(),
                        deprecation: extract_deprecation(&value.directives),
                    })
                    .collect(),
            }),
            input::TypeDefinition::InputObject(input_object_type) => {
                TypeDefinition::InputObject(InputObjectType {
                    name: input_object_type.name.clone(),
                    description: input_object_type.description.clone(),
                    fields: input_object_type
                        .fields
                        .iter()
                        .map(|value| (value.name.clone(), value.into()))
                        .collect(),
                })
            }
        }
    }

    #[instrument(level = "trace", skip(fields), fields(fields_count = fields.len()))]
    fn build_fields(fields: &[input::Field<'static, String>]) -> IndexMap<String, Field> {
        fields
            .iter()
            .map(|field| {
                (
                    field.name.clone(),
                    Field {
                        name: field.name.clone(),
                        description: field.description.clone(),
                        arguments: field.arguments.iter().map(InputValue::from).collect(),
                        field_type: (&field.field_type).into(),
                        deprecation: extract_deprecation(&field.directives),
                    },
                )
            })
            .collect()
    }
}

fn extract_deprecation(directives: &[Directive<'static, String>]) -> Option<String> {
    let directive = directives.iter().find(|d| d.name == "deprecated")?;
    let reason = directive
        .arguments
        .iter()
        .find_map(|(name, value)| match (name.as_str(), value) {
            ("reason", Value::String(reason)) => Some(reason.clone()),
            _ => None,
        });

    Some(reason.unwrap_or_else(|| DEFAULT_DEPRECATION_REASON.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
}

impl Display for TypeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TypeKind::Scalar => "scalar",
            TypeKind::Object => "object",
            TypeKind::Interface => "interface",
            TypeKind::Union => "union",
            TypeKind::Enum => "enum",
            TypeKind::InputObject => "input object",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone)]
pub enum TypeDefinition {
    Scalar(ScalarType),
    Object(ObjectType),
    Interface(InterfaceType),
    Union(UnionType),
    Enum(EnumType),
    InputObject(InputObjectType),
}

impl TypeDefinition {
    pub fn name(&self) -> &str {
        match self {
            TypeDefinition::Scalar(scalar_type) => &scalar_type.name,
            TypeDefinition::Object(object_type) => &object_type.name,
            TypeDefinition::Interface(interface_type) => &interface_type.name,
            TypeDefinition::Union(union_type) => &union_type.name,
            TypeDefinition::Enum(enum_type) => &enum_type.name,
            TypeDefinition::InputObject(input_type) => &input_type.name,
        }
    }

    pub fn kind(&self) -> TypeKind {
        match self {
            TypeDefinition::Scalar(_) => TypeKind::Scalar,
            TypeDefinition::Object(_) => TypeKind::Object,
            TypeDefinition::Interface(_) => TypeKind::Interface,
            TypeDefinition::Union(_) => TypeKind::Union,
            TypeDefinition::Enum(_) => TypeKind::Enum,
            TypeDefinition::InputObject(_) => TypeKind::InputObject,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            TypeDefinition::Scalar(scalar_type) => scalar_type.description.as_deref(),
            TypeDefinition::Object(object_type) => object_type.description.as_deref(),
            TypeDefinition::Interface(interface_type) => interface_type.description.as_deref(),
            TypeDefinition::Union(union_type) => union_type.description.as_deref(),
            TypeDefinition::Enum(enum_type) => enum_type.description.as_deref(),
            TypeDefinition::InputObject(input_type) => input_type.description.as_deref(),
        }
    }

    /// Output fields of an object or interface. Other kinds have none.
    pub fn fields(&self) -> Option<&IndexMap<String, Field>> {
        match self {
            TypeDefinition::Object(object_type) => Some(&object_type.fields),
            TypeDefinition::Interface(interface_type) => Some(&interface_type.fields),
            TypeDefinition::Scalar(_)
            | TypeDefinition::Union(_)
            | TypeDefinition::Enum(_)
            | TypeDefinition::InputObject(_) => None,
        }
    }

    pub fn is_leaf_type(&self) -> bool {
        matches!(self, TypeDefinition::Scalar(_) | TypeDefinition::Enum(_))
    }
}

#[derive(Debug, Clone)]
pub struct ScalarType {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ObjectType {
    pub name: String,
    pub description: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: IndexMap<String, Field>,
}

#[derive(Debug, Clone)]
pub struct InterfaceType {
    pub name: String,
    pub description: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: IndexMap<String, Field>,
}

#[derive(Debug, Clone)]
pub struct UnionType {
    pub name: String,
    pub description: Option<String>,
    pub members: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct EnumType {
    pub name: String,
    pub description: Option<String>,
    pub values: Vec<EnumValue>,
}

#[derive(Debug, Clone)]
pub struct EnumValue {
    pub name: String,
    pub description: Option<String>,
    pub deprecation: Option<String>,
}

#[derive(Debug, Clone)]
pub struct InputObjectType {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, InputValue>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub description: Option<String>,
    pub arguments: Vec<InputValue>,
    pub field_type: TypeNode,
    /// `Some(reason)` when the field carries `@deprecated`.
    pub deprecation: Option<String>,
}

impl Field {
    pub fn is_deprecated(&self) -> bool {
        self.deprecation.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputValue {
    pub name: String,
    pub description: Option<String>,
    pub value_type: TypeNode,
    pub deprecation: Option<String>,
}

impl InputValue {
    pub fn is_deprecated(&self) -> bool {
        self.deprecation.is_some()
    }
}

impl From<&input::InputValue<'static, String>> for InputValue {
    fn from(value: &input::InputValue<'static, String>) -> Self {
        InputValue {
            name: value.name.clone(),
            description: value.description.clone(),
            value_type: (&value.value_type).into(),
            deprecation: extract_deprecation(&value.directives),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TypeNode {
    List(Box<TypeNode>),
    NonNull(Box<TypeNode>),
    Named(String),
}

impl TypeNode {
    pub fn is_non_null(&self) -> bool {
        matches!(self, TypeNode::NonNull(_))
    }

    pub fn is_list(&self) -> bool {
        match self {
            TypeNode::List(_) => true,
            TypeNode::NonNull(inner) => inner.as_ref().is_list(),
            TypeNode::Named(_) => false,
        }
    }

    pub fn inner_type(&self) -> &str {
        match self {
            TypeNode::List(inner) => inner.as_ref().inner_type(),
            TypeNode::NonNull(inner) => inner.as_ref().inner_type(),
            TypeNode::Named(name) => name,
        }
    }
}

impl Display for TypeNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeNode::List(inner) => write!(f, "[{}]", inner),
            TypeNode::NonNull(inner) => write!(f, "{}!", inner),
            TypeNode::Named(name) => write!(f, "{}", name),
        }
    }
}

impl<'a, T: input::Text<'a>> From<&input::Type<'a, T>> for TypeNode {
    fn from(input_type: &input::Type<'a, T>) -> Self {
        match input_type {
            input::Type::ListType(inner) => TypeNode::List(Box::new(inner.as_ref().into())),
            input::Type::NonNullType(inner) => TypeNode::NonNull(Box::new(inner.as_ref().into())),
            input::Type::NamedType(name) => TypeNode::Named(name.as_ref().to_string()),
        }
    }
}
