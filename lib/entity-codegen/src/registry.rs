use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, instrument, trace, warn};

use crate::{
    diagnostics::{Diagnostic, Diagnostics},
    schema::{Field, InputValue, SchemaState, TypeDefinition, TypeKind, TypeNode},
    subset::{BuiltField, BuiltType, CompositeKind, FieldType},
};

/// A registry entry: either the schema's own definition or a filtered built copy.
#[derive(Debug, Clone)]
pub enum RegisteredType {
    Schema(Arc<TypeDefinition>),
    Built(Arc<BuiltType>),
}

impl RegisteredType {
    pub fn name(&self) -> &str {
        match self {
            RegisteredType::Schema(definition) => definition.name(),
            RegisteredType::Built(built) => &built.name,
        }
    }

    pub fn kind(&self) -> TypeKind {
        match self {
            RegisteredType::Schema(definition) => definition.kind(),
            RegisteredType::Built(built) => match built.kind {
                CompositeKind::Object => TypeKind::Object,
                CompositeKind::Interface => TypeKind::Interface,
            },
        }
    }

    pub fn is_built(&self) -> bool {
        matches!(self, RegisteredType::Built(_))
    }
}

impl PartialEq for RegisteredType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            // Schema definitions are shared out of one `SchemaState`.
            (RegisteredType::Schema(a), RegisteredType::Schema(b)) => {
                Arc::ptr_eq(a, b) || (a.name() == b.name() && a.kind() == b.kind())
            }
            (RegisteredType::Built(a), RegisteredType::Built(b)) => a == b,
            _ => false,
        }
    }
}

/// Pending unit of work for the collector's explicit stack.
enum CollectNode<'a> {
    BuiltField(&'a BuiltField),
    SchemaField(&'a Field),
    InputValue(&'a InputValue),
    FieldType(&'a FieldType),
    TypeNode(&'a TypeNode),
    Named(&'a str),
    Built(&'a Arc<BuiltType>),
    Definition(&'a Arc<TypeDefinition>),
}

/// Every named type reachable from one or more built fields, keyed by name.
///
/// Collection never re-descends into a name that is already registered, so cyclic
/// schemas terminate and repeated collection is a no-op.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: IndexMap<String, RegisteredType>,
    diagnostics: Diagnostics,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredType> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RegisteredType)> {
        self.types.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    #[instrument(level = "debug", skip_all, fields(field = %field.name))]
    pub fn collect(&mut self, schema: &SchemaState, field: &BuiltField) {
        self.drain(schema, vec![CollectNode::BuiltField(field)]);
    }

    pub fn collect_type(&mut self, schema: &SchemaState, field_type: &FieldType) {
        self.drain(schema, vec![CollectNode::FieldType(field_type)]);
    }

    pub fn collect_named(&mut self, schema: &SchemaState, name: &str) {
        self.drain(schema, vec![CollectNode::Named(name)]);
    }

    /// Folds `other` into this registry under the same replacement rules as collection.
    pub fn merge(&mut self, other: &TypeRegistry) {
        for (name, entry) in &other.types {
            let existing = self.types.get(name).cloned();
            match (existing, entry) {
                (None, _) => {
                    self.types.insert(name.clone(), entry.clone());
                }
                (Some(RegisteredType::Schema(_)), RegisteredType::Built(_)) => {
                    self.types.insert(name.clone(), entry.clone());
                }
                (Some(RegisteredType::Built(existing)), RegisteredType::Built(incoming))
                    if &existing != incoming =>
                {
                    self.report(Diagnostic::ConflictingBuiltType { name: name.clone() });
                }
                _ => {}
            }
        }

        self.diagnostics.extend(&other.diagnostics);
    }

    fn drain<'a>(&mut self, schema: &'a SchemaState, mut stack: Vec<CollectNode<'a>>) {
        while let Some(node) = stack.pop() {
            self.visit(schema, node, &mut stack);
        }
    }

    fn visit<'a>(
        &mut self,
        schema: &'a SchemaState,
        node: CollectNode<'a>,
        stack: &mut Vec<CollectNode<'a>>,
    ) {
        match node {
            CollectNode::BuiltField(field) => {
                if field.is_deprecated() {
                    trace!("skipping deprecated field '{}'", field.name);
                    return;
                }
                // Reverse push keeps pre-order: type first, then arguments.
                stack.extend(field.arguments.iter().rev().map(CollectNode::InputValue));
                stack.push(CollectNode::FieldType(&field.field_type));
            }
            CollectNode::SchemaField(field) => {
                if field.is_deprecated() {
                    trace!("skipping deprecated field '{}'", field.name);
                    return;
                }
                stack.extend(field.arguments.iter().rev().map(CollectNode::InputValue));
                stack.push(CollectNode::TypeNode(&field.field_type));
            }
            CollectNode::InputValue(value) => {
                if !value.is_deprecated() {
                    stack.push(CollectNode::TypeNode(&value.value_type));
                }
            }
            CollectNode::FieldType(field_type) => match field_type {
                FieldType::List(inner) | FieldType::NonNull(inner) => {
                    stack.push(CollectNode::FieldType(inner))
                }
                FieldType::Named(name) => stack.push(CollectNode::Named(name)),
                FieldType::Built(built) => stack.push(CollectNode::Built(built)),
            },
            CollectNode::TypeNode(type_node) => match type_node {
                TypeNode::List(inner) | TypeNode::NonNull(inner) => {
                    stack.push(CollectNode::TypeNode(inner))
                }
                TypeNode::Named(name) => stack.push(CollectNode::Named(name)),
            },
            CollectNode::Named(name) => {
                if self.types.contains_key(name) {
                    return;
                }

                match schema.definition(name) {
                    Some(definition) => stack.push(CollectNode::Definition(definition)),
                    None => {
                        if self.report(Diagnostic::UnknownType {
                            name: name.to_string(),
                        }) {
                            warn!("type '{}' is referenced but not defined in the schema", name);
                        }
                    }
                }
            }
            CollectNode::Built(built) => {
                match self.types.get(&built.name) {
                    None => {}
                    Some(RegisteredType::Schema(_)) => {
                        debug!(
                            "built type '{}' replaces its schema definition",
                            built.name
                        );
                    }
                    Some(RegisteredType::Built(existing)) => {
                        let conflicting = existing != built;
                        if conflicting
                            && self.report(Diagnostic::ConflictingBuiltType {
                                name: built.name.clone(),
                            })
                        {
                            warn!(
                                "built type '{}' differs from the one already registered, keeping the first",
                                built.name
                            );
                        }
                        return;
                    }
                }

                debug!("registering built type '{}'", built.name);
                self.types
                    .insert(built.name.clone(), RegisteredType::Built(built.clone()));

                if built.kind == CompositeKind::Interface {
                    stack.extend(
                        built
                            .interfaces
                            .iter()
                            .rev()
                            .map(|name| CollectNode::Named(name)),
                    );
                }
                stack.extend(built.fields.values().rev().map(CollectNode::BuiltField));
            }
            CollectNode::Definition(definition) => {
                if self.types.contains_key(definition.name()) {
                    return;
                }

                debug!(
                    "registering {} '{}'",
                    definition.kind(),
                    definition.name()
                );
                self.types.insert(
                    definition.name().to_string(),
                    RegisteredType::Schema(definition.clone()),
                );

                match definition.as_ref() {
                    TypeDefinition::Scalar(_) | TypeDefinition::Enum(_) => {}
                    TypeDefinition::Object(object_type) => {
                        stack.extend(object_type.fields.values().rev().map(CollectNode::SchemaField));
                    }
                    TypeDefinition::Interface(interface_type) => {
                        stack.extend(
                            interface_type
                                .interfaces
                                .iter()
                                .rev()
                                .map(|name| CollectNode::Named(name)),
                        );
                        stack.extend(
                            interface_type
                                .fields
                                .values()
                                .rev()
                                .map(CollectNode::SchemaField),
                        );
                    }
                    TypeDefinition::Union(union_type) => {
                        stack.extend(
                            union_type
                                .members
                                .iter()
                                .rev()
                                .map(|name| CollectNode::Named(name)),
                        );
                    }
                    TypeDefinition::InputObject(input_type) => {
                        stack.extend(input_type.fields.values().rev().map(CollectNode::InputValue));
                    }
                }
            }
        }
    }

    fn report(&mut self, diagnostic: Diagnostic) -> bool {
        self.diagnostics.push(diagnostic)
    }
}
