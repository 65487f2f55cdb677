pub mod selection;

use std::fmt::{Display, Formatter as FmtFormatter, Result as FmtResult};

use indexmap::IndexMap;
use tracing::{debug, instrument, warn};

use crate::{
    schema::{Field, InputValue, OperationKind, SchemaState, TypeDefinition, TypeNode},
    subset::{BuiltField, BuiltType},
    utils::pretty_display::{get_indent, Pretty, PrettyDisplay},
};

use self::selection::{FieldSelection, InlineFragmentSelection, SelectionItem, SelectionSet};

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("Selection set of '{path}' is empty after pruning")]
    EmptySelectionSet { path: String },
    #[error("Variable '${name}' is declared as '{existing}' but also used as '{conflicting}'")]
    ConflictingVariable {
        name: String,
        existing: TypeNode,
        conflicting: TypeNode,
    },
}

/// Depth bound applied unless a caller picks another one.
pub const DEFAULT_MAX_DEPTH: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisOptions {
    /// Upper bound on selection depth when expanding schema types that were copied
    /// without a selection. Built types are always rendered in full.
    ///
    /// Only cycles along the current path are cut, so with `None` a schema where
    /// types fan out into shared types grows the document exponentially.
    pub max_depth: Option<usize>,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            max_depth: Some(DEFAULT_MAX_DEPTH),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableDefinition {
    pub name: String,
    pub variable_type: TypeNode,
}

impl Display for VariableDefinition {
    fn fmt(&self, f: &mut FmtFormatter<'_>) -> FmtResult {
        write!(f, "${}: {}", self.name, self.variable_type)
    }
}

/// An executable operation rendered from one built root field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub kind: OperationKind,
    pub name: String,
    /// Every variable used anywhere in the body, once each, in first-seen order.
    pub variables: Vec<VariableDefinition>,
    pub root: SelectionItem,
}

impl Document {
    /// `query Name($a: T) {`
    pub fn header(&self) -> String {
        let mut header = format!("{} {}", self.kind, self.name);
        if !self.variables.is_empty() {
            let variables = self
                .variables
                .iter()
                .map(|variable| variable.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            header.push_str(&format!("({})", variables));
        }
        header.push_str(" {");
        header
    }

    pub fn body(&self) -> String {
        self.root.to_string()
    }

    pub fn trailer(&self) -> &'static str {
        "}"
    }

    pub fn pretty(&self) -> String {
        Pretty(self).to_string()
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut FmtFormatter<'_>) -> FmtResult {
        write!(f, "{} {} {}", self.header(), self.body(), self.trailer())
    }
}

impl PrettyDisplay for Document {
    fn pretty_fmt(&self, f: &mut FmtFormatter<'_>, depth: usize) -> FmtResult {
        let indent = get_indent(depth);
        writeln!(f, "{indent}{}", self.header())?;
        self.root.pretty_fmt(f, depth + 1)?;
        writeln!(f, "{indent}{}", self.trailer())
    }
}

/// `capitalize(operation) + capitalize(entity)`, e.g. `read` + `dashboards` is `ReadDashboards`.
pub fn document_name(entity: &str, operation: &str) -> String {
    format!("{}{}", capitalize(operation), capitalize(entity))
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Default)]
struct RenderContext {
    variables: IndexMap<String, TypeNode>,
    /// Response keys from the root down to the field being rendered.
    path: Vec<String>,
    /// Schema types currently being expanded, innermost last.
    ancestors: Vec<String>,
}

impl RenderContext {
    /// Declares the arguments of a field that is being emitted. Variables that its
    /// selections introduced since `mark` move behind them, keeping body order.
    fn declare_kept(
        &mut self,
        mark: usize,
        arguments: &[InputValue],
    ) -> Result<Vec<String>, DocumentError> {
        let nested = self.variables.split_off(mark);
        let mut names = Vec::with_capacity(arguments.len());
        for argument in arguments.iter().filter(|argument| !argument.is_deprecated()) {
            self.declare(&argument.name, &argument.value_type)?;
            names.push(argument.name.clone());
        }
        for (name, variable_type) in &nested {
            self.declare(name, variable_type)?;
        }
        Ok(names)
    }

    fn declare(&mut self, name: &str, variable_type: &TypeNode) -> Result<(), DocumentError> {
        match self.variables.get(name) {
            Some(existing) if existing != variable_type => Err(DocumentError::ConflictingVariable {
                name: name.to_string(),
                existing: existing.clone(),
                conflicting: variable_type.clone(),
            }),
            Some(_) => Ok(()),
            None => {
                self.variables
                    .insert(name.to_string(), variable_type.clone());
                Ok(())
            }
        }
    }

    fn path(&self) -> String {
        self.path.join(".")
    }
}

/// Renders operation documents from built fields.
pub struct DocumentSynthesizer<'a> {
    schema: &'a SchemaState,
    options: SynthesisOptions,
}

impl<'a> DocumentSynthesizer<'a> {
    pub fn new(schema: &'a SchemaState, options: SynthesisOptions) -> Self {
        Self { schema, options }
    }

    #[instrument(level = "debug", skip(self, root), fields(root = %root.name))]
    pub fn synthesize(
        &self,
        entity: &str,
        operation: &str,
        kind: OperationKind,
        root: &BuiltField,
    ) -> Result<Document, DocumentError> {
        let mut context = RenderContext::default();
        context.path.push(root.response_key().to_string());

        let root_item = self.render_built_field(root, &mut context)?.ok_or_else(|| {
            DocumentError::EmptySelectionSet {
                path: root.response_key().to_string(),
            }
        })?;

        let document = Document {
            kind,
            name: document_name(entity, operation),
            variables: context
                .variables
                .into_iter()
                .map(|(name, variable_type)| VariableDefinition {
                    name,
                    variable_type,
                })
                .collect(),
            root: root_item,
        };
        debug!("synthesized {}", document);

        Ok(document)
    }

    /// `Ok(None)` means the field has nothing to select and is left out.
    fn render_built_field(
        &self,
        field: &BuiltField,
        context: &mut RenderContext,
    ) -> Result<Option<SelectionItem>, DocumentError> {
        let mark = context.variables.len();

        let selections = match field.field_type.built() {
            Some(built) => {
                let selections = self.render_built_type(built, context)?;
                if selections.is_empty() {
                    return Err(DocumentError::EmptySelectionSet {
                        path: context.path(),
                    });
                }
                Some(selections)
            }
            None => self.render_named(field.field_type.inner_type(), context)?,
        };

        let Some(selections) = selections else {
            context.variables.truncate(mark);
            return Ok(None);
        };

        Ok(Some(match &field.fragment {
            Some(type_condition) => SelectionItem::InlineFragment(InlineFragmentSelection {
                type_condition: type_condition.clone(),
                selections,
            }),
            None => SelectionItem::Field(FieldSelection {
                name: field.name.clone(),
                alias: field.alias.clone(),
                arguments: context.declare_kept(mark, &field.arguments)?,
                selections,
            }),
        }))
    }

    fn render_built_type(
        &self,
        built: &BuiltType,
        context: &mut RenderContext,
    ) -> Result<SelectionSet, DocumentError> {
        context.ancestors.push(built.source_type.clone());
        let mut selection_set = SelectionSet::default();

        for (response_key, field) in &built.fields {
            if field.is_deprecated() {
                continue;
            }

            context.path.push(response_key.clone());
            let item = self.render_built_field(field, context);
            context.path.pop();

            if let Some(item) = item? {
                selection_set.items.push(item);
            }
        }

        context.ancestors.pop();
        Ok(selection_set)
    }

    fn render_schema_field(
        &self,
        field: &Field,
        context: &mut RenderContext,
    ) -> Result<Option<SelectionItem>, DocumentError> {
        let mark = context.variables.len();

        match self.render_named(field.field_type.inner_type(), context)? {
            Some(selections) => Ok(Some(SelectionItem::Field(FieldSelection {
                name: field.name.clone(),
                alias: None,
                arguments: context.declare_kept(mark, &field.arguments)?,
                selections,
            }))),
            None => {
                context.variables.truncate(mark);
                Ok(None)
            }
        }
    }

    /// Selection set for a schema type reached without a selection. Leaves yield an
    /// empty set, composites their expanded fields, and `None` marks a type that has
    /// nothing selectable here.
    fn render_named(
        &self,
        type_name: &str,
        context: &mut RenderContext,
    ) -> Result<Option<SelectionSet>, DocumentError> {
        let Some(definition) = self.schema.definition(type_name) else {
            warn!("type '{}' is not defined in the schema, leaving it out", type_name);
            return Ok(None);
        };

        let fields = match definition.as_ref() {
            TypeDefinition::Scalar(_) | TypeDefinition::Enum(_) => {
                return Ok(Some(SelectionSet::default()))
            }
            TypeDefinition::InputObject(_) => return Ok(None),
            TypeDefinition::Union(union_type) => {
                return self.render_union(&union_type.members, context)
            }
            TypeDefinition::Object(object_type) => &object_type.fields,
            TypeDefinition::Interface(interface_type) => &interface_type.fields,
        };

        if context.ancestors.iter().any(|ancestor| ancestor == type_name) {
            return Ok(None);
        }
        if let Some(max_depth) = self.options.max_depth {
            if context.path.len() > max_depth {
                return Ok(None);
            }
        }

        context.ancestors.push(type_name.to_string());
        let mut selection_set = SelectionSet::default();

        for field in fields.values().filter(|field| !field.is_deprecated()) {
            context.path.push(field.name.clone());
            let item = self.render_schema_field(field, context);
            context.path.pop();

            if let Some(item) = item? {
                selection_set.items.push(item);
            }
        }

        context.ancestors.pop();
        Ok((!selection_set.is_empty()).then_some(selection_set))
    }

    fn render_union(
        &self,
        members: &[String],
        context: &mut RenderContext,
    ) -> Result<Option<SelectionSet>, DocumentError> {
        let mut selection_set = SelectionSet::default();

        for member in members {
            match self.render_named(member, context)? {
                Some(selections) if !selections.is_empty() => {
                    selection_set
                        .items
                        .push(SelectionItem::InlineFragment(InlineFragmentSelection {
                            type_condition: member.clone(),
                            selections,
                        }));
                }
                _ => debug!("union member '{}' has no selected fields, omitting", member),
            }
        }

        Ok((!selection_set.is_empty()).then_some(selection_set))
    }
}
