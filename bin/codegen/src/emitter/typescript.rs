use std::{fmt::Write, path::PathBuf};

use entity_codegen::{
    scalars::FALLBACK_PRIMITIVE,
    schema::{EnumType, Field, InputValue, TypeDefinition, TypeNode},
    BuiltField, BuiltType, Diagnostic, Diagnostics, EntityBuild, FieldType, RegisteredType,
    ScalarTable,
};
use tracing::{debug, warn};

use crate::emitter::{EmitError, EmittedFile, Emitter};

const GENERATED_HEADER: &str =
    "// Code generated by entity_codegen, changes will be undone by the next invocation. DO NOT EDIT.";
const GQL_IMPORT: &str = r#"import {gql} from "graphql-request""#;
const INDENT: &str = "  ";

/// Renders one `<entity>-types.ts` file per entity: scalar aliases, one `gql`
/// constant per operation, then a declaration per registered type.
pub struct TypeScriptEmitter {
    output_dir: PathBuf,
    scalars: ScalarTable,
}

impl TypeScriptEmitter {
    pub fn new(output_dir: PathBuf, scalars: ScalarTable) -> Self {
        Self {
            output_dir,
            scalars,
        }
    }

    pub fn file_path(&self, entity: &str) -> PathBuf {
        self.output_dir.join(format!("{}-types.ts", entity))
    }

    fn render_declaration(
        &self,
        out: &mut String,
        entry: &RegisteredType,
        diagnostics: &mut Diagnostics,
    ) -> Result<bool, EmitError> {
        match entry {
            RegisteredType::Built(built) => render_built_class(out, built)?,
            RegisteredType::Schema(definition) => match definition.as_ref() {
                TypeDefinition::Scalar(scalar) => {
                    if self.scalars.contains(&scalar.name) {
                        return Ok(false);
                    }
                    let diagnostic = Diagnostic::UnknownScalar {
                        name: scalar.name.clone(),
                        fallback: FALLBACK_PRIMITIVE.to_string(),
                    };
                    if diagnostics.push(diagnostic.clone()) {
                        warn!("{}", diagnostic);
                    }
                    writeln!(out, "// FIXME unknown scalar: {}", scalar.name)?;
                    writeln!(out, "export type {} = {}", scalar.name, FALLBACK_PRIMITIVE)?;
                }
                TypeDefinition::Object(object) => render_class(
                    out,
                    &object.name,
                    object.fields.values().filter_map(field_member),
                )?,
                TypeDefinition::Interface(interface) => render_class(
                    out,
                    &interface.name,
                    interface.fields.values().filter_map(field_member),
                )?,
                TypeDefinition::InputObject(input) => render_class(
                    out,
                    &input.name,
                    input.fields.values().filter_map(input_member),
                )?,
                TypeDefinition::Union(union) => {
                    let members = if union.members.is_empty() {
                        "never".to_string()
                    } else {
                        union.members.join(" | ")
                    };
                    writeln!(out, "export type {} = {}", union.name, members)?;
                }
                TypeDefinition::Enum(enum_type) => render_enum(out, enum_type)?,
            },
        }
        Ok(true)
    }
}

impl Emitter for TypeScriptEmitter {
    fn emit(&self, build: &EntityBuild) -> Result<EmittedFile, EmitError> {
        let mut out = String::new();
        let mut diagnostics = Diagnostics::default();

        writeln!(out, "{}", GENERATED_HEADER)?;
        writeln!(out, "{}", GQL_IMPORT)?;
        writeln!(out)?;
        for (scalar, primitive) in self.scalars.iter() {
            writeln!(out, "export type {} = {}", scalar, primitive)?;
        }

        for document in build.documents() {
            writeln!(out)?;
            write!(out, "export const {} = gql`\n{}`\n", document.name, document.pretty())?;
        }

        for (_, entry) in build.registry.iter() {
            let mut declaration = String::new();
            if self.render_declaration(&mut declaration, entry, &mut diagnostics)? {
                writeln!(out)?;
                out.push_str(&declaration);
            }
        }

        debug!(
            entity = build.name,
            declarations = build.registry.len(),
            "TypeScript declarations rendered"
        );

        Ok(EmittedFile {
            path: self.file_path(&build.name),
            contents: out,
            diagnostics,
        })
    }
}

fn field_member(field: &Field) -> Option<(&str, &TypeNode)> {
    (!field.is_deprecated()).then(|| (field.name.as_str(), &field.field_type))
}

fn input_member(value: &InputValue) -> Option<(&str, &TypeNode)> {
    (!value.is_deprecated()).then(|| (value.name.as_str(), &value.value_type))
}

fn render_class<'a>(
    out: &mut String,
    name: &str,
    members: impl Iterator<Item = (&'a str, &'a TypeNode)>,
) -> std::fmt::Result {
    writeln!(out, "export class {} {{", name)?;
    for (member, member_type) in members {
        let (optional, ts_type) = schema_type(member_type);
        write_member(out, member, optional, &ts_type)?;
    }
    writeln!(out, "}}")
}

fn render_built_class(out: &mut String, built: &BuiltType) -> std::fmt::Result {
    writeln!(out, "export class {} {{", built.name)?;
    for field in built.fields.values().filter(|field| !field.is_deprecated()) {
        render_built_member(out, field)?;
    }
    writeln!(out, "}}")
}

fn render_built_member(out: &mut String, field: &BuiltField) -> std::fmt::Result {
    let (optional, ts_type) = built_type(&field.field_type);
    write_member(out, field.response_key(), optional, &ts_type)
}

fn write_member(out: &mut String, name: &str, optional: bool, ts_type: &str) -> std::fmt::Result {
    let marker = if optional { "?" } else { "!" };
    writeln!(out, "{INDENT}{name}{marker}: {ts_type}")
}

fn render_enum(out: &mut String, enum_type: &EnumType) -> std::fmt::Result {
    writeln!(out, "export enum {} {{", enum_type.name)?;
    for value in enum_type
        .values
        .iter()
        .filter(|value| value.deprecation.is_none())
    {
        writeln!(out, "{INDENT}{0} = '{0}',", value.name)?;
    }
    writeln!(out, "}}")
}

/// `(optional, type)`. Lists become `T[]` whatever the nullability of their items.
fn schema_type(node: &TypeNode) -> (bool, String) {
    match node {
        TypeNode::NonNull(inner) => (false, schema_type(inner).1),
        TypeNode::List(inner) => (true, format!("{}[]", schema_type(inner).1)),
        TypeNode::Named(name) => (true, name.clone()),
    }
}

fn built_type(field_type: &FieldType) -> (bool, String) {
    match field_type {
        FieldType::NonNull(inner) => (false, built_type(inner).1),
        FieldType::List(inner) => (true, format!("{}[]", built_type(inner).1)),
        FieldType::Named(name) => (true, name.clone()),
        FieldType::Built(built) => (true, built.name.clone()),
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use entity_codegen::{
        build_entity, parse_schema, EntityConfig, FieldSelection, SynthesisOptions,
    };

    use super::*;

    const WIDGETS_SCHEMA: &str = r#"
        scalar Cursor
        type Query { widget(id: ID!): Widget }
        type Mutation { widgetUpdate(id: ID!, widget: WidgetInput!): WidgetUpdateResult }
        type Widget {
          id: ID!
          title: String
          tags: [String!]!
          status: Status
          next: Cursor
          legacy: Int @deprecated
        }
        enum Status { ACTIVE OLD @deprecated(reason: "gone") }
        input WidgetInput { title: String tags: [String] status: Status! }
        type WidgetUpdateResult { outcome: WidgetOutcome }
        union WidgetOutcome = WidgetSaved | WidgetError
        type WidgetSaved { savedAt: String }
        type WidgetError { message: String! }
    "#;

    fn widgets_build() -> Result<EntityBuild, Box<dyn Error>> {
        let schema = parse_schema(WIDGETS_SCHEMA)?;
        let entity = EntityConfig::new("widgets")
            .with_query("read", FieldSelection::new("widget", "Widget"))
            .with_mutation(
                "update",
                FieldSelection::new("widgetUpdate", "WidgetUpdateResult"),
            );

        Ok(build_entity(
            &schema,
            &entity,
            &SynthesisOptions::default(),
        )?)
    }

    #[test]
    fn renders_documents_and_declarations() -> Result<(), Box<dyn Error>> {
        let emitter = TypeScriptEmitter::new(PathBuf::from("generated"), ScalarTable::default());

        let file = emitter.emit(&widgets_build()?)?;

        assert_eq!(file.path, PathBuf::from("generated/widgets-types.ts"));
        insta::assert_snapshot!(file.contents, @r#"
        // Code generated by entity_codegen, changes will be undone by the next invocation. DO NOT EDIT.
        import {gql} from "graphql-request"

        export type String = string
        export type EntityGuid = string
        export type Int = string
        export type Nrql = string
        export type Float = number
        export type ID = string
        export type DashboardWidgetRawConfiguration = string
        export type DateTime = string
        export type EpochMilliseconds = string
        export type Boolean = boolean
        export type Milliseconds = string
        export type AttributeMap = Record<string, any>
        export type EntityAlertViolationInt = string
        export type NerdStorageDocument = string
        export type NrdbResult = string
        export type Seconds = string
        export type NrdbRawResults = string
        export type SecureValue = string
        export type NaiveDateTime = string

        export const UpdateWidgets = gql`
        mutation UpdateWidgets($id: ID!, $widget: WidgetInput!) {
          widgetUpdate(id: $id, widget: $widget) {
            outcome {
              ... on WidgetSaved {
                savedAt
              }
              ... on WidgetError {
                message
              }
            }
          }
        }
        `

        export const ReadWidgets = gql`
        query ReadWidgets($id: ID!) {
          widget(id: $id) {
            id
            title
            tags
            status
            next
          }
        }
        `

        export class WidgetUpdateResult {
          outcome?: WidgetOutcome
        }

        export type WidgetOutcome = WidgetSaved | WidgetError

        export class WidgetSaved {
          savedAt?: String
        }

        export class WidgetError {
          message!: String
        }

        export class WidgetInput {
          title?: String
          tags?: String[]
          status!: Status
        }

        export enum Status {
          ACTIVE = 'ACTIVE',
        }

        export class Widget {
          id!: ID
          title?: String
          tags!: String[]
          status?: Status
          next?: Cursor
        }

        // FIXME unknown scalar: Cursor
        export type Cursor = string
        "#);
        Ok(())
    }

    #[test]
    fn unknown_scalars_are_reported_once() -> Result<(), Box<dyn Error>> {
        let emitter = TypeScriptEmitter::new(PathBuf::from("generated"), ScalarTable::default());

        let file = emitter.emit(&widgets_build()?)?;

        assert_eq!(
            file.diagnostics.iter().collect::<Vec<_>>(),
            vec![&Diagnostic::UnknownScalar {
                name: "Cursor".to_string(),
                fallback: "string".to_string()
            }]
        );
        Ok(())
    }

    #[test]
    fn scalar_overrides_replace_the_marker() -> Result<(), Box<dyn Error>> {
        let scalars = ScalarTable::default().with_overrides([("Cursor", "string")]);
        let emitter = TypeScriptEmitter::new(PathBuf::from("generated"), scalars);

        let file = emitter.emit(&widgets_build()?)?;

        assert!(file.diagnostics.is_empty());
        assert!(!file.contents.contains("FIXME"));
        assert!(file.contents.contains("export type Cursor = string\n"));
        Ok(())
    }
}
