pub mod diagnostics;
pub mod document;
pub mod entity;
pub mod registry;
pub mod scalars;
pub mod schema;
pub mod selection;
pub mod subset;
pub mod utils;

#[cfg(test)]
mod tests;

pub use diagnostics::{Diagnostic, Diagnostics};
pub use document::{
    Document, DocumentError, DocumentSynthesizer, SynthesisOptions, DEFAULT_MAX_DEPTH,
};
pub use entity::{build_entities, build_entity, EntityBuild, EntityError, EntityOperation};
pub use registry::{RegisteredType, TypeRegistry};
pub use scalars::{ScalarMapping, ScalarTable};
pub use schema::{parse_schema, parse_schema_document, OperationKind, SchemaError, SchemaState};
pub use selection::{EntityConfig, FieldSelection};
pub use subset::{BuildError, BuiltField, BuiltType, FieldType, TypeSubsetter};
