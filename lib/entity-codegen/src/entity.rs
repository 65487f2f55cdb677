use indexmap::IndexMap;
use tracing::{debug, info, instrument, warn};

use crate::{
    document::{Document, DocumentError, DocumentSynthesizer, SynthesisOptions},
    registry::TypeRegistry,
    schema::{OperationKind, SchemaState},
    selection::EntityConfig,
    subset::{BuildError, BuiltField, TypeSubsetter},
};

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum EntityError {
    #[error("Entity '{entity}', {kind} '{operation}': {source}")]
    Build {
        entity: String,
        operation: String,
        kind: OperationKind,
        #[source]
        source: BuildError,
    },
    #[error("Entity '{entity}', {kind} '{operation}': {source}")]
    Document {
        entity: String,
        operation: String,
        kind: OperationKind,
        #[source]
        source: DocumentError,
    },
    /// Both kinds would render a document with the same name.
    #[error("Entity '{entity}': operation '{operation}' is configured as both a mutation and a query")]
    DuplicateOperation { entity: String, operation: String },
}

impl EntityError {
    pub fn entity(&self) -> &str {
        match self {
            EntityError::Build { entity, .. }
            | EntityError::Document { entity, .. }
            | EntityError::DuplicateOperation { entity, .. } => entity,
        }
    }

    pub fn operation(&self) -> &str {
        match self {
            EntityError::Build { operation, .. }
            | EntityError::Document { operation, .. }
            | EntityError::DuplicateOperation { operation, .. } => operation,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EntityOperation {
    pub kind: OperationKind,
    pub field: BuiltField,
    pub document: Document,
}

/// Everything produced for one entity: the shared type registry and one built
/// field plus document per configured operation.
#[derive(Debug, Clone)]
pub struct EntityBuild {
    pub name: String,
    pub registry: TypeRegistry,
    pub operations: IndexMap<String, EntityOperation>,
}

impl EntityBuild {
    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.operations.values().map(|operation| &operation.document)
    }
}

/// Runs the subsetter, the collector and the synthesizer for every operation of
/// `entity`, mutations first.
#[instrument(level = "debug", skip_all, fields(entity = %entity.name))]
pub fn build_entity(
    schema: &SchemaState,
    entity: &EntityConfig,
    options: &SynthesisOptions,
) -> Result<EntityBuild, EntityError> {
    let subsetter = TypeSubsetter::new(schema);
    let synthesizer = DocumentSynthesizer::new(schema, options.clone());
    let mut registry = TypeRegistry::new();
    let mut operations: IndexMap<String, EntityOperation> = IndexMap::new();

    for (kind, operation, selections) in entity.operations() {
        if operations.contains_key(operation) {
            return Err(EntityError::DuplicateOperation {
                entity: entity.name.clone(),
                operation: operation.to_string(),
            });
        }

        let field = subsetter
            .build_root_field(kind, selections)
            .map_err(|source| EntityError::Build {
                entity: entity.name.clone(),
                operation: operation.to_string(),
                kind,
                source,
            })?;

        registry.collect(schema, &field);

        let document = synthesizer
            .synthesize(&entity.name, operation, kind, &field)
            .map_err(|source| EntityError::Document {
                entity: entity.name.clone(),
                operation: operation.to_string(),
                kind,
                source,
            })?;

        debug!("{} '{}' rendered as '{}'", kind, operation, document.name);
        operations.insert(
            operation.to_string(),
            EntityOperation {
                kind,
                field,
                document,
            },
        );
    }

    for diagnostic in registry.diagnostics().iter() {
        warn!("entity '{}': {}", entity.name, diagnostic);
    }

    Ok(EntityBuild {
        name: entity.name.clone(),
        registry,
        operations,
    })
}

/// Builds each entity independently; a failing entity does not affect the others.
pub fn build_entities(
    schema: &SchemaState,
    entities: &[EntityConfig],
    options: &SynthesisOptions,
) -> Vec<Result<EntityBuild, EntityError>> {
    let results = entities
        .iter()
        .map(|entity| build_entity(schema, entity, options))
        .collect::<Vec<_>>();

    let failed = results.iter().filter(|result| result.is_err()).count();
    info!(
        "built {} of {} entities",
        results.len() - failed,
        results.len()
    );

    results
}
