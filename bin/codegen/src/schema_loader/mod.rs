use std::path::Path;

use async_trait::async_trait;
use entity_codegen_config::schema_source::SchemaSource;
use tracing::debug;

use crate::schema_loader::{file::SchemaFileLoader, introspection::IntrospectionLoader};

pub mod file;
pub mod introspection;

#[derive(Debug, thiserror::Error)]
#[allow(clippy::enum_variant_names)]
pub enum LoadSchemaError {
    #[error("Failed to read schema file '{path}': {source}")]
    ReadFileError {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write schema cache '{path}': {source}")]
    WriteCacheError {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to create the HTTP client: {0}")]
    ClientCreationError(reqwest::Error),
    #[error("Failed to read schema from network: {0}")]
    NetworkError(#[from] reqwest_middleware::Error),
    #[error("Failed to read schema from network: {0}")]
    NetworkResponseError(#[from] reqwest::Error),
    #[error("Invalid API key header value")]
    InvalidApiKey,
    #[error("Introspection failed: {0}")]
    IntrospectionError(String),
}

#[async_trait]
pub trait SchemaLoader {
    /// Returns the schema as SDL text.
    async fn load(&self) -> Result<String, LoadSchemaError>;
}

/// Picks the loader for `source`. Relative paths are resolved against `root_directory`.
pub fn resolve_from_config(
    source: &SchemaSource,
    root_directory: &Path,
) -> Result<Box<dyn SchemaLoader + Send + Sync>, LoadSchemaError> {
    match source {
        SchemaSource::File { path } => {
            debug!("Creating schema loader from source file");
            Ok(SchemaFileLoader::new(root_directory.join(path)))
        }
        SchemaSource::Introspection(config) => {
            debug!("Creating schema loader from source introspection");
            let cache_path = config
                .cache_path
                .as_ref()
                .map(|cache_path| root_directory.join(cache_path));
            Ok(IntrospectionLoader::try_new(config, cache_path)?)
        }
    }
}
