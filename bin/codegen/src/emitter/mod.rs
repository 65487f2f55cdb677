use std::path::PathBuf;

use entity_codegen::{Diagnostics, EntityBuild};
use tokio::fs;
use tracing::info;

pub mod typescript;

#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error("Failed to render declarations: {0}")]
    RenderError(#[from] std::fmt::Error),
    #[error("Failed to write '{path}': {source}")]
    WriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Rendered output for one entity, not yet written to disk.
#[derive(Debug, Clone)]
pub struct EmittedFile {
    pub path: PathBuf,
    pub contents: String,
    /// Findings made while rendering, e.g. scalars without a mapping.
    pub diagnostics: Diagnostics,
}

pub trait Emitter {
    fn emit(&self, build: &EntityBuild) -> Result<EmittedFile, EmitError>;
}

/// Writes `file`, creating its directory first. Existing files are replaced.
pub async fn write_emitted(file: &EmittedFile) -> Result<(), EmitError> {
    let write_error = |source| EmitError::WriteError {
        path: file.path.display().to_string(),
        source,
    };

    if let Some(parent) = file.path.parent() {
        fs::create_dir_all(parent).await.map_err(write_error)?;
    }
    fs::write(&file.path, &file.contents)
        .await
        .map_err(write_error)?;

    info!(path = %file.path.display(), "Generated file written");
    Ok(())
}
