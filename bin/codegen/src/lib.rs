pub mod args;
pub mod emitter;
pub mod logger;
pub mod schema_loader;

use std::{error::Error, path::PathBuf};

use entity_codegen::{build_entities, parse_schema};
use entity_codegen_config::CodegenConfig;
use tracing::{error, info, instrument, warn};

use crate::{
    emitter::{typescript::TypeScriptEmitter, write_emitted, Emitter},
    schema_loader::resolve_from_config,
};

#[derive(Debug, Default)]
pub struct RunSummary {
    pub generated: Vec<PathBuf>,
    /// Names of entities that failed to build or emit.
    pub failed: Vec<String>,
}

impl RunSummary {
    pub fn all_failed(&self) -> bool {
        self.generated.is_empty() && !self.failed.is_empty()
    }
}

/// Loads the schema, builds every configured entity and writes one file per entity.
///
/// Only schema acquisition errors are returned. Entity failures are logged and
/// listed in the summary.
#[instrument(level = "info", skip_all, fields(entities = config.entities.len()))]
pub async fn run(config: &CodegenConfig) -> Result<RunSummary, Box<dyn Error>> {
    let loader = resolve_from_config(&config.schema, config.root_directory())?;
    let sdl = loader.load().await?;
    let schema = parse_schema(&sdl)?;

    if config.entities.is_empty() {
        warn!("No entities configured, nothing to generate");
    }

    let emitter = TypeScriptEmitter::new(config.output_dir(), config.scalar_table());
    let mut summary = RunSummary::default();

    for result in build_entities(&schema, &config.entities, &config.synthesis_options()) {
        let build = match result {
            Ok(build) => build,
            Err(err) => {
                error!(entity = err.entity(), "{}", err);
                summary.failed.push(err.entity().to_string());
                continue;
            }
        };

        let written = match emitter.emit(&build) {
            Ok(file) => write_emitted(&file).await.map(|_| file.path),
            Err(err) => Err(err),
        };

        match written {
            Ok(path) => summary.generated.push(path),
            Err(err) => {
                error!(entity = build.name, "{}", err);
                summary.failed.push(build.name);
            }
        }
    }

    info!(
        "generated {} file(s), {} entit(ies) failed",
        summary.generated.len(),
        summary.failed.len()
    );

    Ok(summary)
}
