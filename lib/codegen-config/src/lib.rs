mod env_overrides;
pub mod log;
pub mod schema_source;

use std::path::{Path, PathBuf};

use config::{Config, File, FileFormat, FileSourceFile};
use entity_codegen::{EntityConfig, ScalarTable, SynthesisOptions, DEFAULT_MAX_DEPTH};
use envconfig::Envconfig;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub use crate::env_overrides::{CommandLineOverrides, EnvVarOverrides, EnvVarOverridesError};
use crate::{log::LoggingConfig, schema_source::SchemaSource};

pub const DEFAULT_OUTPUT_DIR: &str = "./generated/";

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CodegenConfig {
    #[serde(skip)]
    root_directory: PathBuf,

    /// The logger configuration.
    ///
    /// By default only progress messages, warnings and errors are printed (`info`).
    #[serde(default)]
    pub log: LoggingConfig,

    /// Where the schema comes from. Defaults to a local file (`./schema.gql`).
    #[serde(default)]
    pub schema: SchemaSource,

    #[serde(default)]
    pub output: OutputConfig,

    /// Extra or replacement scalar mappings, merged over the built-in table.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub scalars: IndexMap<String, String>,

    #[serde(default)]
    pub documents: DocumentsConfig,

    /// One entry per generated entity file.
    #[serde(default)]
    pub entities: Vec<EntityConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

fn default_output_dir() -> String {
    DEFAULT_OUTPUT_DIR.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentsConfig {
    /// Bounds how deep unselected schema types are expanded, `10` when omitted.
    /// `null` removes the bound; only cycles along one path are cut then, so types
    /// that fan out into shared types make the documents grow exponentially.
    #[serde(default = "default_max_depth")]
    pub max_depth: Option<usize>,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

fn default_max_depth() -> Option<usize> {
    Some(DEFAULT_MAX_DEPTH)
}

impl CodegenConfig {
    /// Directory of the loaded configuration file, or the working directory.
    pub fn root_directory(&self) -> &Path {
        &self.root_directory
    }

    /// Joins relative paths onto the configuration root.
    pub fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root_directory.join(path)
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.resolve_path(&self.output.dir)
    }

    pub fn synthesis_options(&self) -> SynthesisOptions {
        SynthesisOptions {
            max_depth: self.documents.max_depth,
        }
    }

    pub fn scalar_table(&self) -> ScalarTable {
        ScalarTable::default().with_overrides(
            self.scalars
                .iter()
                .map(|(scalar, primitive)| (scalar.clone(), primitive.clone())),
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CodegenConfigError {
    #[error("Failed to load configuration: {0}")]
    ConfigLoadError(#[from] config::ConfigError),
    #[error("Failed to apply configuration overrides: {0}")]
    EnvVarOverridesError(#[from] EnvVarOverridesError),
    #[error("Failed to read environment variables: {0}")]
    EnvVarLoadError(#[from] envconfig::Error),
    #[error("Failed to get current directory: {0}")]
    CurrentDirError(std::io::Error),
    #[error("Configuration path '{0}' has no file name")]
    InvalidConfigPath(String),
}

static DEFAULT_FILE_NAMES: &[&str] = &[
    "codegen.config.yaml",
    "codegen.config.yml",
    "codegen.config.json",
];

fn get_current_dir() -> Result<PathBuf, CodegenConfigError> {
    std::env::current_dir().map_err(CodegenConfigError::CurrentDirError)
}

/// Loads the configuration file, then layers environment variables and command
/// line values on top of it, in that order.
pub fn load_config(
    override_config_path: Option<String>,
    cli_overrides: CommandLineOverrides,
) -> Result<CodegenConfig, CodegenConfigError> {
    let env_overrides = EnvVarOverrides::init_from_env()?;
    let mut config = Config::builder();
    let mut config_root_path = get_current_dir()?;

    if let Some(path_str) = override_config_path {
        let path_buf = PathBuf::from(&path_str);
        if path_buf.file_name().is_none() {
            return Err(CodegenConfigError::InvalidConfigPath(path_str));
        }
        if let Some(parent_dir) = path_buf.parent() {
            config_root_path = config_root_path.join(parent_dir);
        }
        let as_file: File<FileSourceFile, _> = path_buf.into();
        config = config.add_source(as_file.required(true));
    } else {
        for name in DEFAULT_FILE_NAMES {
            config = config.add_source(File::with_name(name).required(false));
        }
    }

    config = env_overrides.apply_overrides(config)?;
    config = cli_overrides.apply_overrides(config)?;

    let mut base_cfg = config.build()?.try_deserialize::<CodegenConfig>()?;
    base_cfg.root_directory = config_root_path;

    Ok(base_cfg)
}

pub fn parse_yaml_config(config_raw: &str) -> Result<CodegenConfig, CodegenConfigError> {
    let mut base_cfg = Config::builder()
        .add_source(File::from_str(config_raw, FileFormat::Yaml))
        .build()?
        .try_deserialize::<CodegenConfig>()?;
    base_cfg.root_directory = get_current_dir()?;

    Ok(base_cfg)
}

#[cfg(test)]
mod tests;
