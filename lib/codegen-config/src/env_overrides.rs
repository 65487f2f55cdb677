use config::{builder::BuilderState, ConfigBuilder, ConfigError};
use envconfig::Envconfig;
use tracing::debug;

use crate::log::{LogFormat, LogLevel};

#[derive(Envconfig, Default)]
pub struct EnvVarOverrides {
    // Logger overrides
    #[envconfig(from = "LOG_LEVEL")]
    pub log_level: Option<LogLevel>,
    #[envconfig(from = "LOG_FORMAT")]
    pub log_format: Option<LogFormat>,
    #[envconfig(from = "LOG_FILTER")]
    pub log_filter: Option<String>,

    // Output overrides
    #[envconfig(from = "CODEGEN_OUTPUT_DIR")]
    pub output_dir: Option<String>,

    // Schema overrides
    #[envconfig(from = "CODEGEN_SCHEMA_FILE")]
    pub schema_file: Option<String>,
    #[envconfig(from = "CODEGEN_SCHEMA_ENDPOINT")]
    pub schema_endpoint: Option<String>,
    #[envconfig(from = "CODEGEN_API_KEY")]
    pub api_key: Option<String>,
    #[envconfig(from = "CODEGEN_USE_CACHE")]
    pub use_cache: Option<bool>,
}

#[derive(Debug, thiserror::Error)]
pub enum EnvVarOverridesError {
    #[error("Failed to override configuration: {0}")]
    FailedToOverrideConfig(#[from] ConfigError),
    #[error("Cannot override schema source due to conflict: CODEGEN_SCHEMA_FILE and CODEGEN_SCHEMA_ENDPOINT cannot be used together")]
    ConflictingSchemaSource,
}

impl EnvVarOverrides {
    pub fn apply_overrides<T: BuilderState>(
        mut self,
        mut config: ConfigBuilder<T>,
    ) -> Result<ConfigBuilder<T>, EnvVarOverridesError> {
        if let Some(log_level) = self.log_level.take() {
            debug!("[config-override] 'log.level' = {:?}", log_level);
            config = config.set_override("log.level", log_level.as_str())?;
        }
        if let Some(log_format) = self.log_format.take() {
            debug!("[config-override] 'log.format' = {:?}", log_format);
            config = config.set_override("log.format", log_format.as_str())?;
        }
        if let Some(log_filter) = self.log_filter.take() {
            debug!("[config-override] 'log.filter' = {:?}", log_filter);
            config = config.set_override("log.filter", log_filter)?;
        }

        if let Some(output_dir) = self.output_dir.take() {
            debug!("[config-override] 'output.dir' = {}", output_dir);
            config = config.set_override("output.dir", output_dir)?;
        }

        if self.schema_file.is_some() && self.schema_endpoint.is_some() {
            return Err(EnvVarOverridesError::ConflictingSchemaSource);
        }

        if let Some(schema_file) = self.schema_file.take() {
            debug!("[config-override] 'schema.path' = {}", schema_file);
            config = config.set_override("schema.source", "file")?;
            config = config.set_override("schema.path", schema_file)?;
        }

        if let Some(schema_endpoint) = self.schema_endpoint.take() {
            debug!("[config-override] 'schema.endpoint' = {}", schema_endpoint);
            config = config.set_override("schema.source", "introspection")?;
            config = config.set_override("schema.endpoint", schema_endpoint)?;
        }

        // Ignored by a file source.
        if let Some(api_key) = self.api_key.take() {
            debug!("[config-override] 'schema.api_key' = <redacted>");
            config = config.set_override("schema.api_key", api_key)?;
        }
        if let Some(use_cache) = self.use_cache.take() {
            debug!("[config-override] 'schema.use_cache' = {}", use_cache);
            config = config.set_override("schema.use_cache", use_cache)?;
        }

        Ok(config)
    }
}

/// Values given on the command line. Applied after the environment, so they win.
#[derive(Debug, Clone, Default)]
pub struct CommandLineOverrides {
    pub log_level: Option<LogLevel>,
    pub output_dir: Option<String>,
    pub schema_file: Option<String>,
    pub api_key: Option<String>,
}

impl CommandLineOverrides {
    pub fn apply_overrides<T: BuilderState>(
        self,
        mut config: ConfigBuilder<T>,
    ) -> Result<ConfigBuilder<T>, EnvVarOverridesError> {
        if let Some(log_level) = self.log_level {
            debug!("[cli-override] 'log.level' = {:?}", log_level);
            config = config.set_override("log.level", log_level.as_str())?;
        }
        if let Some(output_dir) = self.output_dir {
            debug!("[cli-override] 'output.dir' = {}", output_dir);
            config = config.set_override("output.dir", output_dir)?;
        }
        if let Some(schema_file) = self.schema_file {
            debug!("[cli-override] 'schema.path' = {}", schema_file);
            config = config.set_override("schema.source", "file")?;
            config = config.set_override("schema.path", schema_file)?;
        }
        if let Some(api_key) = self.api_key {
            debug!("[cli-override] 'schema.api_key' = <redacted>");
            config = config.set_override("schema.api_key", api_key)?;
        }
        Ok(config)
    }
}
