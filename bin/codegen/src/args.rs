use clap::Parser;
use entity_codegen_config::{log::LogLevel, CommandLineOverrides};

/// Generates TypeScript entity declarations and GraphQL operations from a schema.
#[derive(Debug, Parser)]
#[command(name = "entity_codegen", version)]
pub struct Args {
    /// Path to the configuration file. Defaults to `codegen.config.yaml` in the working directory.
    #[arg(long, short, env = "CODEGEN_CONFIG_FILE_PATH")]
    pub config: Option<String>,
    /// Set the logging level
    #[arg(long, short)]
    pub log_level: Option<LogLevel>,
    /// Directory the generated files are written to
    #[arg(long, short)]
    pub output_dir: Option<String>,
    /// Read the schema from this SDL file instead of the configured source
    #[arg(long, short)]
    pub schema_file: Option<String>,
    /// API key sent with the introspection request
    #[arg(long = "api-key", short = 'k')]
    pub api_key: Option<String>,
}

impl Args {
    pub fn overrides(&self) -> CommandLineOverrides {
        CommandLineOverrides {
            log_level: self.log_level,
            output_dir: self.output_dir.clone(),
            schema_file: self.schema_file.clone(),
            api_key: self.api_key.clone(),
        }
    }
}
