use std::{path::Path, time::Duration};

use config::{Config, File, FileFormat};
use entity_codegen::{OperationKind, DEFAULT_MAX_DEPTH};

use crate::{
    log::{LogFormat, LogLevel},
    parse_yaml_config,
    schema_source::{IntrospectionConfig, SchemaSource, DEFAULT_INTROSPECTION_ENDPOINT},
    CodegenConfig, CodegenConfigError, CommandLineOverrides, EnvVarOverrides,
    EnvVarOverridesError,
};

const DASHBOARDS_CONFIG: &str = r#"
log:
  level: debug
output:
  dir: ./out/
scalars:
  Int: number
  Cursor: string
documents:
  max_depth: 4
entities:
  - name: dashboards
    queries:
      read:
        - name: actor
          type: Actor
          prune: true
          sub_fields:
            - name: entity
              type: Entity
              alias: dashboard
              sub_fields:
                - name: dashboardEntity
                  type: DashboardEntity
                  fragment_name: "... on DashboardEntity"
    mutations:
      create:
        - name: dashboardCreate
          type: DashboardCreateResult
      delete:
        - name: dashboardDelete
          type: DashboardDeleteResult
"#;

fn layered(
    raw: &str,
    env: EnvVarOverrides,
    cli: CommandLineOverrides,
) -> Result<CodegenConfig, CodegenConfigError> {
    let mut config = Config::builder().add_source(File::from_str(raw, FileFormat::Yaml));
    config = env.apply_overrides(config)?;
    config = cli.apply_overrides(config)?;
    Ok(config.build()?.try_deserialize::<CodegenConfig>()?)
}

#[test]
fn empty_config_uses_defaults() -> Result<(), CodegenConfigError> {
    let config = parse_yaml_config("")?;

    assert_eq!(
        config.schema,
        SchemaSource::File {
            path: "./schema.gql".to_string()
        }
    );
    assert_eq!(config.output.dir, "./generated/");
    assert_eq!(config.log.level, LogLevel::Info);
    assert_eq!(config.log.env_filter_str(), "info");
    assert!(config.entities.is_empty());
    assert_eq!(config.synthesis_options().max_depth, Some(DEFAULT_MAX_DEPTH));
    Ok(())
}

#[test]
fn null_max_depth_removes_the_bound() -> Result<(), CodegenConfigError> {
    let config = parse_yaml_config("documents:\n  max_depth: null\n")?;

    assert_eq!(config.synthesis_options().max_depth, None);
    Ok(())
}

#[test]
fn parses_entities_in_declaration_order() -> Result<(), CodegenConfigError> {
    let config = parse_yaml_config(DASHBOARDS_CONFIG)?;

    assert_eq!(config.log.level, LogLevel::Debug);
    assert_eq!(config.synthesis_options().max_depth, Some(4));
    assert_eq!(config.entities.len(), 1);

    let dashboards = &config.entities[0];
    assert_eq!(
        dashboards
            .operations()
            .map(|(kind, operation, _)| format!("{kind} {operation}"))
            .collect::<Vec<_>>(),
        vec!["mutation create", "mutation delete", "query read"]
    );

    let actor = &dashboards.queries["read"][0];
    assert!(actor.prune);
    let entity = &actor.sub_fields[0];
    assert_eq!(entity.response_key(), "dashboard");
    assert_eq!(
        entity.sub_fields[0].fragment_type(),
        Some("DashboardEntity")
    );
    assert_eq!(dashboards.operations().next().map(|(kind, ..)| kind), Some(OperationKind::Mutation));
    Ok(())
}

#[test]
fn scalar_overrides_extend_the_default_table() -> Result<(), CodegenConfigError> {
    let config = parse_yaml_config(DASHBOARDS_CONFIG)?;
    let table = config.scalar_table();

    assert_eq!(table.resolve("Int").primitive, "number");
    assert_eq!(table.resolve("Cursor").primitive, "string");
    assert!(!table.resolve("Cursor").fallback);
    assert_eq!(table.resolve("Float").primitive, "number");
    Ok(())
}

#[test]
fn introspection_source_fills_in_defaults() -> Result<(), CodegenConfigError> {
    let config = parse_yaml_config(
        r#"
schema:
  source: introspection
  api_key: secret
  timeout: 5s
"#,
    )?;

    assert_eq!(
        config.schema,
        SchemaSource::Introspection(IntrospectionConfig {
            endpoint: DEFAULT_INTROSPECTION_ENDPOINT.to_string(),
            api_key: Some("secret".to_string()),
            cache_path: None,
            use_cache: false,
            timeout: Duration::from_secs(5),
            retry_count: 3,
        })
    );
    Ok(())
}

#[test]
fn unknown_keys_are_rejected() {
    let result = parse_yaml_config("output:\n  directory: ./out/\n");

    assert!(matches!(result, Err(CodegenConfigError::ConfigLoadError(_))));
}

#[test]
fn unknown_selection_keys_are_rejected() {
    let result = parse_yaml_config(
        r#"
entities:
  - name: dashboards
    queries:
      read:
        - name: actor
          type: Actor
          prunes: true
"#,
    );

    assert!(result.is_err());
}

#[test]
fn env_overrides_replace_file_values() -> Result<(), CodegenConfigError> {
    let env = EnvVarOverrides {
        log_level: Some(LogLevel::Warn),
        log_format: Some(LogFormat::Json),
        output_dir: Some("./env-out/".to_string()),
        schema_file: Some("./env.graphql".to_string()),
        ..Default::default()
    };

    let config = layered(DASHBOARDS_CONFIG, env, CommandLineOverrides::default())?;

    assert_eq!(config.log.level, LogLevel::Warn);
    assert_eq!(config.log.format, LogFormat::Json);
    assert_eq!(config.output.dir, "./env-out/");
    assert_eq!(
        config.schema,
        SchemaSource::File {
            path: "./env.graphql".to_string()
        }
    );
    Ok(())
}

#[test]
fn command_line_wins_over_env() -> Result<(), CodegenConfigError> {
    let env = EnvVarOverrides {
        log_level: Some(LogLevel::Warn),
        output_dir: Some("./env-out/".to_string()),
        ..Default::default()
    };
    let cli = CommandLineOverrides {
        log_level: Some(LogLevel::Trace),
        output_dir: Some("./cli-out/".to_string()),
        ..Default::default()
    };

    let config = layered(DASHBOARDS_CONFIG, env, cli)?;

    assert_eq!(config.log.level, LogLevel::Trace);
    assert_eq!(config.output.dir, "./cli-out/");
    Ok(())
}

#[test]
fn endpoint_env_switches_to_introspection() -> Result<(), CodegenConfigError> {
    let env = EnvVarOverrides {
        schema_endpoint: Some("https://example.com/graphql".to_string()),
        api_key: Some("secret".to_string()),
        use_cache: Some(true),
        ..Default::default()
    };

    let config = layered("", env, CommandLineOverrides::default())?;

    let SchemaSource::Introspection(introspection) = config.schema else {
        panic!("expected an introspection source");
    };
    assert_eq!(introspection.endpoint, "https://example.com/graphql");
    assert_eq!(introspection.api_key.as_deref(), Some("secret"));
    assert!(introspection.use_cache);
    Ok(())
}

#[test]
fn file_and_endpoint_env_conflict() {
    let env = EnvVarOverrides {
        schema_file: Some("./schema.gql".to_string()),
        schema_endpoint: Some("https://example.com/graphql".to_string()),
        ..Default::default()
    };

    let result = layered("", env, CommandLineOverrides::default());

    assert!(matches!(
        result,
        Err(CodegenConfigError::EnvVarOverridesError(
            EnvVarOverridesError::ConflictingSchemaSource
        ))
    ));
}

#[test]
fn relative_paths_resolve_against_the_root_directory() -> Result<(), CodegenConfigError> {
    let mut config = parse_yaml_config("output:\n  dir: generated\n")?;
    config.root_directory = "/work/project".into();

    assert_eq!(config.output_dir(), Path::new("/work/project/generated"));
    assert_eq!(
        config.resolve_path("/abs/schema.gql"),
        Path::new("/abs/schema.gql")
    );
    Ok(())
}

#[test]
fn log_level_and_format_parse_case_insensitively() {
    assert_eq!("WARN".parse::<LogLevel>(), Ok(LogLevel::Warn));
    assert_eq!("pretty-tree".parse::<LogFormat>(), Ok(LogFormat::PrettyTree));
    assert!("verbose".parse::<LogLevel>().is_err());
}
