use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_SCHEMA_FILE: &str = "./schema.gql";
pub const DEFAULT_INTROSPECTION_ENDPOINT: &str = "https://api.newrelic.com/graphql";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "source")]
pub enum SchemaSource {
    /// Reads SDL from the filesystem. Relative paths are resolved against the
    /// directory of the configuration file.
    #[serde(rename = "file")]
    File { path: String },
    /// Runs an introspection query against a live endpoint.
    #[serde(rename = "introspection")]
    Introspection(IntrospectionConfig),
}

impl Default for SchemaSource {
    fn default() -> Self {
        SchemaSource::File {
            path: DEFAULT_SCHEMA_FILE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct IntrospectionConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Sent as the `API-Key` header.
    ///
    /// Can also be set via the `CODEGEN_API_KEY` environment variable or `--api-key`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Where the printed SDL of a successful introspection is written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_path: Option<String>,
    /// Read `cache_path` instead of introspecting when the file exists.
    #[serde(default)]
    pub use_cache: bool,
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
}

impl Default for IntrospectionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
            cache_path: None,
            use_cache: false,
            timeout: default_timeout(),
            retry_count: default_retry_count(),
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_INTROSPECTION_ENDPOINT.to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_retry_count() -> u32 {
    3
}
