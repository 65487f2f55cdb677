use std::path::PathBuf;

use async_trait::async_trait;
use cynic::{GraphQlResponse, QueryBuilder};
use cynic_introspection::query::IntrospectionQuery;
use entity_codegen_config::schema_source::IntrospectionConfig;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::RetryTransientMiddleware;
use retry_policies::policies::ExponentialBackoff;
use tokio::fs;
use tracing::{debug, info, trace};

use crate::schema_loader::{LoadSchemaError, SchemaLoader};

pub struct IntrospectionLoader {
    endpoint: String,
    cache_path: Option<PathBuf>,
    use_cache: bool,
    client: ClientWithMiddleware,
}

impl IntrospectionLoader {
    pub fn try_new(
        config: &IntrospectionConfig,
        cache_path: Option<PathBuf>,
    ) -> Result<Box<Self>, LoadSchemaError> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &config.api_key {
            let mut value =
                HeaderValue::from_str(api_key).map_err(|_| LoadSchemaError::InvalidApiKey)?;
            value.set_sensitive(true);
            headers.insert(HeaderName::from_static("api-key"), value);
        }

        let agent = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("entity-codegen/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(LoadSchemaError::ClientCreationError)?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.retry_count);
        let client = ClientBuilder::new(agent)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        debug!(
            endpoint = config.endpoint,
            "Creating schema source from introspection"
        );

        Ok(Box::new(Self {
            endpoint: config.endpoint.clone(),
            cache_path,
            use_cache: config.use_cache,
            client,
        }))
    }

    async fn read_cache(&self) -> Option<String> {
        let cache_path = self.cache_path.as_ref()?;
        if !self.use_cache {
            return None;
        }

        match fs::read_to_string(cache_path).await {
            Ok(sdl) => {
                info!(
                    cache_path = %cache_path.display(),
                    "Schema loaded from introspection cache"
                );
                Some(sdl)
            }
            Err(err) => {
                debug!(
                    cache_path = %cache_path.display(),
                    "Introspection cache unavailable, introspecting: {}",
                    err
                );
                None
            }
        }
    }

    async fn write_cache(&self, sdl: &str) -> Result<(), LoadSchemaError> {
        let Some(cache_path) = &self.cache_path else {
            return Ok(());
        };
        let write_error = |source| LoadSchemaError::WriteCacheError {
            path: cache_path.display().to_string(),
            source,
        };

        if let Some(parent) = cache_path.parent() {
            fs::create_dir_all(parent).await.map_err(write_error)?;
        }
        fs::write(cache_path, sdl).await.map_err(write_error)?;

        debug!(cache_path = %cache_path.display(), "Introspection cache written");
        Ok(())
    }

    async fn introspect(&self) -> Result<String, LoadSchemaError> {
        let operation = IntrospectionQuery::build(());
        let response = self
            .client
            .post(&self.endpoint)
            .json(&operation)
            .send()
            .await?
            .error_for_status()?;

        let body = response.json::<GraphQlResponse<IntrospectionQuery>>().await?;
        sdl_from_response(body)
    }
}

#[async_trait]
impl SchemaLoader for IntrospectionLoader {
    async fn load(&self) -> Result<String, LoadSchemaError> {
        if let Some(sdl) = self.read_cache().await {
            return Ok(sdl);
        }

        debug!(endpoint = self.endpoint, "Loading schema from introspection");
        let sdl = self.introspect().await?;
        info!(
            endpoint = self.endpoint,
            "Schema successfully loaded from introspection"
        );
        trace!("Introspected schema: {}", sdl);

        self.write_cache(&sdl).await?;
        Ok(sdl)
    }
}

/// Prints the introspected schema as SDL. GraphQL errors in the response fail the load.
pub fn sdl_from_response(
    response: GraphQlResponse<IntrospectionQuery>,
) -> Result<String, LoadSchemaError> {
    if let Some(errors) = response.errors.filter(|errors| !errors.is_empty()) {
        let messages = errors
            .iter()
            .map(|error| error.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(LoadSchemaError::IntrospectionError(messages));
    }

    let schema = response
        .data
        .ok_or_else(|| LoadSchemaError::IntrospectionError("response has no data".to_string()))?
        .into_schema()
        .map_err(|err| LoadSchemaError::IntrospectionError(err.to_string()))?;

    Ok(schema.to_sdl())
}
