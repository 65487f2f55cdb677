use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info};

use crate::schema_loader::{LoadSchemaError, SchemaLoader};

pub struct SchemaFileLoader {
    file_path: PathBuf,
}

impl SchemaFileLoader {
    pub fn new(file_path: PathBuf) -> Box<Self> {
        Box::new(Self { file_path })
    }
}

#[async_trait]
impl SchemaLoader for SchemaFileLoader {
    async fn load(&self) -> Result<String, LoadSchemaError> {
        let file_path = self.file_path.display().to_string();
        debug!(file_path, "Loading schema from file");

        let sdl = fs::read_to_string(&self.file_path)
            .await
            .map_err(|source| LoadSchemaError::ReadFileError {
                path: file_path.clone(),
                source,
            })?;

        info!(file_path, "Schema successfully loaded from a local file");
        Ok(sdl)
    }
}
