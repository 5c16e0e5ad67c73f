pub mod memory;

use async_trait::async_trait;
use log::info;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::cli::Args;

/// Equality predicate on one row field.
#[derive(Debug, Clone)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self { field: field.into(), value: value.into() }
    }
}

/// Single-field sort; `descending` gives newest-first listings.
#[derive(Debug, Clone)]
pub struct OrderBy {
    pub field: String,
    pub descending: bool,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unsupported store type '{0}'")]
    UnsupportedType(String),
    #[error("store rows must be JSON objects")]
    MalformedRow,
}

/// Table-scoped select/insert/delete over JSON rows, the shape the hosted
/// backend exposes. Implementations own their concurrency.
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn select(
        &self,
        table: &str,
        filters: &[Filter],
        order: Option<&OrderBy>,
    ) -> Result<Vec<Value>, StoreError>;

    async fn insert(&self, table: &str, row: Value) -> Result<Value, StoreError>;

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<usize, StoreError>;
}

/// Builds the configured data store. `none` disables the catalog surfaces;
/// callers must treat the absent capability as a configuration error
/// rather than degrade silently.
pub fn create_data_store(args: &Args) -> Result<Option<Arc<dyn DataStore>>, StoreError> {
    match args.store_type.to_lowercase().as_str() {
        "memory" => {
            info!("Catalog rows will be stored in: memory");
            Ok(Some(Arc::new(memory::MemoryStore::new())))
        }
        "none" => Ok(None),
        other => Err(StoreError::UnsupportedType(other.to_string())),
    }
}
