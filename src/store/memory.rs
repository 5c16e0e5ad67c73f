use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{DataStore, Filter, OrderBy, StoreError};

/// In-process table store: JSON object rows grouped by table name.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches(row: &Value, filters: &[Filter]) -> bool {
    filters.iter().all(|filter| row.get(&filter.field) == Some(&filter.value))
}

fn compare_fields(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            x.as_f64().partial_cmp(&y.as_f64()).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn select(
        &self,
        table: &str,
        filters: &[Filter],
        order: Option<&OrderBy>,
    ) -> Result<Vec<Value>, StoreError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Value> = tables
            .get(table)
            .map(|rows| rows.iter().filter(|row| matches(row, filters)).cloned().collect())
            .unwrap_or_default();

        if let Some(order) = order {
            rows.sort_by(|a, b| {
                let ordering = compare_fields(a.get(&order.field), b.get(&order.field));
                if order.descending { ordering.reverse() } else { ordering }
            });
        }

        Ok(rows)
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, StoreError> {
        if !row.is_object() {
            return Err(StoreError::MalformedRow);
        }
        let mut tables = self.tables.write().await;
        tables.entry(table.to_string()).or_default().push(row.clone());
        Ok(row)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<usize, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(rows) = tables.get_mut(table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|row| !matches(row, filters));
        Ok(before - rows.len())
    }
}
