use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::TableDescriptor;
use crate::error::{GatewayError, GatewayResult};
use crate::models::{PersonField, PersonLookup, PersonRecord};
use crate::repositories::traits::RowStoreGateway;
use crate::search::analysis::like_regex;

/// Row store held in memory, keyed by table.
///
/// Pages are ordered the same way the SQL store orders them: by the order key,
/// then by every other column, with missing values last.
#[derive(Clone, Default)]
pub struct InMemoryRowStore {
    tables: Arc<RwLock<HashMap<TableDescriptor, Vec<PersonRecord>>>>,
}

impl InMemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with one table already populated.
    pub fn with_table(table: TableDescriptor, records: Vec<PersonRecord>) -> Self {
        let mut tables = HashMap::new();
        tables.insert(table, records);
        Self {
            tables: Arc::new(RwLock::new(tables)),
        }
    }

    /// Append rows to a table, creating it if needed.
    pub async fn insert(&self, table: &TableDescriptor, records: Vec<PersonRecord>) {
        self.tables
            .write()
            .await
            .entry(table.clone())
            .or_default()
            .extend(records);
    }

    /// Remove every row past the first `len`.
    pub async fn truncate(&self, table: &TableDescriptor, len: usize) {
        if let Some(rows) = self.tables.write().await.get_mut(table) {
            rows.truncate(len);
        }
    }

    async fn sorted_rows(
        &self,
        table: &TableDescriptor,
        order_key: PersonField,
    ) -> GatewayResult<Vec<PersonRecord>> {
        let tables = self.tables.read().await;
        let rows = tables.get(table).ok_or_else(|| missing_table(table))?;

        let mut sorted = rows.clone();
        sorted.sort_by(|a, b| compare_rows(a, b, order_key));
        Ok(sorted)
    }
}

fn missing_table(table: &TableDescriptor) -> GatewayError {
    GatewayError::Query(format!("relation \"{}\" does not exist", table))
}

/// Compare a single column, placing missing values after present ones.
fn compare_column(a: Option<String>, b: Option<String>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_rows(a: &PersonRecord, b: &PersonRecord, order_key: PersonField) -> Ordering {
    std::iter::once(order_key)
        .chain(PersonField::ALL.into_iter().filter(|f| *f != order_key))
        .map(|field| compare_column(a.column_text(field), b.column_text(field)))
        .find(|ordering| *ordering != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

#[async_trait]
impl RowStoreGateway for InMemoryRowStore {
    async fn count(&self, table: &TableDescriptor) -> GatewayResult<u64> {
        let tables = self.tables.read().await;
        let rows = tables.get(table).ok_or_else(|| missing_table(table))?;
        Ok(rows.len() as u64)
    }

    async fn fetch_page(
        &self,
        table: &TableDescriptor,
        order_key: PersonField,
        offset: u64,
        limit: usize,
    ) -> GatewayResult<Vec<PersonRecord>> {
        let rows = self.sorted_rows(table, order_key).await?;
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    async fn lookup(
        &self,
        table: &TableDescriptor,
        lookup: &PersonLookup,
    ) -> GatewayResult<Vec<PersonRecord>> {
        let pattern = like_regex(&lookup.preferred_name_pattern)
            .map_err(|e| GatewayError::Query(format!("invalid LIKE pattern: {}", e)))?;

        let tables = self.tables.read().await;
        let rows = tables.get(table).ok_or_else(|| missing_table(table))?;

        Ok(rows
            .iter()
            .filter(|r| r.first_name.as_deref() == Some(lookup.first_name.as_str()))
            .filter(|r| r.last_name.as_deref() == Some(lookup.last_name.as_str()))
            .filter(|r| {
                r.preferred_name
                    .as_deref()
                    .map(|p| pattern.is_match(p))
                    .unwrap_or(false)
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TableDescriptor {
        TableDescriptor::new("persons").unwrap()
    }

    #[tokio::test]
    async fn test_pages_are_ordered_and_stable() {
        let store = InMemoryRowStore::with_table(
            table(),
            vec![
                PersonRecord::named("Zoe", "Adams"),
                PersonRecord::named("Amit", "Patel"),
                PersonRecord::named("Amit", "Bose"),
                PersonRecord::default(),
            ],
        );

        let first = store
            .fetch_page(&table(), PersonField::FirstName, 0, 3)
            .await
            .unwrap();
        let names: Vec<_> = first
            .iter()
            .map(|r| r.last_name.clone().unwrap_or_default())
            .collect();
        assert_eq!(names, vec!["Bose", "Patel", "Adams"]);

        let again = store
            .fetch_page(&table(), PersonField::FirstName, 0, 3)
            .await
            .unwrap();
        assert_eq!(first, again);

        let rest = store
            .fetch_page(&table(), PersonField::FirstName, 3, 3)
            .await
            .unwrap();
        assert_eq!(rest, vec![PersonRecord::default()]);
    }

    #[tokio::test]
    async fn test_lookup_uses_like_semantics() {
        let store = InMemoryRowStore::with_table(
            table(),
            vec![
                PersonRecord::named("Rahul", "Sharma"),
                PersonRecord::named("Rahul", "Verma"),
            ],
        );

        let found = store
            .lookup(&table(), &PersonLookup::new("Rahul", "Sharma", "Rah%"))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);

        let none = store
            .lookup(&table(), &PersonLookup::new("Rahul", "Sharma", "rah%"))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_missing_table_is_query_error() {
        let store = InMemoryRowStore::new();
        let err = store.count(&table()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Query(_)));
    }
}
