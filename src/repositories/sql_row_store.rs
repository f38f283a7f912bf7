//! Postgres-backed row store.
//!
//! Identifiers cannot be bound as parameters, so table and column names come
//! only from [`TableDescriptor`] and [`PersonField`], both of which are
//! validated or static. Every value is bound.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::time::Duration;

use crate::domain::TableDescriptor;
use crate::error::{GatewayError, GatewayResult};
use crate::models::{PersonField, PersonLookup, PersonRecord};
use crate::repositories::traits::RowStoreGateway;
use crate::resilience::{retry, RetryConfig};

/// Row store reading person rows through a sqlx connection pool.
#[derive(Clone)]
pub struct SqlRowStore {
    pool: PgPool,
}

impl SqlRowStore {
    /// Connect with startup-mode retry (fails fast if the URL is wrong).
    pub async fn connect(connection_string: &str) -> GatewayResult<Self> {
        let pool = retry("sql_connect", &RetryConfig::startup(), || async {
            PgPoolOptions::new()
                .max_connections(10)
                .acquire_timeout(Duration::from_secs(10))
                .idle_timeout(Duration::from_secs(300))
                .connect(connection_string)
                .await
                .map_err(map_sqlx_error)
        })
        .await?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a clone of the connection pool.
    pub fn pool(&self) -> PgPool {
        self.pool.clone()
    }
}

/// Comma-separated column list in record order.
fn column_list() -> String {
    PersonField::ALL
        .iter()
        .map(|f| f.column())
        .collect::<Vec<_>>()
        .join(", ")
}

/// `ORDER BY` clause: the order key first, the remaining columns as tie-breakers
/// so that rows with equal keys still page deterministically.
fn order_clause(order_key: PersonField) -> String {
    let mut columns = vec![order_key.column()];
    columns.extend(
        PersonField::ALL
            .iter()
            .filter(|f| **f != order_key)
            .map(|f| f.column()),
    );
    columns.join(", ")
}

pub(crate) fn page_sql(table: &TableDescriptor, order_key: PersonField) -> String {
    format!(
        "SELECT {} FROM {} ORDER BY {} LIMIT $1 OFFSET $2",
        column_list(),
        table.qualified_name(),
        order_clause(order_key)
    )
}

pub(crate) fn lookup_sql(table: &TableDescriptor) -> String {
    format!(
        "SELECT {} FROM {} WHERE first_name = $1 AND last_name = $2 AND preferred_name LIKE $3",
        column_list(),
        table.qualified_name()
    )
}

fn record_from_row(row: &PgRow) -> GatewayResult<PersonRecord> {
    let text = |column: &str| -> GatewayResult<Option<String>> {
        row.try_get::<Option<String>, _>(column)
            .map_err(map_sqlx_error)
    };

    Ok(PersonRecord {
        first_name: text("first_name")?,
        last_name: text("last_name")?,
        preferred_name: text("preferred_name")?,
        city: text("city")?,
        state: text("state")?,
        zip_code: text("zip_code")?,
        date_of_birth: row.try_get("dob").map_err(map_sqlx_error)?,
        email: text("email")?,
    })
}

/// Transport-level failures are retryable connection errors; everything the
/// database itself rejects is a query error.
fn map_sqlx_error(error: sqlx::Error) -> GatewayError {
    match error {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Protocol(_) => GatewayError::Connection(error.to_string()),
        other => GatewayError::Query(other.to_string()),
    }
}

#[async_trait]
impl RowStoreGateway for SqlRowStore {
    async fn count(&self, table: &TableDescriptor) -> GatewayResult<u64> {
        let sql = format!("SELECT COUNT(*) AS cnt FROM {}", table.qualified_name());
        let row = sqlx::query(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        let count: i64 = row.try_get("cnt").map_err(map_sqlx_error)?;
        Ok(count.max(0) as u64)
    }

    async fn fetch_page(
        &self,
        table: &TableDescriptor,
        order_key: PersonField,
        offset: u64,
        limit: usize,
    ) -> GatewayResult<Vec<PersonRecord>> {
        let sql = page_sql(table, order_key);
        let rows = sqlx::query(&sql)
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.iter().map(record_from_row).collect()
    }

    async fn lookup(
        &self,
        table: &TableDescriptor,
        lookup: &PersonLookup,
    ) -> GatewayResult<Vec<PersonRecord>> {
        let sql = lookup_sql(table);
        let rows = sqlx::query(&sql)
            .bind(&lookup.first_name)
            .bind(&lookup.last_name)
            .bind(&lookup.preferred_name_pattern)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.iter().map(record_from_row).collect()
    }
}
