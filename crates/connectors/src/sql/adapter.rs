use crate::sql::{error::DbError, mysql::MySqlAdapter, postgres::PgAdapter};
use async_trait::async_trait;
use model::records::row::RowData;

/// Which driver a connection URL selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseKind {
    MySql,
    Postgres,
}

impl DatabaseKind {
    /// Pick the driver from the URL scheme.
    pub fn from_url(url: &str) -> Result<Self, DbError> {
        let (scheme, _) = url
            .split_once("://")
            .ok_or_else(|| DbError::InvalidUrl(super::redact_url(url)))?;
        match scheme.to_lowercase().as_str() {
            "mysql" => Ok(DatabaseKind::MySql),
            "postgres" | "postgresql" => Ok(DatabaseKind::Postgres),
            other => Err(DbError::UnsupportedDriver(other.to_string())),
        }
    }
}

#[async_trait]
pub trait SqlAdapter {
    async fn connect(url: &str) -> Result<Self, DbError>
    where
        Self: Sized;

    /// Run `sql` and return every row, tagged with `relation`.
    async fn query_rows(&self, relation: &str, sql: &str) -> Result<Vec<RowData>, DbError>;
}

/// A connected driver, chosen from the URL.
#[derive(Clone)]
pub enum Adapter {
    MySql(MySqlAdapter),
    Postgres(PgAdapter),
}

impl Adapter {
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        match DatabaseKind::from_url(url)? {
            DatabaseKind::MySql => Ok(Adapter::MySql(MySqlAdapter::connect(url).await?)),
            DatabaseKind::Postgres => Ok(Adapter::Postgres(PgAdapter::connect(url).await?)),
        }
    }

    pub fn get_sql(&self) -> &(dyn SqlAdapter + Send + Sync) {
        match self {
            Adapter::MySql(adapter) => adapter,
            Adapter::Postgres(adapter) => adapter,
        }
    }

    /// Release pooled connections.
    pub async fn close(self) {
        if let Adapter::MySql(adapter) = self {
            adapter.disconnect().await;
        }
    }
}
