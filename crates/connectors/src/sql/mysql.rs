use crate::sql::{
    adapter::SqlAdapter,
    error::DbError,
    redact_url,
    row::DbRow,
};
use async_trait::async_trait;
use model::records::row::RowData;
use mysql_async::{Opts, Pool, Row, prelude::Queryable};
use tracing::{debug, warn};

#[derive(Clone)]
pub struct MySqlAdapter {
    pool: Pool,
}

impl MySqlAdapter {
    pub async fn disconnect(self) {
        if let Err(err) = self.pool.disconnect().await {
            warn!(%err, "MySQL pool did not shut down cleanly");
        }
    }
}

#[async_trait]
impl SqlAdapter for MySqlAdapter {
    async fn connect(url: &str) -> Result<Self, DbError> {
        let opts = Opts::from_url(url).map_err(|e| DbError::InvalidUrl(e.to_string()))?;
        debug!(url = %redact_url(url), "Opening MySQL pool");
        Ok(MySqlAdapter {
            pool: Pool::new(opts),
        })
    }

    async fn query_rows(&self, relation: &str, sql: &str) -> Result<Vec<RowData>, DbError> {
        let mut conn = self.pool.get_conn().await?;
        let rows: Vec<Row> = conn.query(sql).await?;
        drop(conn);

        rows.iter()
            .map(|row| DbRow::MySqlRow(row).to_row_data(relation))
            .collect()
    }
}
