use crate::sql::{
    adapter::SqlAdapter,
    error::DbError,
    row::DbRow,
};
use async_trait::async_trait;
use model::records::row::RowData;
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use std::sync::Arc;
use tokio_postgres::{Client, Config, NoTls, config::SslMode};
use tracing::{error, warn};

#[derive(Clone)]
pub struct PgAdapter {
    client: Arc<Client>,
}

#[async_trait]
impl SqlAdapter for PgAdapter {
    async fn connect(url: &str) -> Result<Self, DbError> {
        let client = connect_client(url).await?;
        Ok(PgAdapter {
            client: Arc::new(client),
        })
    }

    async fn query_rows(&self, relation: &str, sql: &str) -> Result<Vec<RowData>, DbError> {
        let rows = self.client.query(sql, &[]).await?;
        rows.iter()
            .map(|row| DbRow::PostgresRow(row).to_row_data(relation))
            .collect()
    }
}

pub async fn connect_client(url: &str) -> Result<Client, DbError> {
    let config = url
        .parse::<Config>()
        .map_err(|e| DbError::InvalidUrl(e.to_string()))?;

    match config.get_ssl_mode() {
        SslMode::Disable => connect_without_tls(config).await,
        SslMode::Prefer => match connect_with_tls(config.clone()).await {
            Ok(client) => Ok(client),
            Err(error) => {
                warn!(%error, "Postgres TLS handshake failed, retrying without TLS");
                connect_without_tls(config).await
            }
        },
        _ => connect_with_tls(config).await,
    }
}

async fn connect_with_tls(config: Config) -> Result<Client, DbError> {
    let connector = TlsConnector::builder().build()?;
    let tls = MakeTlsConnector::new(connector);
    let (client, connection) = config.connect(tls).await?;
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            error!(%err, "Postgres connection error");
        }
    });
    Ok(client)
}

async fn connect_without_tls(config: Config) -> Result<Client, DbError> {
    let (client, connection) = config.connect(NoTls).await?;
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            error!(%err, "Postgres connection error");
        }
    });
    Ok(client)
}
