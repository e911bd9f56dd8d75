use thiserror::Error;

/// All errors coming from the database/query layer.
#[derive(Debug, Error)]
pub enum DbError {
    /// MySQL driver error.
    #[error("MySQL error: {0}")]
    MySql(#[from] mysql_async::Error),

    /// PostgreSQL driver error.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// TLS setup for a Postgres connection failed.
    #[error("TLS error: {0}")]
    Tls(#[from] native_tls::Error),

    /// The connection string could not be parsed.
    #[error("Invalid connection URL: {0}")]
    InvalidUrl(String),

    /// The URL scheme names a driver we do not ship.
    #[error("Unsupported driver: {0}")]
    UnsupportedDriver(String),

    /// A column value could not be converted into a scalar.
    #[error("Cannot read column '{column}': {reason}")]
    Conversion { column: String, reason: String },
}
