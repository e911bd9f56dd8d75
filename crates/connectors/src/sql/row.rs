use crate::sql::error::DbError;
use bigdecimal::ToPrimitive as _;
use core::fmt;
use model::{
    core::value::{FieldValue, Value},
    records::row::RowData,
};
use mysql_async::{Row as MySqlRow, consts::ColumnType, prelude::FromValue};
use rust_decimal::Decimal;
use std::fmt::Formatter;
use tokio_postgres::{Row as PgRow, types::Type};

/// A driver row, read column by column into [`RowData`].
pub enum DbRow<'a> {
    MySqlRow(&'a MySqlRow),
    PostgresRow(&'a PgRow),
}

impl DbRow<'_> {
    pub fn to_row_data(&self, relation: &str) -> Result<RowData, DbError> {
        let fields = self
            .columns()
            .into_iter()
            .enumerate()
            .map(|(idx, name)| {
                let value = self.get_value(idx, &name)?;
                Ok(FieldValue::new(name, value))
            })
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(RowData::new(relation, fields))
    }

    pub fn columns(&self) -> Vec<String> {
        match self {
            DbRow::MySqlRow(row) => row
                .columns_ref()
                .iter()
                .map(|col| col.name_str().into_owned())
                .collect(),
            DbRow::PostgresRow(row) => row
                .columns()
                .iter()
                .map(|col| col.name().to_string())
                .collect(),
        }
    }

    /// Read column `idx`. `Ok(None)` means SQL NULL.
    pub fn get_value(&self, idx: usize, name: &str) -> Result<Option<Value>, DbError> {
        match self {
            DbRow::MySqlRow(row) => Self::mysql_value(row, idx, name),
            DbRow::PostgresRow(row) => Self::pg_value(row, idx, name),
        }
    }

    fn mysql_value(row: &MySqlRow, idx: usize, name: &str) -> Result<Option<Value>, DbError> {
        let column_type = row
            .columns_ref()
            .get(idx)
            .map(|col| col.column_type())
            .ok_or_else(|| conversion(name, "column index out of range"))?;

        let value = match column_type {
            ColumnType::MYSQL_TYPE_NULL => None,
            ColumnType::MYSQL_TYPE_DECIMAL | ColumnType::MYSQL_TYPE_NEWDECIMAL => {
                match mysql_get::<bigdecimal::BigDecimal>(row, idx, name)? {
                    Some(decimal) => Some(Value::Float(
                        decimal
                            .to_f64()
                            .ok_or_else(|| conversion(name, "decimal out of f64 range"))?,
                    )),
                    None => None,
                }
            }
            ColumnType::MYSQL_TYPE_DOUBLE | ColumnType::MYSQL_TYPE_FLOAT => {
                mysql_get::<f64>(row, idx, name)?.map(Value::Float)
            }
            ColumnType::MYSQL_TYPE_TINY
            | ColumnType::MYSQL_TYPE_SHORT
            | ColumnType::MYSQL_TYPE_INT24
            | ColumnType::MYSQL_TYPE_LONG
            | ColumnType::MYSQL_TYPE_LONGLONG => mysql_get::<i64>(row, idx, name)?.map(Value::Int),
            _ => mysql_get::<String>(row, idx, name)?.map(Value::String),
        };

        Ok(value)
    }

    fn pg_value(row: &PgRow, idx: usize, name: &str) -> Result<Option<Value>, DbError> {
        let column_type = row
            .columns()
            .get(idx)
            .map(|col| col.type_().clone())
            .ok_or_else(|| conversion(name, "column index out of range"))?;

        let value = if column_type == Type::FLOAT8 {
            pg_get::<f64>(row, idx, name)?.map(Value::Float)
        } else if column_type == Type::FLOAT4 {
            pg_get::<f32>(row, idx, name)?.map(|v| Value::Float(v as f64))
        } else if column_type == Type::NUMERIC {
            match pg_get::<Decimal>(row, idx, name)? {
                Some(decimal) => Some(Value::Float(
                    rust_decimal::prelude::ToPrimitive::to_f64(&decimal)
                        .ok_or_else(|| conversion(name, "numeric out of f64 range"))?,
                )),
                None => None,
            }
        } else if column_type == Type::INT8 {
            pg_get::<i64>(row, idx, name)?.map(Value::Int)
        } else if column_type == Type::INT4 {
            pg_get::<i32>(row, idx, name)?.map(|v| Value::Int(v as i64))
        } else if column_type == Type::INT2 {
            pg_get::<i16>(row, idx, name)?.map(|v| Value::Int(v as i64))
        } else if column_type == Type::BOOL {
            pg_get::<bool>(row, idx, name)?.map(Value::Boolean)
        } else {
            pg_get::<String>(row, idx, name)?.map(Value::String)
        };

        Ok(value)
    }
}

fn mysql_get<T: FromValue>(row: &MySqlRow, idx: usize, name: &str) -> Result<Option<T>, DbError> {
    match row.get_opt::<Option<T>, usize>(idx) {
        Some(Ok(value)) => Ok(value),
        Some(Err(err)) => Err(conversion(name, format!("{err:?}"))),
        None => Err(conversion(name, "value already taken or missing")),
    }
}

fn pg_get<'a, T>(row: &'a PgRow, idx: usize, name: &str) -> Result<Option<T>, DbError>
where
    T: tokio_postgres::types::FromSql<'a>,
{
    row.try_get::<usize, Option<T>>(idx)
        .map_err(|err| conversion(name, err.to_string()))
}

fn conversion(column: &str, reason: impl Into<String>) -> DbError {
    DbError::Conversion {
        column: column.to_string(),
        reason: reason.into(),
    }
}

impl fmt::Debug for DbRow<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            DbRow::MySqlRow(row) => write!(f, "{row:?}"),
            DbRow::PostgresRow(row) => write!(f, "{row:?}"),
        }
    }
}
