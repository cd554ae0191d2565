use crate::config::{DatabaseConfig, DbDriver};
use crate::error::Result;
use crate::guard::validate_sql;
use crate::schema::Schema;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::{Map, Value, json};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::types::{Decimal, Uuid};
use sqlx::{Column, Row, TypeInfo, ValueRef};
use std::time::Duration;

/// One result row, columns in select-list order.
pub type Record = Map<String, Value>;

const POSTGRES_SCHEMA_QUERY: &str = r#"
    SELECT TABLE_NAME::text, COLUMN_NAME::text
    FROM INFORMATION_SCHEMA.COLUMNS
    WHERE TABLE_NAME NOT LIKE 'sys%'
      AND TABLE_SCHEMA NOT IN ('pg_catalog', 'information_schema')
    ORDER BY TABLE_NAME, ORDINAL_POSITION
"#;

const SQLITE_SCHEMA_QUERY: &str = r#"
    SELECT m.name, p.name
    FROM sqlite_master AS m
    JOIN pragma_table_info(m.name) AS p
    WHERE m.type IN ('table', 'view')
      AND m.name NOT LIKE 'sqlite%'
      AND m.name NOT LIKE 'sys%'
    ORDER BY m.name, p.cid
"#;

/// A pooled connection to the HR database.
#[derive(Debug, Clone)]
pub enum Database {
    Postgres(PgPool),
    Sqlite(SqlitePool),
}

impl Database {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let db = match config.driver {
            DbDriver::Postgres => Self::Postgres(
                PgPoolOptions::new()
                    .max_connections(5)
                    .acquire_timeout(timeout)
                    .connect(&config.url)
                    .await?,
            ),
            DbDriver::Sqlite => Self::Sqlite(
                SqlitePoolOptions::new()
                    .max_connections(5)
                    .acquire_timeout(timeout)
                    .connect(&config.url)
                    .await?,
            ),
        };
        concierge_telemetry::debug!(driver = ?config.driver, "Database pool ready");
        Ok(db)
    }

    pub fn driver(&self) -> DbDriver {
        match self {
            Self::Postgres(_) => DbDriver::Postgres,
            Self::Sqlite(_) => DbDriver::Sqlite,
        }
    }

    /// Reads table and column names from the catalog, skipping system tables.
    pub async fn load_schema(&self) -> Result<Schema> {
        let pairs: Vec<(String, String)> = match self {
            Self::Postgres(pool) => sqlx::query_as(POSTGRES_SCHEMA_QUERY).fetch_all(pool).await?,
            Self::Sqlite(pool) => sqlx::query_as(SQLITE_SCHEMA_QUERY).fetch_all(pool).await?,
        };
        let schema = Schema::from_pairs(pairs);
        concierge_telemetry::info!(tables = schema.table_count(), "Schema loaded");
        Ok(schema)
    }

    /// Runs a guarded read-only query and returns its rows as JSON objects.
    pub async fn execute(&self, sql: &str) -> Result<Vec<Record>> {
        let sql = validate_sql(sql)?;
        let records = match self {
            Self::Postgres(pool) => sqlx::query(sql)
                .fetch_all(pool)
                .await?
                .iter()
                .map(pg_record)
                .collect::<Result<Vec<_>>>()?,
            Self::Sqlite(pool) => sqlx::query(sql)
                .fetch_all(pool)
                .await?
                .iter()
                .map(sqlite_record)
                .collect::<Result<Vec<_>>>()?,
        };
        concierge_telemetry::info!(rows = records.len(), "Query executed");
        Ok(records)
    }

    pub async fn close(&self) {
        match self {
            Self::Postgres(pool) => pool.close().await,
            Self::Sqlite(pool) => pool.close().await,
        }
    }
}

fn pg_record(row: &PgRow) -> Result<Record> {
    let mut record = Record::new();
    for column in row.columns() {
        record.insert(column.name().to_string(), pg_value(row, column.ordinal())?);
    }
    Ok(record)
}

/// How a Postgres column is decoded into JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PgKind {
    Bool,
    Int2,
    Int4,
    Int8,
    Float4,
    Float8,
    // exact numbers keep their scale as text, e.g. "52000.50"
    Numeric,
    Uuid,
    Text,
    Date,
    Time,
    Timestamp,
    TimestampTz,
    Json,
    Unsupported,
}

fn pg_kind(type_name: &str) -> PgKind {
    match type_name {
        "BOOL" => PgKind::Bool,
        "INT2" => PgKind::Int2,
        "INT4" => PgKind::Int4,
        "INT8" => PgKind::Int8,
        "FLOAT4" => PgKind::Float4,
        "FLOAT8" => PgKind::Float8,
        "NUMERIC" => PgKind::Numeric,
        "UUID" => PgKind::Uuid,
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CHAR" | "CITEXT" => PgKind::Text,
        "DATE" => PgKind::Date,
        "TIME" => PgKind::Time,
        "TIMESTAMP" => PgKind::Timestamp,
        "TIMESTAMPTZ" => PgKind::TimestampTz,
        "JSON" | "JSONB" => PgKind::Json,
        _ => PgKind::Unsupported,
    }
}

fn decimal_json(value: Decimal) -> Value {
    Value::String(value.to_string())
}

fn pg_value(row: &PgRow, idx: usize) -> Result<Value> {
    if row.try_get_raw(idx)?.is_null() {
        return Ok(Value::Null);
    }
    let type_name = row.columns()[idx].type_info().name().to_string();
    let value = match pg_kind(&type_name) {
        PgKind::Bool => json!(row.try_get::<bool, _>(idx)?),
        PgKind::Int2 => json!(row.try_get::<i16, _>(idx)?),
        PgKind::Int4 => json!(row.try_get::<i32, _>(idx)?),
        PgKind::Int8 => json!(row.try_get::<i64, _>(idx)?),
        PgKind::Float4 => json!(row.try_get::<f32, _>(idx)?),
        PgKind::Float8 => json!(row.try_get::<f64, _>(idx)?),
        PgKind::Numeric => decimal_json(row.try_get::<Decimal, _>(idx)?),
        PgKind::Uuid => json!(row.try_get::<Uuid, _>(idx)?.to_string()),
        PgKind::Text => json!(row.try_get::<String, _>(idx)?),
        PgKind::Date => json!(row.try_get::<NaiveDate, _>(idx)?.to_string()),
        PgKind::Time => json!(row.try_get::<NaiveTime, _>(idx)?.to_string()),
        PgKind::Timestamp => json!(row.try_get::<NaiveDateTime, _>(idx)?.to_string()),
        PgKind::TimestampTz => json!(row.try_get::<DateTime<Utc>, _>(idx)?.to_rfc3339()),
        PgKind::Json => row.try_get::<Value, _>(idx)?,
        PgKind::Unsupported => {
            // arrays, intervals, network types: cast in SQL to read them
            concierge_telemetry::warn!(
                column = row.columns()[idx].name(),
                column_type = %type_name,
                "Unsupported column type"
            );
            Value::String(format!("<{}>", type_name))
        }
    };
    Ok(value)
}

fn sqlite_record(row: &SqliteRow) -> Result<Record> {
    let mut record = Record::new();
    for column in row.columns() {
        record.insert(column.name().to_string(), sqlite_value(row, column.ordinal())?);
    }
    Ok(record)
}

// SQLite is dynamically typed, so decode by the stored value's class rather
// than the declared column type.
fn sqlite_value(row: &SqliteRow, idx: usize) -> Result<Value> {
    let raw = row.try_get_raw(idx)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let type_name = raw.type_info().name().to_ascii_uppercase();
    let value = match type_name.as_str() {
        "INTEGER" => json!(row.try_get::<i64, _>(idx)?),
        "REAL" => json!(row.try_get::<f64, _>(idx)?),
        "BLOB" => json!(format!("<{} bytes>", row.try_get::<Vec<u8>, _>(idx)?.len())),
        _ => json!(row.try_get::<String, _>(idx)?),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HrError;

    async fn memory_db() -> Database {
        // one connection so every query sees the same in-memory database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        for stmt in [
            "CREATE TABLE employees (id INTEGER PRIMARY KEY, name TEXT, salary REAL, joining_date TEXT, manager_id INTEGER)",
            "CREATE TABLE departments (id INTEGER PRIMARY KEY, name TEXT)",
            "INSERT INTO employees VALUES (1, 'Asha', 5200.5, '2019-03-01', NULL)",
            "INSERT INTO employees VALUES (2, 'Ravi', 4100.0, '2022-07-15', 1)",
        ] {
            sqlx::query(stmt).execute(&pool).await.unwrap();
        }
        Database::Sqlite(pool)
    }

    #[test]
    fn postgres_exact_types_are_decoded_not_skipped() {
        assert_eq!(pg_kind("NUMERIC"), PgKind::Numeric);
        assert_eq!(pg_kind("UUID"), PgKind::Uuid);
        assert_eq!(pg_kind("VARCHAR"), PgKind::Text);
        assert_eq!(pg_kind("TIMESTAMPTZ"), PgKind::TimestampTz);
        assert_eq!(pg_kind("INTERVAL"), PgKind::Unsupported);
    }

    #[test]
    fn numeric_values_keep_their_scale() {
        // NUMERIC(10,2) salary 52000.50
        assert_eq!(decimal_json(Decimal::new(5_200_050, 2)), json!("52000.50"));
        assert_eq!(decimal_json(Decimal::new(-75, 1)), json!("-7.5"));
    }

    #[tokio::test]
    async fn sqlite_schema_lists_user_tables_in_order() {
        let db = memory_db().await;
        let schema = db.load_schema().await.unwrap();
        assert_eq!(
            schema.render(),
            "departments(id, name)\nemployees(id, name, salary, joining_date, manager_id)"
        );
    }

    #[tokio::test]
    async fn execute_returns_typed_ordered_rows() {
        let db = memory_db().await;
        let rows = db
            .execute("SELECT name, salary, id, manager_id FROM employees ORDER BY id")
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        let keys: Vec<&str> = rows[0].keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["name", "salary", "id", "manager_id"]);
        assert_eq!(rows[0]["name"], "Asha");
        assert_eq!(rows[0]["salary"], 5200.5);
        assert_eq!(rows[0]["id"], 1);
        assert_eq!(rows[0]["manager_id"], Value::Null);
        assert_eq!(rows[1]["manager_id"], 1);
    }

    #[tokio::test]
    async fn execute_refuses_mutations_before_touching_the_database() {
        let db = memory_db().await;
        let err = db.execute("DELETE FROM employees").await.unwrap_err();
        assert!(err.is_rejected_sql());

        let err = db.execute("SELECT * FROM employees; DROP TABLE employees").await.unwrap_err();
        assert_eq!(err.to_string(), "Unsafe SQL detected: drop");

        let rows = db.execute("SELECT COUNT(*) AS n FROM employees").await.unwrap();
        assert_eq!(rows[0]["n"], 2);
    }

    #[tokio::test]
    async fn database_errors_are_reported() {
        let db = memory_db().await;
        let err = db.execute("SELECT missing_column FROM employees").await.unwrap_err();
        assert!(matches!(err, HrError::Database(_)));
    }

    #[tokio::test]
    async fn connect_builds_the_matching_pool() {
        let config = DatabaseConfig::new("sqlite::memory:").unwrap().with_timeout_secs(2);
        let db = Database::connect(&config).await.unwrap();
        assert_eq!(db.driver(), DbDriver::Sqlite);
        db.close().await;
    }
}
