//! SQLite persistence for cached country rows
//!
//! One table, `countries`, unique by name. Refreshes upsert the whole
//! batch inside a single transaction so a partial failure never leaves
//! mixed freshness in the table.

use chrono::{DateTime, Utc};
use country_cache_core::{CacheError, CountryFilter, EnrichedCountry, Result, SortKey, StoredCountry};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::sync::Arc;

const SELECT_COLUMNS: &str = "id, name, capital, region, population, currency_code, \
                              exchange_rate, estimated_gdp, last_refreshed_at, flag_url";

/// Aggregate over the whole table
#[derive(Debug, Clone)]
pub struct StoreStatus {
    pub total: i64,
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

pub struct Database {
    pool: Arc<SqlitePool>,
}

impl Database {
    pub async fn new(database_path: &str, max_connections: u32) -> Result<Self> {
        // Create parent directory if needed
        if let Some(parent) = std::path::Path::new(database_path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(db_err)?;

        Self::run_migrations(&pool).await?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// In-memory database, used by tests and local experiments.
    ///
    /// A single connection keeps the memory database alive for the pool's
    /// whole lifetime.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(":memory:")
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(db_err)?;

        Self::run_migrations(&pool).await?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    async fn run_migrations(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS countries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                capital TEXT,
                region TEXT,
                population INTEGER,
                currency_code TEXT,
                exchange_rate REAL,
                estimated_gdp REAL NOT NULL,
                last_refreshed_at TEXT NOT NULL,
                flag_url TEXT
            )
            "#,
        )
        .execute(pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    /// Insert or update every record, matched by name, in one transaction.
    ///
    /// `last_refreshed_at` is stamped here for all written rows.
    pub async fn upsert_all(&self, records: &[EnrichedCountry]) -> Result<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        for record in records {
            sqlx::query(
                r#"
                INSERT INTO countries (name, capital, region, population, currency_code,
                                       exchange_rate, estimated_gdp, last_refreshed_at, flag_url)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ON CONFLICT(name) DO UPDATE SET
                    capital = excluded.capital,
                    region = excluded.region,
                    population = excluded.population,
                    currency_code = excluded.currency_code,
                    exchange_rate = excluded.exchange_rate,
                    estimated_gdp = excluded.estimated_gdp,
                    last_refreshed_at = excluded.last_refreshed_at,
                    flag_url = excluded.flag_url
                "#,
            )
            .bind(&record.name)
            .bind(&record.capital)
            .bind(&record.region)
            // Saturate rather than wrap if a population ever exceeds i64
            .bind(record.population.map(|p| i64::try_from(p).unwrap_or(i64::MAX)))
            .bind(&record.currency_code)
            .bind(record.exchange_rate)
            .bind(record.estimated_gdp)
            .bind(now)
            .bind(&record.flag_url)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)
    }

    /// Rows matching all provided equality filters, optionally sorted
    /// descending by an allow-listed column.
    pub async fn list(
        &self,
        filter: &CountryFilter,
        sort: Option<SortKey>,
    ) -> Result<Vec<StoredCountry>> {
        let mut sql = format!("SELECT {SELECT_COLUMNS} FROM countries");

        let mut clauses: Vec<&str> = Vec::new();
        if filter.region.is_some() {
            clauses.push("region = ?");
        }
        if filter.currency_code.is_some() {
            clauses.push("currency_code = ?");
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        // Column names come from the SortKey allow-list, never from the caller
        if let Some(key) = sort {
            sql.push_str(" ORDER BY ");
            sql.push_str(key.column());
            sql.push_str(" DESC");
        }

        let mut query = sqlx::query_as::<_, CountryRow>(&sql);
        if let Some(region) = &filter.region {
            query = query.bind(region);
        }
        if let Some(code) = &filter.currency_code {
            query = query.bind(code);
        }

        let rows = query.fetch_all(&*self.pool).await.map_err(db_err)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get_by_name(&self, name: &str) -> Result<Option<StoredCountry>> {
        let row: Option<CountryRow> =
            sqlx::query_as(&format!("SELECT {SELECT_COLUMNS} FROM countries WHERE name = ?1"))
                .bind(name)
                .fetch_optional(&*self.pool)
                .await
                .map_err(db_err)?;

        Ok(row.map(Into::into))
    }

    /// Delete by name. Returns `false` when no row matched.
    pub async fn delete_by_name(&self, name: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM countries WHERE name = ?1")
            .bind(name)
            .execute(&*self.pool)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn status(&self) -> Result<StoreStatus> {
        let (total, last_refreshed_at): (i64, Option<DateTime<Utc>>) =
            sqlx::query_as("SELECT COUNT(*), MAX(last_refreshed_at) FROM countries")
                .fetch_one(&*self.pool)
                .await
                .map_err(db_err)?;

        Ok(StoreStatus {
            total,
            last_refreshed_at,
        })
    }

    /// Top countries by estimated GDP, ties broken by store order.
    pub async fn top_by_gdp(&self, limit: i64) -> Result<Vec<(String, f64)>> {
        sqlx::query_as(
            "SELECT name, estimated_gdp FROM countries \
             ORDER BY estimated_gdp DESC, id ASC LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&*self.pool)
        .await
        .map_err(db_err)
    }
}

fn db_err(e: sqlx::Error) -> CacheError {
    CacheError::Database(e.to_string())
}

// Helper struct for sqlx query_as
#[derive(sqlx::FromRow)]
struct CountryRow {
    id: i64,
    name: String,
    capital: Option<String>,
    region: Option<String>,
    population: Option<i64>,
    currency_code: Option<String>,
    exchange_rate: Option<f64>,
    estimated_gdp: f64,
    last_refreshed_at: DateTime<Utc>,
    flag_url: Option<String>,
}

impl From<CountryRow> for StoredCountry {
    fn from(r: CountryRow) -> Self {
        StoredCountry {
            id: r.id,
            name: r.name,
            capital: r.capital,
            region: r.region,
            population: r.population,
            currency_code: r.currency_code,
            exchange_rate: r.exchange_rate,
            estimated_gdp: r.estimated_gdp,
            last_refreshed_at: r.last_refreshed_at,
            flag_url: r.flag_url,
        }
    }
}
