//! # Candlewick Warehouse
//!
//! DuckDB-backed durable store for hourly price observations.
//!
//! ## Overview
//!
//! - **Versioned schema**: `stock_data` is provisioned by [`migrations`] on open
//! - **Idempotent writes**: rows are upserted on the `(symbol, timestamp)` key
//! - **One unit of work per batch**: a failing row rolls back the whole batch
//! - **Scoped connections**: pooled handles return to the pool on every exit path
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use candlewick_warehouse::{ObservationRow, Warehouse};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let warehouse = Warehouse::open_default()?;
//!
//!     let rows = vec![ObservationRow {
//!         symbol: "AAPL".to_string(),
//!         timestamp: "2024-01-05 19:00:00".to_string(),
//!         open: 181.10,
//!         high: 181.50,
//!         low: 180.90,
//!         close: 181.25,
//!         volume: 120_000,
//!         last_refreshed: Some("2024-01-05 19:00:00".to_string()),
//!         time_zone: Some("US/Eastern".to_string()),
//!     }];
//!
//!     let stored = warehouse.upsert_observations(&rows)?;
//!     println!("stored {stored} rows");
//!     Ok(())
//! }
//! ```
//!
//! ## Tables
//!
//! | Table | Description |
//! |-------|-------------|
//! | `stock_data` | One row per `(symbol, timestamp)` observation |
//! | `schema_migrations` | Applied migration versions |

pub mod duckdb;
pub mod migrations;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use ::duckdb::{params, Connection, ToSql};
use serde::Serialize;
use thiserror::Error;

pub use duckdb::{DatabaseLocation, DuckDbConnectionManager, PooledConnection};

const UPSERT_OBSERVATION_SQL: &str = "\
INSERT INTO stock_data \
 (symbol, \"timestamp\", open_price, high_price, low_price, close_price, volume, last_refreshed, time_zone) \
 VALUES (?, CAST(? AS TIMESTAMP), ?, ?, ?, ?, ?, CAST(? AS TIMESTAMP), ?) \
 ON CONFLICT (symbol, \"timestamp\") DO UPDATE SET \
 open_price = EXCLUDED.open_price, \
 high_price = EXCLUDED.high_price, \
 low_price = EXCLUDED.low_price, \
 close_price = EXCLUDED.close_price, \
 volume = EXCLUDED.volume, \
 last_refreshed = EXCLUDED.last_refreshed";

const SELECT_OBSERVATIONS_SQL: &str = "\
SELECT symbol, CAST(\"timestamp\" AS VARCHAR), \
 CAST(open_price AS DOUBLE), CAST(high_price AS DOUBLE), \
 CAST(low_price AS DOUBLE), CAST(close_price AS DOUBLE), volume, \
 CAST(last_refreshed AS VARCHAR), time_zone, CAST(created_at AS VARCHAR) \
 FROM stock_data WHERE symbol = ? ORDER BY \"timestamp\"";

/// Errors that can occur during warehouse operations.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// `DuckDB` database error, including constraint violations.
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    /// I/O error (file system operations).
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Configuration for the warehouse database.
#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    /// Root directory for candlewick data.
    pub home: PathBuf,
    /// Path to the `DuckDB` database file.
    pub db_path: PathBuf,
    /// Maximum number of idle connections kept in the pool.
    pub max_pool_size: usize,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self::at_home(resolve_candlewick_home())
    }
}

impl WarehouseConfig {
    /// Configuration rooted at `home`, with the database at `<home>/warehouse.duckdb`.
    pub fn at_home(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        let db_path = home.join("warehouse.duckdb");
        Self {
            home,
            db_path,
            max_pool_size: 4,
        }
    }
}

/// One observation row ready for the `stock_data` table.
///
/// Timestamps use the provider's `YYYY-MM-DD HH:MM:SS` wall-clock form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationRow {
    pub symbol: String,
    pub timestamp: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    pub last_refreshed: Option<String>,
    pub time_zone: Option<String>,
}

/// A row read back from `stock_data`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredObservation {
    pub symbol: String,
    pub timestamp: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    pub last_refreshed: Option<String>,
    pub time_zone: Option<String>,
    pub created_at: String,
}

/// The main warehouse interface for observation storage.
#[derive(Clone)]
pub struct Warehouse {
    manager: DuckDbConnectionManager,
    // DuckDB aborts one of two open transactions that touch the same key, so
    // batches are committed one at a time.
    writer: Arc<Mutex<()>>,
}

impl Warehouse {
    /// Open a warehouse with default configuration.
    pub fn open_default() -> Result<Self, WarehouseError> {
        Self::open(WarehouseConfig::default())
    }

    /// Open a warehouse with the specified configuration.
    pub fn open(config: WarehouseConfig) -> Result<Self, WarehouseError> {
        if let Some(parent) = config.db_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let manager = DuckDbConnectionManager::open(
            DatabaseLocation::File(config.db_path),
            config.max_pool_size,
        )?;
        let warehouse = Self::with_manager(manager);
        warehouse.initialize()?;
        Ok(warehouse)
    }

    /// Open a private in-memory warehouse.
    pub fn open_in_memory() -> Result<Self, WarehouseError> {
        let manager = DuckDbConnectionManager::open(DatabaseLocation::InMemory, 2)?;
        let warehouse = Self::with_manager(manager);
        warehouse.initialize()?;
        Ok(warehouse)
    }

    fn with_manager(manager: DuckDbConnectionManager) -> Self {
        Self {
            manager,
            writer: Arc::new(Mutex::new(())),
        }
    }

    /// Provision the schema. Idempotent.
    pub fn initialize(&self) -> Result<(), WarehouseError> {
        let connection = self.manager.acquire()?;
        migrations::apply_migrations(&connection)?;
        Ok(())
    }

    /// Get the path to the database file, if it lives on disk.
    pub fn db_path(&self) -> Option<&Path> {
        self.manager.location().path()
    }

    /// Applied schema migration versions.
    pub fn schema_versions(&self) -> Result<Vec<String>, WarehouseError> {
        let connection = self.manager.acquire()?;
        Ok(migrations::applied_versions(&connection)?)
    }

    /// Insert or update observation rows keyed by `(symbol, timestamp)`.
    ///
    /// Existing rows get their prices, volume and `last_refreshed` replaced;
    /// `created_at` and `time_zone` from the first write are kept. The batch is
    /// committed as one transaction and rolled back if any row fails.
    ///
    /// # Security
    /// All values are passed as query parameters, never interpolated.
    pub fn upsert_observations(&self, rows: &[ObservationRow]) -> Result<usize, WarehouseError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let connection = self.manager.acquire()?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<usize, WarehouseError> {
            let mut statement = connection.prepare(UPSERT_OBSERVATION_SQL)?;
            for row in rows {
                let params: [&dyn ToSql; 9] = [
                    &row.symbol,
                    &row.timestamp,
                    &row.open,
                    &row.high,
                    &row.low,
                    &row.close,
                    &row.volume,
                    &row.last_refreshed,
                    &row.time_zone,
                ];
                statement.execute(params.as_slice())?;
            }

            Ok(rows.len())
        })();

        finalize_transaction(&connection, result)
    }

    /// Stored observations for `symbol`, oldest first.
    pub fn observations_for(&self, symbol: &str) -> Result<Vec<StoredObservation>, WarehouseError> {
        let connection = self.manager.acquire()?;
        let mut statement = connection.prepare(SELECT_OBSERVATIONS_SQL)?;
        let rows = statement
            .query_map(params![symbol], |row| {
                Ok(StoredObservation {
                    symbol: row.get(0)?,
                    timestamp: row.get(1)?,
                    open: row.get(2)?,
                    high: row.get(3)?,
                    low: row.get(4)?,
                    close: row.get(5)?,
                    volume: row.get(6)?,
                    last_refreshed: row.get(7)?,
                    time_zone: row.get(8)?,
                    created_at: row.get(9)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Total number of stored observations across all symbols.
    pub fn count_observations(&self) -> Result<u64, WarehouseError> {
        let connection = self.manager.acquire()?;
        let count: i64 = connection.query_row("SELECT COUNT(*) FROM stock_data", [], |row| {
            row.get(0)
        })?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

/// Finalize a transaction, committing on success or rolling back on failure.
fn finalize_transaction<T>(
    connection: &Connection,
    result: Result<T, WarehouseError>,
) -> Result<T, WarehouseError> {
    match result {
        Ok(value) => {
            connection.execute_batch("COMMIT")?;
            Ok(value)
        }
        Err(error) => {
            let _ = connection.execute_batch("ROLLBACK");
            Err(error)
        }
    }
}

/// Resolve the candlewick home directory from environment or default.
fn resolve_candlewick_home() -> PathBuf {
    if let Some(path) = env::var_os("CANDLEWICK_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".candlewick");
    }

    PathBuf::from(".candlewick")
}
