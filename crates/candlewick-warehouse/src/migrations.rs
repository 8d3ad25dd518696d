use ::duckdb::{params, Connection};

struct Migration {
    version: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: "0001_stock_data",
    sql: r#"
CREATE TABLE IF NOT EXISTS stock_data (
    symbol VARCHAR(10) NOT NULL CHECK (length(symbol) BETWEEN 1 AND 10),
    "timestamp" TIMESTAMP NOT NULL,
    open_price DECIMAL(15, 4) NOT NULL CHECK (open_price >= 0),
    high_price DECIMAL(15, 4) NOT NULL CHECK (high_price >= 0),
    low_price DECIMAL(15, 4) NOT NULL CHECK (low_price >= 0),
    close_price DECIMAL(15, 4) NOT NULL CHECK (close_price >= 0),
    volume BIGINT NOT NULL CHECK (volume >= 0),
    last_refreshed TIMESTAMP,
    time_zone VARCHAR(50),
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    PRIMARY KEY (symbol, "timestamp")
);
"#,
}];

/// Apply pending schema migrations. Safe to call on every open.
pub fn apply_migrations(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
    )?;

    for migration in MIGRATIONS {
        let applied_count: i64 = connection.query_row(
            "SELECT COUNT(*) FROM schema_migrations WHERE version = ?",
            params![migration.version],
            |row| row.get(0),
        )?;

        if applied_count == 0 {
            connection.execute_batch(migration.sql)?;
            connection.execute(
                "INSERT INTO schema_migrations (version) VALUES (?)",
                params![migration.version],
            )?;
        }
    }

    Ok(())
}

/// Versions recorded in `schema_migrations`, oldest first.
pub fn applied_versions(connection: &Connection) -> Result<Vec<String>, ::duckdb::Error> {
    let mut statement =
        connection.prepare("SELECT version FROM schema_migrations ORDER BY version")?;
    let versions = statement
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(versions)
}
