use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use crate::price_table::PriceTable;

fn open(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let conn = Connection::open(db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS daily_closes (
            symbol TEXT NOT NULL,
            ts_ms INTEGER NOT NULL,
            close REAL NOT NULL,
            updated_at_ms INTEGER NOT NULL,
            PRIMARY KEY(symbol, ts_ms)
        );
        "#,
    )?;
    Ok(conn)
}

/// Upsert adjusted closes for one symbol.
pub fn persist_closes(db_path: &Path, symbol: &str, closes: &[(u64, f64)]) -> Result<usize> {
    let mut conn = open(db_path)?;
    let symbol = symbol.trim().to_ascii_uppercase();
    let now_ms = chrono::Utc::now().timestamp_millis();
    let tx = conn.transaction()?;
    for &(ts_ms, close) in closes {
        tx.execute(
            r#"
            INSERT INTO daily_closes (symbol, ts_ms, close, updated_at_ms)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(symbol, ts_ms) DO UPDATE SET
                close = excluded.close,
                updated_at_ms = excluded.updated_at_ms
            "#,
            params![symbol, ts_ms as i64, close, now_ms],
        )?;
    }
    tx.commit()?;
    Ok(closes.len())
}

pub fn load_symbol_closes(db_path: &Path, symbol: &str) -> Result<Vec<(u64, f64)>> {
    let conn = open(db_path)?;
    let mut stmt = conn.prepare(
        r#"
        SELECT ts_ms, close
        FROM daily_closes
        WHERE symbol = ?1
        ORDER BY ts_ms ASC
        "#,
    )?;
    let rows = stmt.query_map([symbol.trim().to_ascii_uppercase()], |row| {
        Ok((row.get::<_, i64>(0)? as u64, row.get::<_, f64>(1)?))
    })?;

    let mut closes = Vec::new();
    for row in rows {
        closes.push(row?);
    }
    Ok(closes)
}

/// Load every stored symbol into an owned table.
pub fn load_price_table(db_path: &Path) -> Result<PriceTable> {
    let conn = open(db_path)?;
    let mut stmt = conn.prepare(
        r#"
        SELECT symbol, ts_ms, close
        FROM daily_closes
        ORDER BY symbol ASC, ts_ms ASC
        "#,
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, i64>(1)? as u64,
            row.get::<_, f64>(2)?,
        ))
    })?;

    let mut collected = Vec::new();
    for row in rows {
        collected.push(row?);
    }
    tracing::debug!(rows = collected.len(), path = %db_path.display(), "Loaded price rows");
    Ok(PriceTable::from_rows(collected))
}
