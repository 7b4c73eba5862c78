// ==========================================
// シフト不足分析コア - SQLite 接続初期化
// ==========================================
// 目的:
// - すべての Connection::open で同じ PRAGMA を適用する
// - busy_timeout を統一し、同時書き込み時の busy エラーを減らす
// - 設定・計算結果テーブルを冪等に作成する
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::path::PathBuf;
use std::time::Duration;

/// 既定の busy_timeout（ミリ秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// このコードが前提とする schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// DB パスを上書きする環境変数
pub const DB_PATH_ENV: &str = "SHIFT_SHORTAGE_DB_PATH";

const DB_FILE_NAME: &str = "shift_shortage.db";

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_scope (
    scope_id   TEXT PRIMARY KEY,
    scope_type TEXT NOT NULL,
    scope_key  TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id   TEXT NOT NULL REFERENCES config_scope(scope_id),
    key        TEXT NOT NULL,
    value      TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS shortage_run (
    run_id               TEXT PRIMARY KEY,
    created_at           TEXT NOT NULL,
    demand_source        TEXT,
    staffing_source      TEXT,
    slot_hours           REAL NOT NULL,
    slot_hours_source    TEXT NOT NULL,
    net_hours            REAL NOT NULL,
    shortage_hours       REAL NOT NULL,
    excess_hours         REAL NOT NULL,
    data_integrity       INTEGER NOT NULL,
    calculation_accuracy INTEGER NOT NULL,
    concentration_index  REAL NOT NULL,
    utilization_rate     REAL NOT NULL,
    warnings_json        TEXT NOT NULL,
    errors_json          TEXT NOT NULL,
    result_json          TEXT NOT NULL,
    config_snapshot_json TEXT
);

CREATE TABLE IF NOT EXISTS occupation_shortage (
    run_id         TEXT NOT NULL REFERENCES shortage_run(run_id) ON DELETE CASCADE,
    occupation     TEXT NOT NULL,
    hours          REAL NOT NULL,
    value_source   TEXT NOT NULL,
    demand_hours   REAL,
    staffed_hours  REAL,
    row_count      INTEGER NOT NULL,
    headcount      INTEGER NOT NULL,
    detail         TEXT,
    PRIMARY KEY (run_id, occupation)
);

CREATE INDEX IF NOT EXISTS idx_shortage_run_created_at ON shortage_run(created_at);

INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
VALUES ('global', 'GLOBAL', 'global');
"#;

/// 接続ごとの PRAGMA を適用
///
/// foreign_keys と busy_timeout は接続単位の設定
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// SQLite 接続を開いて統一設定を適用
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// テーブル作成（冪等）と schema_version の記録
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    if let Some(version) = read_schema_version(conn)? {
        if version > CURRENT_SCHEMA_VERSION {
            tracing::warn!(
                db_version = version,
                expected = CURRENT_SCHEMA_VERSION,
                "DB の schema_version がコードより新しい"
            );
        }
    }
    Ok(())
}

/// schema_version を読む（テーブルが無ければ None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 既定の DB パス
///
/// 優先順: 環境変数 SHIFT_SHORTAGE_DB_PATH → データディレクトリ → カレントディレクトリ
pub fn default_db_path() -> PathBuf {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    match dirs::data_local_dir() {
        Some(dir) => dir.join("shift-shortage").join(DB_FILE_NAME),
        None => PathBuf::from(DB_FILE_NAME),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), None);
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));

        let scopes: i64 = conn
            .query_row("SELECT COUNT(*) FROM config_scope", [], |row| row.get(0))
            .unwrap();
        assert_eq!(scopes, 1);
    }
}
