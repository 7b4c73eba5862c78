// ==========================================
// シフト不足分析コア - 設定マネージャ
// ==========================================
// 責務: 設定の読み込み・上書き・スナップショット
// 保存先: config_kv テーブル (key-value + scope)
// 欠けた値・壊れた値は既定値へフォールバック（警告ログ）
// ==========================================

use crate::config::config_reader_trait::ShortageConfigReader;
use crate::config::shortage_config::defaults;
use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// # 引数
    /// - db_path: DB ファイルパス（スキーマ作成済みであること）
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 既存の接続から作成
    ///
    /// 接続設定を揃えるため PRAGMA を再適用する（冪等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&guard)?;
        }
        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// config_kv から値を読む（scope_id='global'）
    fn get_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// global scope の値（他モジュールからの再利用向け）
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        self.get_config_value(key)
    }

    /// 値を読んでパース。無ければ既定値, パース失敗も既定値（警告）
    fn get_config_or_default<T>(&self, key: &str, default: T) -> RepositoryResult<T>
    where
        T: FromStr + std::fmt::Display,
    {
        let raw = match self.get_config_value(key)? {
            Some(v) => v,
            None => return Ok(default),
        };
        match raw.trim().parse::<T>() {
            Ok(v) => Ok(v),
            Err(_) => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    default = %default,
                    "設定値の形式が不正なため既定値を使用"
                );
                Ok(default)
            }
        }
    }

    /// global scope に値を書き込む（upsert）
    pub fn set_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES (?1, ?2, ?3, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
            params![GLOBAL_SCOPE, key, value],
        )?;
        tracing::debug!(config_key = key, value, "設定値を更新");
        Ok(())
    }

    /// global scope の全設定を JSON で取得
    ///
    /// 計算結果と一緒に保存し、どの設定で計算したかを追えるようにする
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;

        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    /// スナップショットから復元（global を上書き）
    ///
    /// # 戻り値
    /// - Ok(usize): 復元した項目数
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> RepositoryResult<usize> {
        let config_map: BTreeMap<String, String> = serde_json::from_str(snapshot_json)?;

        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let mut count = 0;
        for (key, value) in &config_map {
            count += tx.execute(
                "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
                 ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3",
                params![GLOBAL_SCOPE, key, value],
            )?;
        }
        tx.commit()?;
        Ok(count)
    }
}

// ==========================================
// ShortageConfigReader 実装
// ==========================================
impl ShortageConfigReader for ConfigManager {
    fn get_target_occupation(&self) -> RepositoryResult<String> {
        let value = self.get_config_value(config_keys::TARGET_OCCUPATION)?;
        Ok(match value {
            Some(v) if !v.trim().is_empty() => v.trim().to_string(),
            _ => defaults::target_occupation(),
        })
    }

    fn get_other_occupations_label(&self) -> RepositoryResult<String> {
        let value = self.get_config_value(config_keys::OTHER_OCCUPATIONS_LABEL)?;
        Ok(match value {
            Some(v) if !v.trim().is_empty() => v.trim().to_string(),
            _ => defaults::other_occupations_label(),
        })
    }

    fn get_default_slot_hours(&self) -> RepositoryResult<f64> {
        self.get_config_or_default(config_keys::DEFAULT_SLOT_HOURS, defaults::DEFAULT_SLOT_HOURS)
    }

    fn get_autodetect_range(&self) -> RepositoryResult<(f64, f64)> {
        Ok((
            self.get_config_or_default(
                config_keys::AUTODETECT_MIN_HOURS,
                defaults::AUTODETECT_MIN_HOURS,
            )?,
            self.get_config_or_default(
                config_keys::AUTODETECT_MAX_HOURS,
                defaults::AUTODETECT_MAX_HOURS,
            )?,
        ))
    }

    fn get_plausible_daily_shortage_hours(&self) -> RepositoryResult<f64> {
        self.get_config_or_default(
            config_keys::PLAUSIBLE_DAILY_SHORTAGE_HOURS,
            defaults::PLAUSIBLE_DAILY_SHORTAGE_HOURS,
        )
    }

    fn get_estimate_parameters(&self) -> RepositoryResult<(f64, f64)> {
        Ok((
            self.get_config_or_default(
                config_keys::ASSUMED_HOURS_PER_SHIFT,
                defaults::ASSUMED_HOURS_PER_SHIFT,
            )?,
            self.get_config_or_default(
                config_keys::ASSUMED_SHORTAGE_RATE,
                defaults::ASSUMED_SHORTAGE_RATE,
            )?,
        ))
    }

    fn get_tolerance(&self) -> RepositoryResult<f64> {
        self.get_config_or_default(config_keys::TOLERANCE, defaults::TOLERANCE)
    }
}

// ==========================================
// 設定キー
// ==========================================
pub mod config_keys {
    // 職種
    pub const TARGET_OCCUPATION: &str = "target_occupation";
    pub const OTHER_OCCUPATIONS_LABEL: &str = "other_occupations_label";

    // スロット長
    pub const DEFAULT_SLOT_HOURS: &str = "default_slot_hours";
    pub const AUTODETECT_MIN_HOURS: &str = "autodetect_min_hours";
    pub const AUTODETECT_MAX_HOURS: &str = "autodetect_max_hours";

    // 検証
    pub const PLAUSIBLE_DAILY_SHORTAGE_HOURS: &str = "plausible_daily_shortage_hours";
    pub const TOLERANCE: &str = "tolerance";

    // 推定
    pub const ASSUMED_HOURS_PER_SHIFT: &str = "assumed_hours_per_shift";
    pub const ASSUMED_SHORTAGE_RATE: &str = "assumed_shortage_rate";
}
