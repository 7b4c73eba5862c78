// ==========================================
// シフト不足分析コア - 計算結果リポジトリ
// ==========================================
// 保存先: shortage_run / occupation_shortage
// 原則: リポジトリは業務ロジックを含まない
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::occupation::{OccupationBreakdown, OccupationShortage};
use crate::domain::shortage::ShortageResult;
use crate::domain::types::{SlotHoursSource, ValueSource};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Local, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 保存済み計算結果の見出し
#[derive(Debug, Clone, PartialEq)]
pub struct ShortageRunSummary {
    pub run_id: String,
    pub created_at: NaiveDateTime,
    pub demand_source: Option<String>,
    pub staffing_source: Option<String>,
    pub slot_hours: f64,
    pub slot_hours_source: SlotHoursSource,
    pub net_hours: f64,
    pub shortage_hours: f64,
    pub excess_hours: f64,
    pub concentration_index: f64,
    pub utilization_rate: f64,
    pub data_integrity: bool,
    pub calculation_accuracy: bool,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub config_snapshot_json: Option<String>,
}

/// 保存時の付帯情報
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    pub demand_source: Option<String>,
    pub staffing_source: Option<String>,
    pub config_snapshot_json: Option<String>,
}

// SQLite 行 → 変換前の生値
struct RawRunRow {
    run_id: String,
    created_at: String,
    demand_source: Option<String>,
    staffing_source: Option<String>,
    slot_hours: f64,
    slot_hours_source: String,
    net_hours: f64,
    shortage_hours: f64,
    excess_hours: f64,
    concentration_index: f64,
    utilization_rate: f64,
    data_integrity: bool,
    calculation_accuracy: bool,
    warnings_json: String,
    errors_json: String,
    config_snapshot_json: Option<String>,
}

const RUN_COLUMNS: &str = "run_id, created_at, demand_source, staffing_source, \
     slot_hours, slot_hours_source, net_hours, shortage_hours, excess_hours, \
     concentration_index, utilization_rate, data_integrity, calculation_accuracy, \
     warnings_json, errors_json, config_snapshot_json";

// ==========================================
// ShortageRunRepository
// ==========================================
pub struct ShortageRunRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ShortageRunRepository {
    /// # 引数
    /// - db_path: DB ファイルパス（スキーマ作成済みであること）
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 計算結果を保存し run_id を返す
    ///
    /// マトリクス・統計を含む結果全体は result_json に入る（欠損セルは null）
    pub fn save_run(&self, result: &ShortageResult, context: &RunContext) -> RepositoryResult<String> {
        let run_id = Uuid::new_v4().to_string();
        let created_at = Local::now().naive_local().format(TIMESTAMP_FORMAT).to_string();
        let result_json = serde_json::to_string(result)?;
        let warnings_json = serde_json::to_string(&result.validation.warnings)?;
        let errors_json = serde_json::to_string(&result.validation.errors)?;

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO shortage_run (
                run_id, created_at, demand_source, staffing_source,
                slot_hours, slot_hours_source, net_hours, shortage_hours, excess_hours,
                concentration_index, utilization_rate, data_integrity, calculation_accuracy,
                warnings_json, errors_json, result_json, config_snapshot_json
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7, ?8, ?9,
                ?10, ?11, ?12, ?13,
                ?14, ?15, ?16, ?17
            )
            "#,
            params![
                run_id,
                created_at,
                context.demand_source,
                context.staffing_source,
                result.slot_hours,
                result.slot_hours_source.to_string(),
                result.net_hours,
                result.shortage_hours,
                result.excess_hours,
                result.statistics.concentration_index,
                result.statistics.utilization_rate,
                result.validation.data_integrity,
                result.validation.calculation_accuracy,
                warnings_json,
                errors_json,
                result_json,
                context.config_snapshot_json,
            ],
        )?;

        tracing::info!(run_id = %run_id, net_hours = result.net_hours, "計算結果を保存");
        Ok(run_id)
    }

    /// run_id で取得
    pub fn find_run(&self, run_id: &str) -> RepositoryResult<Option<ShortageRunSummary>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM shortage_run WHERE run_id = ?1", RUN_COLUMNS);
        let raw = conn
            .query_row(&sql, params![run_id], map_raw_run)
            .optional()?;
        raw.map(into_summary).transpose()
    }

    /// 保存済み結果 JSON を取得
    pub fn find_result_json(&self, run_id: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let json = conn
            .query_row(
                "SELECT result_json FROM shortage_run WHERE run_id = ?1",
                params![run_id],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(json)
    }

    /// 新しい順に最大 limit 件
    pub fn list_recent(&self, limit: usize) -> RepositoryResult<Vec<ShortageRunSummary>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM shortage_run ORDER BY created_at DESC, rowid DESC LIMIT ?1",
            RUN_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![limit as i64], map_raw_run)?;

        let mut summaries = Vec::new();
        for row in rows {
            summaries.push(into_summary(row?)?);
        }
        Ok(summaries)
    }

    /// 職種別内訳を保存（対象職種・按分結果・まとめ枠）
    ///
    /// # 戻り値
    /// - Ok(usize): 保存した行数
    pub fn save_occupation_breakdown(
        &self,
        run_id: &str,
        breakdown: &OccupationBreakdown,
    ) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let mut count = 0;
        let rows = std::iter::once(&breakdown.target)
            .chain(breakdown.others.iter())
            .chain(std::iter::once(&breakdown.other_bucket));
        for shortage in rows {
            count += tx.execute(
                r#"
                INSERT OR REPLACE INTO occupation_shortage (
                    run_id, occupation, hours, value_source,
                    demand_hours, staffed_hours, row_count, headcount, detail
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
                params![
                    run_id,
                    shortage.occupation,
                    shortage.hours,
                    shortage.source.to_string(),
                    shortage.demand_hours,
                    shortage.staffed_hours,
                    shortage.row_count as i64,
                    shortage.headcount as i64,
                    shortage.detail,
                ],
            )?;
        }
        tx.commit()?;

        tracing::debug!(run_id, rows = count, "職種別内訳を保存");
        Ok(count)
    }

    /// 職種別内訳を取得（職種名順）
    pub fn list_occupation_shortages(&self, run_id: &str) -> RepositoryResult<Vec<OccupationShortage>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT occupation, hours, value_source, demand_hours, staffed_hours,
                   row_count, headcount, detail
            FROM occupation_shortage
            WHERE run_id = ?1
            ORDER BY occupation
            "#,
        )?;

        let rows = stmt.query_map(params![run_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, f64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<f64>>(3)?,
                row.get::<_, Option<f64>>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, i64>(6)?,
                row.get::<_, Option<String>>(7)?,
            ))
        })?;

        let mut shortages = Vec::new();
        for row in rows {
            let (occupation, hours, source, demand_hours, staffed_hours, row_count, headcount, detail) =
                row?;
            let source: ValueSource = source.parse().map_err(|message| {
                RepositoryError::FieldValueError {
                    field: "value_source".to_string(),
                    message,
                }
            })?;
            shortages.push(OccupationShortage {
                occupation,
                hours,
                source,
                demand_hours,
                staffed_hours,
                row_count: row_count.max(0) as usize,
                headcount: headcount.max(0) as usize,
                detail,
            });
        }
        Ok(shortages)
    }

    /// 計算結果を削除（内訳は ON DELETE CASCADE）
    pub fn delete_run(&self, run_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM shortage_run WHERE run_id = ?1", params![run_id])?;
        Ok(affected > 0)
    }
}

fn map_raw_run(row: &Row) -> rusqlite::Result<RawRunRow> {
    Ok(RawRunRow {
        run_id: row.get(0)?,
        created_at: row.get(1)?,
        demand_source: row.get(2)?,
        staffing_source: row.get(3)?,
        slot_hours: row.get(4)?,
        slot_hours_source: row.get(5)?,
        net_hours: row.get(6)?,
        shortage_hours: row.get(7)?,
        excess_hours: row.get(8)?,
        concentration_index: row.get(9)?,
        utilization_rate: row.get(10)?,
        data_integrity: row.get(11)?,
        calculation_accuracy: row.get(12)?,
        warnings_json: row.get(13)?,
        errors_json: row.get(14)?,
        config_snapshot_json: row.get(15)?,
    })
}

fn into_summary(raw: RawRunRow) -> RepositoryResult<ShortageRunSummary> {
    let created_at = parse_timestamp(&raw.created_at)?;
    let slot_hours_source: SlotHoursSource =
        raw.slot_hours_source
            .parse()
            .map_err(|message| RepositoryError::FieldValueError {
                field: "slot_hours_source".to_string(),
                message,
            })?;

    Ok(ShortageRunSummary {
        run_id: raw.run_id,
        created_at,
        demand_source: raw.demand_source,
        staffing_source: raw.staffing_source,
        slot_hours: raw.slot_hours,
        slot_hours_source,
        net_hours: raw.net_hours,
        shortage_hours: raw.shortage_hours,
        excess_hours: raw.excess_hours,
        concentration_index: raw.concentration_index,
        utilization_rate: raw.utilization_rate,
        data_integrity: raw.data_integrity,
        calculation_accuracy: raw.calculation_accuracy,
        warnings: serde_json::from_str(&raw.warnings_json)?,
        errors: serde_json::from_str(&raw.errors_json)?,
        config_snapshot_json: raw.config_snapshot_json,
    })
}

fn parse_timestamp(raw: &str) -> RepositoryResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.naive_local()))
        .map_err(|e| RepositoryError::FieldValueError {
            field: "created_at".to_string(),
            message: format!("{}: {}", raw, e),
        })
}
