// ==========================================
// シフト不足分析コア - 表ローダ
// ==========================================
// ワイド形式: 1 列目 = 時間帯ラベル, 2 列目以降 = 日付列 → SlotMatrix
// ロング形式: ds / staff / role [/ employment] → WorkingData
// ==========================================

use crate::domain::matrix::SlotMatrix;
use crate::domain::working_data::{WorkingData, WorkingRecord};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::CsvParser;
use crate::importer::importer_trait::FileParser;
use chrono::{NaiveDate, NaiveDateTime};
use std::path::Path;

/// 勤務データの列名
pub mod columns {
    pub const TIMESTAMP: &str = "ds";
    pub const STAFF: &str = "staff";
    pub const ROLE: &str = "role";
    pub const EMPLOYMENT: &str = "employment";
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

const MISSING_MARKERS: &[&str] = &["", "nan", "NaN", "NA", "null", "None"];

// ==========================================
// TableLoader
// ==========================================
pub struct TableLoader;

impl TableLoader {
    /// ワイド形式 CSV を SlotMatrix として読み込む
    ///
    /// # 戻り値
    /// - Ok(SlotMatrix): 空欄・"nan"・inf は欠損 (NaN)
    /// - Err: ファイル無し / 数値でない値 / ラベル重複
    pub fn load_slot_matrix(&self, path: &Path) -> ImportResult<SlotMatrix> {
        let table = CsvParser.parse_to_raw_table(path)?;
        if table.headers.is_empty() {
            return Err(ImportError::EmptyTable(path.display().to_string()));
        }

        let col_labels: Vec<String> = table.headers[1..].to_vec();
        let mut row_labels = Vec::with_capacity(table.rows.len());
        let mut values = Vec::with_capacity(table.rows.len());

        for row in &table.rows {
            row_labels.push(row.value(0).to_string());

            let mut cells = Vec::with_capacity(col_labels.len());
            for (offset, label) in col_labels.iter().enumerate() {
                let raw = row.value(offset + 1);
                let cell = parse_cell(raw).ok_or_else(|| ImportError::TypeConversionError {
                    row: row.row_number,
                    field: label.clone(),
                    message: format!("数値ではない: {}", raw),
                })?;
                cells.push(cell);
            }
            values.push(cells);
        }

        SlotMatrix::new(row_labels, col_labels, values).map_err(|source| {
            ImportError::MatrixShape {
                file: path.display().to_string(),
                source,
            }
        })
    }

    /// ロング形式の勤務データを読み込む
    pub fn load_working_data(&self, path: &Path) -> ImportResult<WorkingData> {
        let table = CsvParser.parse_to_raw_table(path)?;
        let file = path.display().to_string();

        let require = |column: &str| {
            table
                .column_index(column)
                .ok_or_else(|| ImportError::MissingColumn {
                    file: file.clone(),
                    column: column.to_string(),
                })
        };
        let ds_idx = require(columns::TIMESTAMP)?;
        let staff_idx = require(columns::STAFF)?;
        let role_idx = require(columns::ROLE)?;
        let employment_idx = table.column_index(columns::EMPLOYMENT);

        let mut records = Vec::with_capacity(table.rows.len());
        for row in &table.rows {
            let raw_ds = row.value(ds_idx);
            let ds = parse_timestamp(raw_ds).ok_or_else(|| ImportError::DateFormatError {
                row: row.row_number,
                field: columns::TIMESTAMP.to_string(),
                value: raw_ds.to_string(),
            })?;

            records.push(WorkingRecord {
                ds,
                staff: row.value(staff_idx).to_string(),
                role: row.value(role_idx).to_string(),
                employment: employment_idx
                    .map(|i| row.value(i).to_string())
                    .filter(|v| !v.is_empty()),
            });
        }

        Ok(WorkingData::new(records))
    }

    /// 指定列のタイムスタンプを読み込む（解釈できない値は読み飛ばす）
    pub fn load_timestamps(&self, path: &Path, column: &str) -> ImportResult<Vec<NaiveDateTime>> {
        let table = CsvParser.parse_to_raw_table(path)?;
        let idx = table
            .column_index(column)
            .ok_or_else(|| ImportError::MissingColumn {
                file: path.display().to_string(),
                column: column.to_string(),
            })?;

        let mut skipped = 0usize;
        let timestamps: Vec<NaiveDateTime> = table
            .rows
            .iter()
            .filter_map(|row| {
                let parsed = parse_timestamp(row.value(idx));
                if parsed.is_none() {
                    skipped += 1;
                }
                parsed
            })
            .collect();

        if skipped > 0 {
            tracing::debug!(
                file = %path.display(),
                column,
                skipped,
                "解釈できないタイムスタンプを読み飛ばした"
            );
        }

        Ok(timestamps)
    }
}

// ==========================================
// 値の解釈
// ==========================================

/// セル値 → f64（欠損表記と inf は NaN, 数値でなければ None）
pub fn parse_cell(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if MISSING_MARKERS.contains(&trimmed) {
        return Some(f64::NAN);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .map(|v| if v.is_finite() { v } else { f64::NAN })
}

/// タイムスタンプ（日付のみなら 00:00）
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| parse_date_label(trimmed).and_then(|d| d.and_hms_opt(0, 0, 0)))
}

/// 日付列ラベル → NaiveDate（時刻付きラベルは日付部分のみ）
pub fn parse_date_label(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
                .map(|dt| dt.date())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn write_csv(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    #[test]
    fn test_load_slot_matrix_wide_format() {
        let file = write_csv(&[
            "time,2025-06-01,2025-06-02",
            "09:00,2,1",
            "09:30,,3",
        ]);

        let matrix = TableLoader.load_slot_matrix(file.path()).unwrap();

        assert_eq!(matrix.row_labels(), &["09:00".to_string(), "09:30".to_string()]);
        assert_eq!(matrix.n_cols(), 2);
        assert!(matrix.get(1, 0).unwrap().is_nan());
        assert_eq!(matrix.sum(), 6.0);
    }

    #[test]
    fn test_load_slot_matrix_rejects_text_cells() {
        let file = write_csv(&["time,2025-06-01", "09:00,abc"]);
        let result = TableLoader.load_slot_matrix(file.path());
        assert!(matches!(
            result,
            Err(ImportError::TypeConversionError { row: 2, .. })
        ));
    }

    #[test]
    fn test_load_working_data_requires_role_column() {
        let file = write_csv(&["ds,staff", "2025-06-01 09:00,S1"]);
        let result = TableLoader.load_working_data(file.path());
        assert!(matches!(result, Err(ImportError::MissingColumn { .. })));
    }

    #[test]
    fn test_load_working_data() {
        let file = write_csv(&[
            "ds,staff,role,employment",
            "2025-06-01 09:00:00,S1,介護職,常勤",
            "2025-06-01 09:30:00,S1,介護職,",
        ]);

        let data = TableLoader.load_working_data(file.path()).unwrap();

        assert_eq!(data.len(), 2);
        assert_eq!(data.records()[0].employment.as_deref(), Some("常勤"));
        assert_eq!(data.records()[1].employment, None);
    }

    #[test]
    fn test_parse_helpers() {
        assert!(parse_cell("nan").unwrap().is_nan());
        assert_eq!(parse_cell(" 1.5 "), Some(1.5));
        assert_eq!(parse_cell("x"), None);
        assert!(parse_cell("inf").unwrap().is_nan());
        assert!(parse_cell("-Infinity").unwrap().is_nan());
        assert_eq!(
            parse_date_label("2025/06/01"),
            NaiveDate::from_ymd_opt(2025, 6, 1)
        );
        assert_eq!(
            parse_date_label("2025-06-01 00:00:00"),
            NaiveDate::from_ymd_opt(2025, 6, 1)
        );
        assert_eq!(parse_date_label("合計"), None);
        assert!(parse_timestamp("2025-06-01T09:30:00").is_some());
    }
}
