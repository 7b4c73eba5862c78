// ==========================================
// シフト不足分析コア - ファイルパーサ実装
// ==========================================
// 対応: CSV (.csv)
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::{FileParser, RawRow, RawTable};
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;

// ==========================================
// CsvParser 実装
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_to_raw_table(&self, file_path: &Path) -> ImportResult<RawTable> {
        let path = file_path;

        // ファイル存在確認
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        // 拡張子確認
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 行長の不一致を許容
            .from_reader(file);

        // ヘッダ（Excel 出力の BOM を除去）
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            let values: Vec<String> = record.iter().map(|v| v.trim().to_string()).collect();

            // 完全な空行はスキップ
            if values.iter().all(|v| v.is_empty()) {
                continue;
            }

            rows.push(RawRow {
                row_number: idx + 2,
                values,
            });
        }

        Ok(RawTable { headers, rows })
    }
}
