// ==========================================
// シフト不足分析コア - 取り込みインターフェース
// ==========================================

use crate::importer::error::ImportResult;
use std::path::Path;

/// 生の表（ヘッダ順を保持）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

/// 生の 1 行（row_number はヘッダを 1 行目とした物理行番号）
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub row_number: usize,
    pub values: Vec<String>,
}

impl RawTable {
    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl RawRow {
    /// 列位置で値を取得（欠けていれば空文字列）
    pub fn value(&self, index: usize) -> &str {
        self.values.get(index).map(String::as_str).unwrap_or("")
    }
}

// ==========================================
// Trait: FileParser
// ==========================================
// 用途: ファイル → 生の表
pub trait FileParser {
    fn parse_to_raw_table(&self, file_path: &Path) -> ImportResult<RawTable>;
}
