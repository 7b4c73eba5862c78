// ==========================================
// シフト不足分析コア - 取り込み層エラー型
// ==========================================
// 道具: thiserror 派生マクロ
// ==========================================

use crate::domain::matrix::MatrixError;
use thiserror::Error;

/// 取り込み層エラー
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== ファイル関連 =====
    #[error("ファイルが存在しない: {0}")]
    FileNotFound(String),

    #[error("未対応のファイル形式: {0}（.csv のみ対応）")]
    UnsupportedFormat(String),

    #[error("ファイル読み込み失敗: {0}")]
    FileReadError(String),

    #[error("CSV 解析失敗: {0}")]
    CsvParseError(String),

    // ===== 表構造 =====
    #[error("列が存在しない ({file}): {column}")]
    MissingColumn { file: String, column: String },

    #[error("データ行が無い: {0}")]
    EmptyTable(String),

    #[error("マトリクス構築失敗 ({file}): {source}")]
    MatrixShape {
        file: String,
        #[source]
        source: MatrixError,
    },

    // ===== 値の変換 =====
    #[error("型変換失敗 (行 {row}, 列 {field}): {message}")]
    TypeConversionError {
        row: usize,
        field: String,
        message: String,
    },

    #[error("日時形式エラー (行 {row}, 列 {field}): {value}")]
    DateFormatError {
        row: usize,
        field: String,
        value: String,
    },

    // ===== 汎用 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

/// Result 型エイリアス
pub type ImportResult<T> = Result<T, ImportError>;
