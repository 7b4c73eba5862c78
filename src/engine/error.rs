// ==========================================
// シフト不足分析コア - 計算層エラー型
// ==========================================
// 例外として伝播するのは「不正な入力」のみ
// データ品質の問題は ValidationReport / ValueSource で報告する
// ==========================================

use crate::domain::matrix::MatrixError;
use crate::importer::error::ImportError;
use thiserror::Error;

/// 計算層エラー
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("パラメータが範囲外 ({name}={value}): 有効範囲 ({min}, {max}]")]
    InvalidParameter {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("設定値が不正 ({key}): {message}")]
    InvalidConfig { key: String, message: String },

    #[error("マトリクス構造エラー: {0}")]
    Matrix(#[from] MatrixError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EngineError {
    pub fn invalid_parameter(name: &str, value: f64, min: f64, max: f64) -> Self {
        EngineError::InvalidParameter {
            name: name.to_string(),
            value,
            min,
            max,
        }
    }
}

/// Result 型エイリアス
pub type EngineResult<T> = Result<T, EngineError>;
