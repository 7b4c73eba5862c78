// ==========================================
// シフト不足分析コア - 永続化層エラー型
// ==========================================
// 道具: thiserror 派生マクロ
// ==========================================

use thiserror::Error;

/// 永続化層エラー
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== DB エラー =====
    #[error("レコードが見つからない: {entity} id={id}")]
    NotFound { entity: String, id: String },

    #[error("DB 接続失敗: {0}")]
    DatabaseConnectionError(String),

    #[error("DB ロック取得失敗: {0}")]
    LockError(String),

    #[error("DB トランザクション失敗: {0}")]
    DatabaseTransactionError(String),

    #[error("DB クエリ失敗: {0}")]
    DatabaseQueryError(String),

    #[error("一意制約違反: {0}")]
    UniqueConstraintViolation(String),

    #[error("外部キー制約違反: {0}")]
    ForeignKeyViolation(String),

    // ===== データ品質 =====
    #[error("値が不正 (field={field}): {message}")]
    FieldValueError { field: String, message: String },

    #[error("シリアライズ失敗: {0}")]
    SerializationError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) => {
                if msg.contains("UNIQUE") {
                    RepositoryError::UniqueConstraintViolation(msg)
                } else if msg.contains("FOREIGN KEY") {
                    RepositoryError::ForeignKeyViolation(msg)
                } else {
                    RepositoryError::DatabaseQueryError(msg)
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "Unknown".to_string(),
                id: "Unknown".to_string(),
            },
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::SerializationError(err.to_string())
    }
}

/// Result 型エイリアス
pub type RepositoryResult<T> = Result<T, RepositoryError>;
