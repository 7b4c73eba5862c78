// ==========================================
// シフト不足分析コア - 永続化層
// ==========================================
// 原則: リポジトリは業務ロジックを含まない
// 制約: すべてのクエリはパラメータ化
// ==========================================

pub mod error;
pub mod shortage_run_repo;

pub use error::{RepositoryError, RepositoryResult};
pub use shortage_run_repo::{RunContext, ShortageRunRepository, ShortageRunSummary};
