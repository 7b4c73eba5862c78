// ==========================================
// シフト不足分析コア - ライブラリ
// ==========================================
// 介護施設のシフト表について、時間帯 × 日付ごとの
// 需要人数と配置人数から過不足時間を計算する
// ==========================================

// ==========================================
// モジュール宣言
// ==========================================

// 領域層 - 値型とマトリクス
pub mod domain;

// 永続化層 - 計算結果の保存
pub mod repository;

// 計算層 - 過不足・統計・検証
pub mod engine;

// 取り込み層 - CSV
pub mod importer;

// 設定層
pub mod config;

// DB 基盤（接続初期化/PRAGMA 統一/スキーマ）
pub mod db;

// ログ
pub mod logging;

// ==========================================
// 主要型の再エクスポート
// ==========================================

pub use config::{ConfigManager, ShortageConfig, ShortageConfigReader};
pub use domain::{
    OccupationBreakdown, OccupationShortage, ResolvedSlotHours, ShortageResult,
    ShortageStatistics, SlotHoursSource, SlotMatrix, ValidationReport, ValueSource, WorkingData,
    WorkingRecord,
};
pub use engine::{
    EngineError, EngineResult, OccupationCalculator, ShortageCalculator, SlotHoursRequest,
    SlotHoursResolver,
};
pub use importer::{ImportError, ImportResult, TableLoader};
pub use repository::{RepositoryError, RepositoryResult, ShortageRunRepository};

// ==========================================
// 定数
// ==========================================

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const APP_NAME: &str = "シフト不足分析コア";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
