// ==========================================
// シフト不足分析コア - 領域モデル層
// ==========================================
// 職責: マトリクス・勤務データ・結果バンドルの型定義
// 制約: ファイル I/O・計算ロジックを含めない
// ==========================================

pub mod matrix;
pub mod occupation;
pub mod shortage;
pub mod types;
pub mod working_data;

// 主要型の再エクスポート
pub use matrix::{MatrixError, SlotMatrix};
pub use occupation::{OccupationBreakdown, OccupationShortage};
pub use shortage::{
    DailyBalance, DailyStatistics, PeakSlot, ShortageResult, ShortageStatistics, SlotBalance,
    SlotStatistics, ValidationReport,
};
pub use types::{ResolvedSlotHours, SlotHoursSource, ValueSource};
pub use working_data::{WorkingData, WorkingRecord};
