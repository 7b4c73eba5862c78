// ==========================================
// シフト不足分析コア - 計算層
// ==========================================
// 責務: 需要・配置マトリクスから過不足と統計を計算する
// 原則: 計算層は SQL を組まない, データ品質の問題は警告として返す
// ==========================================

pub mod balance;
pub mod demand_locator;
pub mod error;
pub mod occupation;
pub mod reconciler;
pub mod shortage;
pub mod slot_resolver;
pub mod statistics;
pub mod validator;

pub use balance::{split_balance, BalanceCalculator, BalanceOutcome};
pub use demand_locator::{
    DemandFileCandidate, DemandFileLocator, DemandFileMatch, DemandFileMatcher, ExactMatcher,
    NormalizedMatcher, SubstringMatcher,
};
pub use error::{EngineError, EngineResult};
pub use occupation::{DayNormalization, OccupationCalculator};
pub use reconciler::{ReconcileOutcome, ShapeReconciler};
pub use shortage::ShortageCalculator;
pub use slot_resolver::{SlotHoursRequest, SlotHoursResolver};
pub use statistics::StatisticsEngine;
pub use validator::ShortageValidator;
