// ==========================================
// シフト不足分析コア - 過不足計算器
// ==========================================
// balance       = demand − staffing（符号付き, クリップなし）
// shortage_only = clip(balance, 0)
// excess_only   = clip(−balance, 0)
// *_hours       = Σ(マトリクス) × slot_hours
// 不変条件: net_hours == shortage_hours − excess_hours
// ==========================================

use crate::domain::matrix::SlotMatrix;
use crate::engine::error::EngineResult;
use crate::engine::reconciler::ShapeReconciler;
use crate::engine::slot_resolver::validate_slot_hours;

/// 過不足計算の出力
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceOutcome {
    pub balance: SlotMatrix,
    pub shortage_only: SlotMatrix,
    pub excess_only: SlotMatrix,
    pub net_hours: f64,
    pub shortage_hours: f64,
    pub excess_hours: f64,
}

// ==========================================
// BalanceCalculator
// ==========================================
pub struct BalanceCalculator {
    slot_hours: f64,
}

impl BalanceCalculator {
    /// # 戻り値
    /// - Err(InvalidParameter): slot_hours が (0, 24] の範囲外
    pub fn new(slot_hours: f64) -> EngineResult<Self> {
        Ok(Self {
            slot_hours: validate_slot_hours(slot_hours)?,
        })
    }

    pub fn slot_hours(&self) -> f64 {
        self.slot_hours
    }

    /// 需要・配置から過不足を計算
    ///
    /// ラベルが揃っていない入力は共通部分に揃えてから計算する（例外にしない）。
    /// 負の balance（配置過剰）は正常な状態として扱う。
    pub fn compute(&self, demand: &SlotMatrix, staffing: &SlotMatrix) -> EngineResult<BalanceOutcome> {
        let balance = if demand.same_labels(staffing) {
            demand.zip_with(staffing, |d, s| d - s)?
        } else {
            let aligned = ShapeReconciler::new().reconcile(demand, staffing);
            aligned.demand.zip_with(&aligned.staffing, |d, s| d - s)?
        };

        Ok(self.from_balance(balance))
    }

    /// 既存の符号付き balance から片側ビューと時間合計を導出
    pub fn from_balance(&self, balance: SlotMatrix) -> BalanceOutcome {
        let (shortage_only, excess_only) = split_balance(&balance);

        let net_hours = balance.sum() * self.slot_hours;
        let shortage_hours = shortage_only.sum() * self.slot_hours;
        let excess_hours = excess_only.sum() * self.slot_hours;

        tracing::debug!(
            net_hours,
            shortage_hours,
            excess_hours,
            slot_hours = self.slot_hours,
            "過不足計算完了"
        );

        BalanceOutcome {
            balance,
            shortage_only,
            excess_only,
            net_hours,
            shortage_hours,
            excess_hours,
        }
    }
}

/// 符号付き balance → (shortage_only, excess_only)
pub fn split_balance(balance: &SlotMatrix) -> (SlotMatrix, SlotMatrix) {
    let shortage_only = balance.clip_lower(0.0);
    let excess_only = balance.map(|v| -v).clip_lower(0.0);
    (shortage_only, excess_only)
}
