// ==========================================
// シフト不足分析コア - 統計エンジン
// ==========================================
// 入力: balance / shortage_only / excess_only（+ 任意で需要・配置）
// 出力: 日別・時間帯別集計, 集中度, 釣り合い, 過不足ゼロ率
// 外部状態を持たない純粋関数
// ==========================================

use crate::domain::matrix::SlotMatrix;
use crate::domain::shortage::{
    DailyBalance, DailyStatistics, PeakSlot, ShortageStatistics, SlotBalance, SlotStatistics,
};

pub struct StatisticsEngine {
    slot_hours: f64,
}

impl StatisticsEngine {
    pub fn new(slot_hours: f64) -> Self {
        Self { slot_hours }
    }

    /// 統計一式を計算
    ///
    /// # 引数
    /// - inputs: (需要, 配置): 与えた場合のみ日別需要/配置時間と不足率を出す
    pub fn compute(
        &self,
        balance: &SlotMatrix,
        shortage_only: &SlotMatrix,
        excess_only: &SlotMatrix,
        inputs: Option<(&SlotMatrix, &SlotMatrix)>,
    ) -> ShortageStatistics {
        let daily = self.daily_statistics(balance, shortage_only, excess_only, inputs);
        let slots = self.slot_statistics(balance, shortage_only, excess_only);

        let shortage_cells = count_positive(shortage_only);
        let excess_cells = count_positive(excess_only);

        let shortage_ratio = match inputs {
            Some((demand, _)) => {
                let demand_hours = demand.sum() * self.slot_hours;
                if demand_hours > 0.0 {
                    shortage_only.sum() * self.slot_hours / demand_hours
                } else {
                    0.0
                }
            }
            None => 0.0,
        };

        ShortageStatistics {
            daily,
            slots,
            concentration_index: concentration_index(shortage_only),
            balance_efficiency: balance_efficiency(shortage_cells, excess_cells),
            utilization_rate: utilization_rate(balance),
            shortage_ratio,
            evaluated_cells: balance.present_cells().count(),
        }
    }

    // ==========================================
    // 日別（列方向）
    // ==========================================
    fn daily_statistics(
        &self,
        balance: &SlotMatrix,
        shortage_only: &SlotMatrix,
        excess_only: &SlotMatrix,
        inputs: Option<(&SlotMatrix, &SlotMatrix)>,
    ) -> DailyStatistics {
        let h = self.slot_hours;
        let balance_sums = balance.column_sums();
        let shortage_sums = shortage_only.column_sums();
        let excess_sums = excess_only.column_sums();
        let demand_sums = inputs.map(|(d, _)| d.column_sums());
        let staffing_sums = inputs.map(|(_, s)| s.column_sums());

        let days: Vec<DailyBalance> = balance
            .col_labels()
            .iter()
            .enumerate()
            .map(|(i, date)| DailyBalance {
                date: date.clone(),
                balance_hours: balance_sums[i] * h,
                shortage_hours: shortage_sums[i] * h,
                excess_hours: excess_sums[i] * h,
                demand_hours: demand_sums.as_ref().and_then(|v| v.get(i)).map(|x| x * h),
                staffing_hours: staffing_sums.as_ref().and_then(|v| v.get(i)).map(|x| x * h),
            })
            .collect();

        let daily_balance: Vec<f64> = days.iter().map(|d| d.balance_hours).collect();

        DailyStatistics {
            days_with_shortage: days.iter().filter(|d| d.shortage_hours > 0.0).count(),
            days_with_excess: days.iter().filter(|d| d.excess_hours > 0.0).count(),
            balance_std_hours: sample_std(&daily_balance),
            days,
        }
    }

    // ==========================================
    // 時間帯別（行方向）
    // ==========================================
    fn slot_statistics(
        &self,
        balance: &SlotMatrix,
        shortage_only: &SlotMatrix,
        excess_only: &SlotMatrix,
    ) -> SlotStatistics {
        let h = self.slot_hours;
        let balance_sums = balance.row_sums();
        let shortage_sums = shortage_only.row_sums();
        let excess_sums = excess_only.row_sums();

        let slots: Vec<SlotBalance> = balance
            .row_labels()
            .iter()
            .enumerate()
            .map(|(i, slot)| SlotBalance {
                slot: slot.clone(),
                balance_hours: balance_sums[i] * h,
                shortage_hours: shortage_sums[i] * h,
                excess_hours: excess_sums[i] * h,
            })
            .collect();

        SlotStatistics {
            peak_shortage: peak(&slots, |s| s.shortage_hours),
            peak_excess: peak(&slots, |s| s.excess_hours),
            slots_with_shortage: slots.iter().filter(|s| s.shortage_hours > 0.0).count(),
            slots_with_excess: slots.iter().filter(|s| s.excess_hours > 0.0).count(),
            slots,
        }
    }
}

/// 最大値の時間帯（同値なら先頭, 最大が 0 以下なら None）
fn peak<F>(slots: &[SlotBalance], value: F) -> Option<PeakSlot>
where
    F: Fn(&SlotBalance) -> f64,
{
    let mut best: Option<&SlotBalance> = None;
    for slot in slots {
        if best.map_or(true, |b| value(slot) > value(b)) {
            best = Some(slot);
        }
    }
    best.filter(|b| value(b) > 0.0).map(|b| PeakSlot {
        slot: b.slot.clone(),
        hours: value(b),
    })
}

fn count_positive(matrix: &SlotMatrix) -> usize {
    matrix.present_cells().filter(|v| *v > 0.0).count()
}

/// 不足の集中度（Gini 型）
///
/// 正の値を昇順に並べ、(2·Σ(rank·value) / (n·total)) − (n+1)/n を [0, 1] にクランプ。
/// 不足合計が 0 なら 0.0。
pub fn concentration_index(shortage_only: &SlotMatrix) -> f64 {
    let mut values: Vec<f64> = shortage_only.present_cells().filter(|v| *v > 0.0).collect();
    let total: f64 = values.iter().sum();
    if values.is_empty() || total <= 0.0 {
        return 0.0;
    }

    values.sort_by(|a, b| a.total_cmp(b));
    let n = values.len() as f64;
    let weighted: f64 = values
        .iter()
        .enumerate()
        .map(|(i, v)| (i as f64 + 1.0) * v)
        .sum();

    let gini = (2.0 * weighted) / (n * total) - (n + 1.0) / n;
    gini.clamp(0.0, 1.0)
}

/// 1 − |s − e| / (s + e)。両方 0 なら 1.0
pub fn balance_efficiency(shortage_cells: usize, excess_cells: usize) -> f64 {
    let total = shortage_cells + excess_cells;
    if total == 0 {
        return 1.0;
    }
    1.0 - (shortage_cells as f64 - excess_cells as f64).abs() / total as f64
}

/// balance がちょうど 0 のセル比率（欠損セルは分母から除く, 空なら 0.0）
pub fn utilization_rate(balance: &SlotMatrix) -> f64 {
    let present: Vec<f64> = balance.present_cells().collect();
    if present.is_empty() {
        return 0.0;
    }
    present.iter().filter(|v| **v == 0.0).count() as f64 / present.len() as f64
}

/// 標本標準偏差（n < 2 なら 0.0）
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}
