// ==========================================
// シフト不足分析コア - 結果検証器
// ==========================================
// 全チェックを必ず実行し、結果を警告/エラーとして蓄積する（短絡しない）
// 検証は助言的: 計算結果の返却を妨げない
// ==========================================

use crate::domain::matrix::SlotMatrix;
use crate::domain::shortage::ValidationReport;
use crate::engine::slot_resolver::MAX_SLOT_HOURS;

pub struct ShortageValidator {
    plausible_daily_shortage_hours: f64,
}

impl ShortageValidator {
    pub fn new(plausible_daily_shortage_hours: f64) -> Self {
        Self {
            plausible_daily_shortage_hours,
        }
    }

    /// 需要・配置・balance・slot_hours を検証
    pub fn validate(
        &self,
        demand: &SlotMatrix,
        staffing: &SlotMatrix,
        balance: &SlotMatrix,
        slot_hours: f64,
    ) -> ValidationReport {
        let mut report = ValidationReport::new();

        self.check_missing(&mut report, demand, staffing);
        self.check_arithmetic(&mut report, demand, staffing, balance);
        self.check_plausibility(&mut report, balance, slot_hours);
        self.check_slot_hours(&mut report, slot_hours);

        if !report.errors.is_empty() {
            tracing::warn!(errors = ?report.errors, "過不足計算の検証でエラー");
        }
        report
    }

    /// 1. 欠損セル
    fn check_missing(
        &self,
        report: &mut ValidationReport,
        demand: &SlotMatrix,
        staffing: &SlotMatrix,
    ) {
        let demand_missing = demand.missing_count();
        let staffing_missing = staffing.missing_count();
        if demand_missing > 0 || staffing_missing > 0 {
            report.integrity_warning(format!(
                "欠損データあり: 需要 {} セル, 配置 {} セル",
                demand_missing, staffing_missing
            ));
        }
    }

    /// 2. demand − staffing の再計算と一致するか
    fn check_arithmetic(
        &self,
        report: &mut ValidationReport,
        demand: &SlotMatrix,
        staffing: &SlotMatrix,
        balance: &SlotMatrix,
    ) {
        match demand.zip_with(staffing, |d, s| d - s) {
            Ok(recomputed) => {
                if !recomputed.equals(balance) {
                    report.accuracy_error("balance が demand − staffing の再計算と一致しない");
                }
            }
            Err(e) => {
                report.accuracy_error(format!("balance を再計算できない: {}", e));
            }
        }
    }

    /// 3. 1 日平均不足時間の妥当性（警告のみ）
    fn check_plausibility(&self, report: &mut ValidationReport, balance: &SlotMatrix, slot_hours: f64) {
        let days = balance.n_cols();
        if days == 0 || !slot_hours.is_finite() {
            return;
        }
        let shortage_hours = balance.clip_lower(0.0).sum() * slot_hours;
        let average = shortage_hours / days as f64;
        if average > self.plausible_daily_shortage_hours {
            report.warn(format!(
                "1 日平均不足 {:.1} 時間 (> {:.1}) は非現実的な可能性",
                average, self.plausible_daily_shortage_hours
            ));
        }
    }

    /// 4. slot_hours の範囲
    fn check_slot_hours(&self, report: &mut ValidationReport, slot_hours: f64) {
        if !(slot_hours > 0.0 && slot_hours <= MAX_SLOT_HOURS) {
            report.accuracy_error(format!(
                "slot_hours={} は (0, {}] の範囲外",
                slot_hours, MAX_SLOT_HOURS
            ));
        }
    }
}
