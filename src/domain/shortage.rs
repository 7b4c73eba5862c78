// ==========================================
// シフト不足分析コア - 計算結果バンドル
// ==========================================
// 呼び出し毎に新規構築し、返却後は変更しない
// 保存の要否・形式は呼び出し側が決める
// ==========================================

use crate::domain::matrix::SlotMatrix;
use crate::domain::types::SlotHoursSource;
use serde::Serialize;

// ==========================================
// 日別集計
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyBalance {
    pub date: String,
    pub balance_hours: f64,           // 符号付き（正=不足, 負=過剰）
    pub shortage_hours: f64,
    pub excess_hours: f64,
    pub demand_hours: Option<f64>,    // 入力マトリクスがある場合のみ
    pub staffing_hours: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyStatistics {
    pub days: Vec<DailyBalance>,
    pub days_with_shortage: usize,
    pub days_with_excess: usize,
    /// 日別符号付き過不足の標本標準偏差（安定性指標）
    pub balance_std_hours: f64,
}

// ==========================================
// 時間帯別集計
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotBalance {
    pub slot: String,
    pub balance_hours: f64,
    pub shortage_hours: f64,
    pub excess_hours: f64,
}

/// ピーク時間帯
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakSlot {
    pub slot: String,
    pub hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotStatistics {
    pub slots: Vec<SlotBalance>,
    pub peak_shortage: Option<PeakSlot>,
    pub peak_excess: Option<PeakSlot>,
    pub slots_with_shortage: usize,
    pub slots_with_excess: usize,
}

// ==========================================
// 統計サブオブジェクト
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShortageStatistics {
    pub daily: DailyStatistics,
    pub slots: SlotStatistics,
    /// 不足の集中度（Gini 型, 0.0 - 1.0）
    pub concentration_index: f64,
    /// 不足セル数と過剰セル数の釣り合い（0.0 - 1.0）
    pub balance_efficiency: f64,
    /// 過不足ゼロのセル比率
    pub utilization_rate: f64,
    /// 不足時間 / 需要時間
    pub shortage_ratio: f64,
    pub evaluated_cells: usize,
}

// ==========================================
// 検証サブオブジェクト
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub data_integrity: bool,
    pub calculation_accuracy: bool,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self {
            data_integrity: true,
            calculation_accuracy: true,
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// 警告を記録し data_integrity を落とす
    pub fn integrity_warning(&mut self, message: impl Into<String>) {
        self.data_integrity = false;
        self.warnings.push(message.into());
    }

    /// エラーを記録し calculation_accuracy を落とす
    pub fn accuracy_error(&mut self, message: impl Into<String>) {
        self.calculation_accuracy = false;
        self.errors.push(message.into());
    }

    pub fn is_clean(&self) -> bool {
        self.data_integrity
            && self.calculation_accuracy
            && self.warnings.is_empty()
            && self.errors.is_empty()
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// ShortageResult - 計算結果バンドル
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct ShortageResult {
    // ===== マトリクス =====
    pub balance: SlotMatrix,          // 需要 − 配置（符号付き, 正準表現）
    pub shortage_only: SlotMatrix,    // clip(balance, 0)
    pub excess_only: SlotMatrix,      // clip(-balance, 0)

    // ===== スロット長 =====
    pub slot_hours: f64,
    pub slot_hours_source: SlotHoursSource,

    // ===== 時間合計 =====
    pub net_hours: f64,
    pub shortage_hours: f64,
    pub excess_hours: f64,

    // ===== 付帯情報 =====
    pub statistics: ShortageStatistics,
    pub validation: ValidationReport,
}

impl ShortageResult {
    /// net_hours == shortage_hours − excess_hours（相対誤差 tolerance 以内）
    pub fn hours_consistent(&self, tolerance: f64) -> bool {
        let expected = self.shortage_hours - self.excess_hours;
        let scale = self
            .net_hours
            .abs()
            .max(self.shortage_hours.abs())
            .max(self.excess_hours.abs())
            .max(1.0);
        (self.net_hours - expected).abs() <= tolerance * scale
    }

    /// 1 日あたりの平均不足時間（日数 0 なら 0.0）
    pub fn average_daily_shortage_hours(&self) -> f64 {
        let days = self.balance.n_cols();
        if days == 0 {
            0.0
        } else {
            self.shortage_hours / days as f64
        }
    }

    /// JSON へ書き出し（欠損セルは null）
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_report_flags() {
        let mut report = ValidationReport::new();
        assert!(report.is_clean());

        report.warn("注意");
        assert!(report.data_integrity);
        assert!(!report.is_clean());

        report.integrity_warning("欠損あり");
        report.accuracy_error("不一致");
        assert!(!report.data_integrity);
        assert!(!report.calculation_accuracy);
        assert_eq!(report.warnings.len(), 2);
        assert_eq!(report.errors.len(), 1);
    }
}
