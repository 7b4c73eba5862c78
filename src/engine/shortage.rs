// ==========================================
// シフト不足分析コア - 過不足計算オーケストレータ
// ==========================================
// 計算主フロー:
//   1. スロット長の決定（SlotHoursResolver）
//   2. 形状の整合（ShapeReconciler）
//   3. 過不足計算（BalanceCalculator）
//   4. 統計（StatisticsEngine）
//   5. 検証（ShortageValidator）
// 職種別内訳は OccupationCalculator に委譲
// ==========================================

use crate::config::ShortageConfig;
use crate::domain::matrix::SlotMatrix;
use crate::domain::occupation::OccupationBreakdown;
use crate::domain::shortage::ShortageResult;
use crate::domain::types::{ResolvedSlotHours, SlotHoursSource};
use crate::domain::working_data::WorkingData;
use crate::engine::balance::BalanceCalculator;
use crate::engine::error::EngineResult;
use crate::engine::occupation::OccupationCalculator;
use crate::engine::reconciler::ShapeReconciler;
use crate::engine::slot_resolver::{SlotHoursRequest, SlotHoursResolver};
use crate::engine::statistics::StatisticsEngine;
use crate::engine::validator::ShortageValidator;
use crate::importer::table_loader::TableLoader;
use std::path::Path;
use tracing::{debug, info, warn};

// ==========================================
// ShortageCalculator
// ==========================================
pub struct ShortageCalculator {
    config: ShortageConfig,
    resolver: SlotHoursResolver,
    reconciler: ShapeReconciler,
    validator: ShortageValidator,
}

impl ShortageCalculator {
    /// # 戻り値
    /// - Err(InvalidConfig): 設定値が不正
    pub fn new(config: ShortageConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self {
            resolver: SlotHoursResolver::new(&config),
            reconciler: ShapeReconciler::new(),
            validator: ShortageValidator::new(config.plausible_daily_shortage_hours),
            config,
        })
    }

    pub fn config(&self) -> &ShortageConfig {
        &self.config
    }

    /// スロット長の決定
    pub fn resolve_slot_hours(&self, request: &SlotHoursRequest) -> EngineResult<ResolvedSlotHours> {
        self.resolver.resolve(request)
    }

    /// 明示スロット長で計算
    pub fn calculate(
        &self,
        demand: &SlotMatrix,
        staffing: &SlotMatrix,
        slot_hours: f64,
    ) -> EngineResult<ShortageResult> {
        let resolved = self.resolver.resolve(&SlotHoursRequest::explicit(slot_hours))?;
        self.run(demand, staffing, resolved)
    }

    /// スロット長を要求から決定して計算
    pub fn calculate_resolved(
        &self,
        demand: &SlotMatrix,
        staffing: &SlotMatrix,
        request: &SlotHoursRequest,
    ) -> EngineResult<ShortageResult> {
        let resolved = self.resolver.resolve(request)?;
        self.run(demand, staffing, resolved)
    }

    /// CSV ファイルから読み込んで計算
    ///
    /// # 引数
    /// - demand_path: 需要マトリクス CSV
    /// - staffing_path: 配置マトリクス CSV
    /// - request: スロット長の決定要求
    pub fn calculate_from_files(
        &self,
        demand_path: &Path,
        staffing_path: &Path,
        request: &SlotHoursRequest,
    ) -> EngineResult<ShortageResult> {
        let demand = TableLoader.load_slot_matrix(demand_path)?;
        let staffing = TableLoader.load_slot_matrix(staffing_path)?;
        info!(
            demand = %demand_path.display(),
            staffing = %staffing_path.display(),
            demand_shape = ?(demand.n_rows(), demand.n_cols()),
            staffing_shape = ?(staffing.n_rows(), staffing.n_cols()),
            "入力マトリクスを読み込み"
        );
        self.calculate_resolved(&demand, &staffing, request)
    }

    /// 職種別内訳（対象職種は直接計算, 残りは全体からの残差を按分）
    ///
    /// # 引数
    /// - working: 勤務データ
    /// - data_dir: 職種別需要ファイルのディレクトリ
    /// - slot_hours: 決定済みスロット長
    /// - total_hours: 全体の符号付き過不足（通常は ShortageResult::net_hours）
    pub fn occupation_breakdown(
        &self,
        working: &WorkingData,
        data_dir: Option<&Path>,
        slot_hours: f64,
        total_hours: f64,
    ) -> EngineResult<OccupationBreakdown> {
        let calculator = OccupationCalculator::new(&self.config, slot_hours)?;
        Ok(calculator.calculate(working, data_dir, total_hours))
    }

    // ==========================================
    // 主フロー
    // ==========================================
    fn run(
        &self,
        demand: &SlotMatrix,
        staffing: &SlotMatrix,
        resolved: ResolvedSlotHours,
    ) -> EngineResult<ShortageResult> {
        info!(
            slot_hours = resolved.hours,
            source = %resolved.source,
            "過不足計算を開始"
        );

        // 手順 2: 形状の整合
        let aligned = self.reconciler.reconcile(demand, staffing);
        let reconcile_warning = aligned.warning();
        if let Some(message) = &reconcile_warning {
            warn!("{}", message);
        }

        // 手順 3: 過不足
        let calculator = BalanceCalculator::new(resolved.hours)?;
        let outcome = calculator.compute(&aligned.demand, &aligned.staffing)?;

        // 手順 4: 統計
        debug!("統計を計算");
        let statistics = StatisticsEngine::new(resolved.hours).compute(
            &outcome.balance,
            &outcome.shortage_only,
            &outcome.excess_only,
            Some((&aligned.demand, &aligned.staffing)),
        );

        // 手順 5: 検証
        let mut validation = self.validator.validate(
            &aligned.demand,
            &aligned.staffing,
            &outcome.balance,
            resolved.hours,
        );
        if let Some(message) = reconcile_warning {
            validation.warn(message);
        }
        if resolved.source == SlotHoursSource::Default {
            validation.warn(format!(
                "スロット長を決定できず既定値 {}h を使用",
                resolved.hours
            ));
        }

        let mut result = ShortageResult {
            balance: outcome.balance,
            shortage_only: outcome.shortage_only,
            excess_only: outcome.excess_only,
            slot_hours: resolved.hours,
            slot_hours_source: resolved.source,
            net_hours: outcome.net_hours,
            shortage_hours: outcome.shortage_hours,
            excess_hours: outcome.excess_hours,
            statistics,
            validation,
        };

        check_hours_consistency(&mut result, self.config.tolerance);

        info!(
            net_hours = result.net_hours,
            shortage_hours = result.shortage_hours,
            excess_hours = result.excess_hours,
            warnings = result.validation.warnings.len(),
            errors = result.validation.errors.len(),
            "過不足計算完了"
        );
        Ok(result)
    }
}

/// net = shortage − excess が崩れていれば検証エラーとして記録
fn check_hours_consistency(result: &mut ShortageResult, tolerance: f64) {
    if result.hours_consistent(tolerance) {
        return;
    }
    warn!(
        net_hours = result.net_hours,
        shortage_hours = result.shortage_hours,
        excess_hours = result.excess_hours,
        "net ≠ shortage − excess"
    );
    let message = format!(
        "net_hours ({:.6}) が shortage_hours − excess_hours ({:.6}) と一致しない",
        result.net_hours,
        result.shortage_hours - result.excess_hours
    );
    result.validation.accuracy_error(message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::error::EngineError;

    fn calculator() -> ShortageCalculator {
        ShortageCalculator::new(ShortageConfig::default()).unwrap()
    }

    #[test]
    fn test_basic_two_by_two() {
        let demand = SlotMatrix::from_rows(
            &["09:00", "09:30"],
            &["2025-06-01", "2025-06-02"],
            vec![vec![3.0, 2.0], vec![1.0, 0.0]],
        )
        .unwrap();
        let staffing = SlotMatrix::from_rows(
            &["09:00", "09:30"],
            &["2025-06-01", "2025-06-02"],
            vec![vec![1.0, 2.0], vec![2.0, 0.0]],
        )
        .unwrap();

        let result = calculator().calculate(&demand, &staffing, 0.5).unwrap();

        assert_eq!(result.shortage_hours, 1.0);
        assert_eq!(result.excess_hours, 0.5);
        assert_eq!(result.net_hours, 0.5);
        assert_eq!(result.slot_hours_source, SlotHoursSource::Explicit);
        assert!(result.hours_consistent(1e-9));
        assert!(result.validation.is_clean(), "{:?}", result.validation);
    }

    #[test]
    fn test_shape_mismatch_adds_warning() {
        let demand = SlotMatrix::from_rows(
            &["09:00", "09:30"],
            &["D1", "D2"],
            vec![vec![2.0, 2.0], vec![2.0, 2.0]],
        )
        .unwrap();
        let staffing =
            SlotMatrix::from_rows(&["09:00"], &["D1", "D2", "D3"], vec![vec![1.0, 1.0, 1.0]])
                .unwrap();

        let result = calculator().calculate(&demand, &staffing, 1.0).unwrap();

        assert_eq!(result.balance.n_rows(), 1);
        assert_eq!(result.balance.n_cols(), 2);
        assert_eq!(result.shortage_hours, 2.0);
        assert!(result.validation.warnings.iter().any(|w| w.contains("形状")));
    }

    #[test]
    fn test_invalid_slot_hours_is_error() {
        let m = SlotMatrix::from_rows(&["09:00"], &["D1"], vec![vec![1.0]]).unwrap();
        let err = calculator().calculate(&m, &m, 0.0).unwrap_err();
        assert!(matches!(err, EngineError::InvalidParameter { .. }));
    }

    #[test]
    fn test_default_slot_hours_is_reported() {
        let m = SlotMatrix::from_rows(&["09:00"], &["D1"], vec![vec![1.0]]).unwrap();
        let result = calculator()
            .calculate_resolved(&m, &m, &SlotHoursRequest::default())
            .unwrap();
        assert_eq!(result.slot_hours, 0.5);
        assert_eq!(result.slot_hours_source, SlotHoursSource::Default);
        assert_eq!(result.validation.warnings.len(), 1);
    }

    #[test]
    fn test_inconsistent_hours_become_validation_error() {
        let m = SlotMatrix::from_rows(&["09:00"], &["D1"], vec![vec![2.0]]).unwrap();
        let mut result = calculator().calculate(&m, &m, 0.5).unwrap();

        check_hours_consistency(&mut result, 1e-6);
        assert!(result.validation.calculation_accuracy);
        assert!(result.validation.errors.is_empty());

        result.net_hours = 3.0;
        check_hours_consistency(&mut result, 1e-6);
        assert!(!result.validation.calculation_accuracy);
        assert_eq!(result.validation.errors.len(), 1);
    }
}
