// ==========================================
// シフト不足分析コア - 職種別直接計算
// ==========================================
// 対象職種（既定: 介護）は自身の需要ファイルと自身の勤務行数を直接比較する。
// 全体不足の人数比按分は使わない（按分は比較用ベースラインとして残す）。
//
// 手順:
//   1. 勤務データから対象名を含む職種ラベルを抽出
//   2. 需要ファイルをチェーン照合で特定（パス重複なし）
//   3. 日付列の合計 × slot_hours = 需要時間
//   4. 勤務行数 × slot_hours = 配置時間
//   5. 需要側は需要ファイルの日数, 配置側は勤務データの日数で日次化し,
//      勤務データの日数へ再スケール
//   6. 負値（配置過剰）はそのまま報告
//   7. 需要ファイル無し → 行数 × 1 勤務時間 × 想定不足率（推定値）
// ==========================================

use crate::config::ShortageConfig;
use crate::domain::occupation::{OccupationBreakdown, OccupationShortage};
use crate::domain::types::ValueSource;
use crate::domain::working_data::WorkingData;
use crate::engine::demand_locator::{DemandFileLocator, DemandFileMatch};
use crate::engine::error::EngineResult;
use crate::engine::slot_resolver::validate_slot_hours;
use crate::importer::table_loader::{parse_date_label, TableLoader};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::path::Path;

// ==========================================
// DayNormalization - 日数ずれ対策
// ==========================================
// 需要ファイルが勤務データより短い期間しか覆っていない場合に備え,
// 「出所ごとの日数で日次化 → 勤務データの日数へ再スケール」を明示的に行う。
// 日数が一致していれば恒等変換になる。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayNormalization {
    pub source_days: usize,
    pub target_days: usize,
}

impl DayNormalization {
    pub fn new(source_days: usize, target_days: usize) -> Self {
        Self {
            source_days,
            target_days,
        }
    }

    /// 出所の日数で割った 1 日あたりの値（日数 0 なら 0.0）
    pub fn daily_rate(&self, total: f64) -> f64 {
        if self.source_days == 0 {
            0.0
        } else {
            total / self.source_days as f64
        }
    }

    /// 日次化した値を対象日数へ戻す
    pub fn rescale(&self, total: f64) -> f64 {
        self.daily_rate(total) * self.target_days as f64
    }

    pub fn is_identity(&self) -> bool {
        self.source_days == self.target_days
    }
}

/// 需要ファイル群の読み込み結果
#[derive(Debug, Clone, Default)]
struct DemandTotals {
    headcount_slots: f64,
    dates: BTreeSet<NaiveDate>,
    loaded_files: usize,
}

// ==========================================
// OccupationCalculator
// ==========================================
pub struct OccupationCalculator {
    target: String,
    other_label: String,
    slot_hours: f64,
    assumed_hours_per_shift: f64,
    assumed_shortage_rate: f64,
    locator: DemandFileLocator,
}

impl OccupationCalculator {
    /// # 戻り値
    /// - Err(InvalidParameter): slot_hours が (0, 24] の範囲外
    pub fn new(config: &ShortageConfig, slot_hours: f64) -> EngineResult<Self> {
        Ok(Self {
            target: config.target_occupation.clone(),
            other_label: config.other_occupations_label.clone(),
            slot_hours: validate_slot_hours(slot_hours)?,
            assumed_hours_per_shift: config.assumed_hours_per_shift,
            assumed_shortage_rate: config.assumed_shortage_rate,
            locator: DemandFileLocator::new(),
        })
    }

    /// 照合チェーンの差し替え
    pub fn with_locator(mut self, locator: DemandFileLocator) -> Self {
        self.locator = locator;
        self
    }

    /// 対象職種 + その他職種の内訳を計算
    ///
    /// # 引数
    /// - working: 勤務データ（ロング形式）
    /// - data_dir: 需要ファイルのディレクトリ（None なら推定へ）
    /// - total_hours: 全体の符号付き過不足（時間）。残差の按分に使う
    pub fn calculate(
        &self,
        working: &WorkingData,
        data_dir: Option<&Path>,
        total_hours: f64,
    ) -> OccupationBreakdown {
        let mut warnings = Vec::new();
        let target = self.calculate_direct(working, data_dir, &mut warnings);
        let (others, other_bucket) = self.allocate_residual(working, total_hours, &target, &mut warnings);

        tracing::info!(
            target = %target.occupation,
            hours = target.hours,
            source = %target.source,
            residual = other_bucket.hours,
            "職種別過不足を計算"
        );

        OccupationBreakdown {
            target,
            others,
            other_bucket,
            warnings,
        }
    }

    /// 対象職種の直接計算（需要ファイル無しなら推定）
    pub fn calculate_direct(
        &self,
        working: &WorkingData,
        data_dir: Option<&Path>,
        warnings: &mut Vec<String>,
    ) -> OccupationShortage {
        // 1. 対象職種ラベル
        let roles = working.roles_containing(&self.target);
        if roles.is_empty() {
            let message = format!("勤務データに「{}」を含む職種が無い", self.target);
            tracing::warn!(target = %self.target, "{}", message);
            warnings.push(message.clone());
            let mut shortage = OccupationShortage::new(&self.target, 0.0, ValueSource::Estimated);
            shortage.detail = Some(message);
            return shortage;
        }

        let row_count = working.count_rows_for(&roles);
        let headcount = working.headcount_for(&roles);
        let staffed_hours = row_count as f64 * self.slot_hours;

        // 2. 需要ファイル特定
        let matches = data_dir
            .map(|dir| self.locator.locate_in_dir(dir, &roles))
            .unwrap_or_default();

        // 3. 需要ファイル読み込み（4. 配置時間は上で算出済み）
        let totals = self.load_demand(&matches, warnings);
        if totals.loaded_files == 0 {
            return self.estimate(&roles, row_count, headcount, staffed_hours, warnings);
        }
        let demand_hours = totals.headcount_slots * self.slot_hours;

        // 5. 日数正規化
        let staff_days = working.distinct_day_count();
        let demand_norm = DayNormalization::new(totals.dates.len(), staff_days);
        let staffed_norm = DayNormalization::new(staff_days, staff_days);
        if !demand_norm.is_identity() {
            let message = format!(
                "需要データの日数 ({}) と勤務データの日数 ({}) が異なるため日次化して補正",
                demand_norm.source_days, staff_days
            );
            tracing::info!(target = %self.target, "{}", message);
            warnings.push(message);
        }

        // 各出所を日次化してから勤務データの日数へ戻し, 差を取る
        let hours = demand_norm.rescale(demand_hours) - staffed_norm.rescale(staffed_hours);

        tracing::info!(
            target = %self.target,
            roles = ?roles,
            files = totals.loaded_files,
            demand_hours,
            staffed_hours,
            hours,
            "直接計算（実測値）"
        );

        OccupationShortage {
            occupation: self.target.clone(),
            hours,
            source: ValueSource::Measured,
            demand_hours: Some(demand_hours),
            staffed_hours: Some(staffed_hours),
            row_count,
            headcount,
            detail: Some(format!(
                "需要ファイル {} 件, 需要 {} 日, 勤務 {} 日",
                totals.loaded_files,
                totals.dates.len(),
                staff_days
            )),
        }
    }

    /// 需要ファイル無し → ヒューリスティック推定
    fn estimate(
        &self,
        roles: &[String],
        row_count: usize,
        headcount: usize,
        staffed_hours: f64,
        warnings: &mut Vec<String>,
    ) -> OccupationShortage {
        let hours = row_count as f64 * self.assumed_hours_per_shift * self.assumed_shortage_rate;
        let message = format!(
            "「{}」の需要ファイルが見つからないため推定値を使用: {} 行 × {}h × {}",
            self.target, row_count, self.assumed_hours_per_shift, self.assumed_shortage_rate
        );
        tracing::warn!(target = %self.target, roles = ?roles, hours, "{}", message);
        warnings.push(message.clone());

        OccupationShortage {
            occupation: self.target.clone(),
            hours,
            source: ValueSource::Estimated,
            demand_hours: None,
            staffed_hours: Some(staffed_hours),
            row_count,
            headcount,
            detail: Some(message),
        }
    }

    /// 特定した需要ファイルの日付列を合計（読めないファイルは警告して除外）
    fn load_demand(&self, matches: &[DemandFileMatch], warnings: &mut Vec<String>) -> DemandTotals {
        let mut totals = DemandTotals::default();

        for found in matches {
            let matrix = match TableLoader.load_slot_matrix(&found.path) {
                Ok(m) => m,
                Err(e) => {
                    let message = format!("需要ファイルを読めない ({}): {}", found.path.display(), e);
                    tracing::warn!("{}", message);
                    warnings.push(message);
                    continue;
                }
            };

            let dated = matrix.retain_columns(|label| parse_date_label(label).is_some());
            if dated.n_cols() == 0 {
                let message = format!(
                    "需要ファイルに日付列が無いため除外 ({})",
                    found.path.display()
                );
                tracing::warn!("{}", message);
                warnings.push(message);
                continue;
            }
            totals.headcount_slots += dated.sum();
            totals
                .dates
                .extend(dated.col_labels().iter().filter_map(|l| parse_date_label(l)));
            totals.loaded_files += 1;
        }

        totals
    }

    /// 残差（全体 − 対象職種）を他職種へ人数比で按分
    pub fn allocate_residual(
        &self,
        working: &WorkingData,
        total_hours: f64,
        target: &OccupationShortage,
        warnings: &mut Vec<String>,
    ) -> (Vec<OccupationShortage>, OccupationShortage) {
        let residual = total_hours - target.hours;

        let headcounts: Vec<(String, usize)> = working
            .headcount_by_role()
            .into_iter()
            .filter(|(role, _)| !role.contains(&self.target))
            .collect();
        let total_headcount: usize = headcounts.iter().map(|(_, n)| n).sum();

        let others: Vec<OccupationShortage> = if total_headcount == 0 {
            if residual != 0.0 {
                warnings.push(format!(
                    "按分先の職種が無いため残差 {:.1} 時間は「{}」にのみ計上",
                    residual, self.other_label
                ));
            }
            Vec::new()
        } else {
            headcounts
                .iter()
                .map(|(role, n)| {
                    let share = *n as f64 / total_headcount as f64;
                    let mut shortage =
                        OccupationShortage::new(role, residual * share, ValueSource::Proportional);
                    shortage.headcount = *n;
                    shortage.row_count = working.count_rows_for(std::slice::from_ref(role));
                    shortage.detail = Some(format!("人数比 {:.3}", share));
                    shortage
                })
                .collect()
        };

        let mut bucket = OccupationShortage::new(&self.other_label, residual, ValueSource::Proportional);
        bucket.headcount = total_headcount;
        bucket.row_count = others.iter().map(|o| o.row_count).sum();

        (others, bucket)
    }
}
