// ==========================================
// シフト不足分析コア - スロット長リゾルバ
// ==========================================
// 優先順（先勝ち）:
//   1. 明示指定（時間）      0 < h <= 24
//   2. 旧来の分指定          0 < m <= 1440 → m / 60
//   3. 自動検出              中間データの最頻間隔, [0.1, 2.0] のみ採用
//   4. 既定値 0.5h（警告ログ）
// ==========================================

use crate::config::ShortageConfig;
use crate::domain::types::{ResolvedSlotHours, SlotHoursSource};
use crate::engine::error::{EngineError, EngineResult};
use crate::importer::table_loader::{columns, TableLoader};
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// 自動検出で読む中間データ
pub const INTERMEDIATE_DATA_FILE: &str = "intermediate_data.csv";

pub const MAX_SLOT_HOURS: f64 = 24.0;
pub const MAX_SLOT_MINUTES: f64 = 1440.0;

/// スロット長の決定要求
#[derive(Debug, Clone, Default)]
pub struct SlotHoursRequest {
    pub explicit_hours: Option<f64>,
    pub legacy_minutes: Option<f64>,
    pub auto_detect: bool,
    /// intermediate_data.csv を含むディレクトリ
    pub data_dir: Option<PathBuf>,
}

impl SlotHoursRequest {
    pub fn explicit(hours: f64) -> Self {
        Self {
            explicit_hours: Some(hours),
            ..Self::default()
        }
    }

    pub fn legacy_minutes(minutes: f64) -> Self {
        Self {
            legacy_minutes: Some(minutes),
            ..Self::default()
        }
    }

    pub fn detect_in(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            auto_detect: true,
            data_dir: Some(data_dir.into()),
            ..Self::default()
        }
    }
}

// ==========================================
// SlotHoursResolver
// ==========================================
pub struct SlotHoursResolver {
    default_hours: f64,
    detect_min_hours: f64,
    detect_max_hours: f64,
}

impl SlotHoursResolver {
    pub fn new(config: &ShortageConfig) -> Self {
        Self {
            default_hours: config.default_slot_hours,
            detect_min_hours: config.autodetect_min_hours,
            detect_max_hours: config.autodetect_max_hours,
        }
    }

    /// スロット長を決定する
    ///
    /// # 戻り値
    /// - Ok(ResolvedSlotHours): 値と決定経路
    /// - Err(InvalidParameter): 明示指定・分指定が範囲外
    pub fn resolve(&self, request: &SlotHoursRequest) -> EngineResult<ResolvedSlotHours> {
        if let Some(hours) = request.explicit_hours {
            let hours = validate_slot_hours(hours)?;
            if let Some(minutes) = request.legacy_minutes {
                tracing::debug!(
                    explicit_hours = hours,
                    legacy_minutes = minutes,
                    "明示指定を優先し、分指定は無視する"
                );
            }
            return Ok(ResolvedSlotHours::new(hours, SlotHoursSource::Explicit));
        }

        if let Some(minutes) = request.legacy_minutes {
            let minutes = validate_slot_minutes(minutes)?;
            return Ok(ResolvedSlotHours::new(
                minutes / 60.0,
                SlotHoursSource::LegacyMinutes,
            ));
        }

        if request.auto_detect {
            if let Some(dir) = request.data_dir.as_deref() {
                if let Some(hours) = self.detect_from_dir(dir) {
                    tracing::info!(slot_hours = hours, dir = %dir.display(), "スロット長を自動検出");
                    return Ok(ResolvedSlotHours::new(hours, SlotHoursSource::Detected));
                }
            }
        }

        tracing::warn!(
            default_hours = self.default_hours,
            "スロット長を決定できないため既定値を使用"
        );
        Ok(ResolvedSlotHours::new(
            self.default_hours,
            SlotHoursSource::Default,
        ))
    }

    /// ディレクトリ内の中間データから検出（失敗は None, 例外なし）
    pub fn detect_from_dir(&self, dir: &Path) -> Option<f64> {
        let path = dir.join(INTERMEDIATE_DATA_FILE);
        if !path.exists() {
            tracing::debug!(file = %path.display(), "中間データ無し, 自動検出をスキップ");
            return None;
        }

        match TableLoader.load_timestamps(&path, columns::TIMESTAMP) {
            Ok(timestamps) => self.detect_from_timestamps(&timestamps),
            Err(e) => {
                tracing::debug!(file = %path.display(), error = %e, "中間データ読み込み失敗");
                None
            }
        }
    }

    /// タイムスタンプ列から最頻間隔を求め、受け入れ範囲内なら時間で返す
    pub fn detect_from_timestamps(&self, timestamps: &[NaiveDateTime]) -> Option<f64> {
        let minutes = modal_delta_minutes(timestamps)?;
        let hours = minutes as f64 / 60.0;

        if hours < self.detect_min_hours || hours > self.detect_max_hours {
            tracing::warn!(
                detected_hours = hours,
                min = self.detect_min_hours,
                max = self.detect_max_hours,
                "検出したスロット長が受け入れ範囲外, 採用しない"
            );
            return None;
        }
        Some(hours)
    }
}

/// 明示指定（時間）の範囲チェック: 0 < h <= 24
pub fn validate_slot_hours(hours: f64) -> EngineResult<f64> {
    if hours > 0.0 && hours <= MAX_SLOT_HOURS {
        Ok(hours)
    } else {
        Err(EngineError::invalid_parameter(
            "slot_hours",
            hours,
            0.0,
            MAX_SLOT_HOURS,
        ))
    }
}

/// 分指定の範囲チェック: 0 < m <= 1440
pub fn validate_slot_minutes(minutes: f64) -> EngineResult<f64> {
    if minutes > 0.0 && minutes <= MAX_SLOT_MINUTES {
        Ok(minutes)
    } else {
        Err(EngineError::invalid_parameter(
            "slot_minutes",
            minutes,
            0.0,
            MAX_SLOT_MINUTES,
        ))
    }
}

/// 連続するタイムスタンプ差分の最頻値（分）
///
/// 同時刻の重複（複数スタッフ）は除去してから差分を取る。
/// 最頻値が並んだ場合は短い方。
pub fn modal_delta_minutes(timestamps: &[NaiveDateTime]) -> Option<i64> {
    let unique: BTreeSet<&NaiveDateTime> = timestamps.iter().collect();
    let ordered: Vec<&NaiveDateTime> = unique.into_iter().collect();

    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for pair in ordered.windows(2) {
        let minutes = (*pair[1] - *pair[0]).num_minutes();
        if minutes > 0 {
            *counts.entry(minutes).or_insert(0) += 1;
        }
    }

    // BTreeMap は昇順なので、同数なら先に見つかった短い間隔が残る
    let mut best: Option<(i64, usize)> = None;
    for (minutes, count) in counts {
        match best {
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((minutes, count)),
        }
    }
    best.map(|(minutes, _)| minutes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn series(step_minutes: i64, n: usize) -> Vec<NaiveDateTime> {
        let start = NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        (0..n)
            .map(|i| start + Duration::minutes(step_minutes * i as i64))
            .collect()
    }

    fn resolver() -> SlotHoursResolver {
        SlotHoursResolver::new(&ShortageConfig::default())
    }

    #[test]
    fn test_explicit_wins_over_legacy() {
        let request = SlotHoursRequest {
            explicit_hours: Some(0.25),
            legacy_minutes: Some(30.0),
            ..SlotHoursRequest::default()
        };
        let resolved = resolver().resolve(&request).unwrap();
        assert_eq!(resolved.hours, 0.25);
        assert_eq!(resolved.source, SlotHoursSource::Explicit);
    }

    #[test]
    fn test_legacy_minutes_converted() {
        let resolved = resolver()
            .resolve(&SlotHoursRequest::legacy_minutes(15.0))
            .unwrap();
        assert_eq!(resolved.hours, 0.25);
        assert_eq!(resolved.source, SlotHoursSource::LegacyMinutes);
    }

    #[test]
    fn test_explicit_boundaries() {
        assert!(validate_slot_hours(24.0).is_ok());
        assert!(validate_slot_hours(0.0).is_err());
        assert!(validate_slot_hours(25.0).is_err());
        assert!(validate_slot_hours(f64::NAN).is_err());
        assert!(validate_slot_minutes(1440.0).is_ok());
        assert!(validate_slot_minutes(1441.0).is_err());
        assert!(validate_slot_minutes(-30.0).is_err());
    }

    #[test]
    fn test_modal_delta_ignores_duplicates_and_gaps() {
        let mut timestamps = series(30, 10);
        timestamps.extend(series(30, 10)); // 別スタッフの同時刻
        timestamps.push(timestamps[9] + Duration::hours(5)); // 夜間の空白
        assert_eq!(modal_delta_minutes(&timestamps), Some(30));
    }

    #[test]
    fn test_modal_delta_tie_prefers_shorter() {
        let start = series(0, 1)[0];
        let timestamps = vec![
            start,
            start + Duration::minutes(15),
            start + Duration::minutes(45),
        ];
        assert_eq!(modal_delta_minutes(&timestamps), Some(15));
    }

    #[test]
    fn test_detection_rejects_three_hour_slots() {
        assert_eq!(resolver().detect_from_timestamps(&series(180, 8)), None);
        assert_eq!(resolver().detect_from_timestamps(&series(60, 8)), Some(1.0));
    }

    #[test]
    fn test_detection_needs_two_distinct_timestamps() {
        assert_eq!(resolver().detect_from_timestamps(&series(30, 1)), None);
    }

    #[test]
    fn test_missing_dir_falls_back_to_default() {
        let request = SlotHoursRequest::detect_in("/nonexistent/shift-shortage");
        let resolved = resolver().resolve(&request).unwrap();
        assert_eq!(resolved.hours, 0.5);
        assert_eq!(resolved.source, SlotHoursSource::Default);
    }
}
