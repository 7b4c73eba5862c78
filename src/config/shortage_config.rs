// ==========================================
// シフト不足分析コア - 計算パラメータ
// ==========================================
// 既定値は defaults モジュールに集約
// ==========================================

use crate::engine::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};

/// 過不足計算の設定一式
///
/// モジュール変数ではなく、呼び出し毎に明示的に渡す。
/// 保存先: config_kv（scope_id='global'）。欠けたキーは既定値。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortageConfig {
    /// 直接計算の対象職種（部分一致）
    #[serde(default = "defaults::target_occupation")]
    pub target_occupation: String,

    /// 「その他職種」まとめ枠のラベル
    #[serde(default = "defaults::other_occupations_label")]
    pub other_occupations_label: String,

    /// スロット長の既定値（時間）
    #[serde(default = "defaults::default_slot_hours")]
    pub default_slot_hours: f64,

    /// 自動検出を受け入れる下限・上限（時間）
    #[serde(default = "defaults::autodetect_min_hours")]
    pub autodetect_min_hours: f64,
    #[serde(default = "defaults::autodetect_max_hours")]
    pub autodetect_max_hours: f64,

    /// 1 日平均不足時間の妥当性しきい値
    #[serde(default = "defaults::plausible_daily_shortage_hours")]
    pub plausible_daily_shortage_hours: f64,

    /// 需要データ無し時の推定: 1 勤務あたり時間 × 想定不足率
    #[serde(default = "defaults::assumed_hours_per_shift")]
    pub assumed_hours_per_shift: f64,
    #[serde(default = "defaults::assumed_shortage_rate")]
    pub assumed_shortage_rate: f64,

    /// net = shortage − excess の許容相対誤差
    #[serde(default = "defaults::tolerance")]
    pub tolerance: f64,
}

pub mod defaults {
    pub const TARGET_OCCUPATION: &str = "介護";
    pub const OTHER_OCCUPATIONS_LABEL: &str = "その他職種";
    pub const DEFAULT_SLOT_HOURS: f64 = 0.5;
    pub const AUTODETECT_MIN_HOURS: f64 = 0.1;
    pub const AUTODETECT_MAX_HOURS: f64 = 2.0;
    pub const PLAUSIBLE_DAILY_SHORTAGE_HOURS: f64 = 12.0;
    pub const ASSUMED_HOURS_PER_SHIFT: f64 = 8.0;
    pub const ASSUMED_SHORTAGE_RATE: f64 = 0.1;
    pub const TOLERANCE: f64 = 1e-6;

    pub fn target_occupation() -> String {
        TARGET_OCCUPATION.to_string()
    }
    pub fn other_occupations_label() -> String {
        OTHER_OCCUPATIONS_LABEL.to_string()
    }
    pub fn default_slot_hours() -> f64 {
        DEFAULT_SLOT_HOURS
    }
    pub fn autodetect_min_hours() -> f64 {
        AUTODETECT_MIN_HOURS
    }
    pub fn autodetect_max_hours() -> f64 {
        AUTODETECT_MAX_HOURS
    }
    pub fn plausible_daily_shortage_hours() -> f64 {
        PLAUSIBLE_DAILY_SHORTAGE_HOURS
    }
    pub fn assumed_hours_per_shift() -> f64 {
        ASSUMED_HOURS_PER_SHIFT
    }
    pub fn assumed_shortage_rate() -> f64 {
        ASSUMED_SHORTAGE_RATE
    }
    pub fn tolerance() -> f64 {
        TOLERANCE
    }
}

impl Default for ShortageConfig {
    fn default() -> Self {
        Self {
            target_occupation: defaults::target_occupation(),
            other_occupations_label: defaults::other_occupations_label(),
            default_slot_hours: defaults::DEFAULT_SLOT_HOURS,
            autodetect_min_hours: defaults::AUTODETECT_MIN_HOURS,
            autodetect_max_hours: defaults::AUTODETECT_MAX_HOURS,
            plausible_daily_shortage_hours: defaults::PLAUSIBLE_DAILY_SHORTAGE_HOURS,
            assumed_hours_per_shift: defaults::ASSUMED_HOURS_PER_SHIFT,
            assumed_shortage_rate: defaults::ASSUMED_SHORTAGE_RATE,
            tolerance: defaults::TOLERANCE,
        }
    }
}

impl ShortageConfig {
    /// 対象職種だけ差し替えた設定
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target_occupation = target.into();
        self
    }

    /// 範囲チェック
    pub fn validate(&self) -> EngineResult<()> {
        if self.target_occupation.trim().is_empty() {
            return Err(EngineError::InvalidConfig {
                key: "target_occupation".to_string(),
                message: "空文字列は不可".to_string(),
            });
        }
        if !(self.default_slot_hours > 0.0 && self.default_slot_hours <= 24.0) {
            return Err(EngineError::invalid_parameter(
                "default_slot_hours",
                self.default_slot_hours,
                0.0,
                24.0,
            ));
        }
        if !(self.autodetect_min_hours > 0.0
            && self.autodetect_min_hours <= self.autodetect_max_hours
            && self.autodetect_max_hours <= 24.0)
        {
            return Err(EngineError::InvalidConfig {
                key: "autodetect_min_hours/autodetect_max_hours".to_string(),
                message: format!(
                    "0 < min <= max <= 24 を満たさない: [{}, {}]",
                    self.autodetect_min_hours, self.autodetect_max_hours
                ),
            });
        }
        if !(self.plausible_daily_shortage_hours > 0.0) {
            return Err(EngineError::invalid_parameter(
                "plausible_daily_shortage_hours",
                self.plausible_daily_shortage_hours,
                0.0,
                f64::INFINITY,
            ));
        }
        if !(self.assumed_hours_per_shift > 0.0 && self.assumed_hours_per_shift <= 24.0) {
            return Err(EngineError::invalid_parameter(
                "assumed_hours_per_shift",
                self.assumed_hours_per_shift,
                0.0,
                24.0,
            ));
        }
        if !(self.assumed_shortage_rate >= 0.0 && self.assumed_shortage_rate <= 1.0) {
            return Err(EngineError::InvalidConfig {
                key: "assumed_shortage_rate".to_string(),
                message: format!("0.0 - 1.0 の範囲外: {}", self.assumed_shortage_rate),
            });
        }
        if !(self.tolerance > 0.0) {
            return Err(EngineError::InvalidConfig {
                key: "tolerance".to_string(),
                message: format!("正の値が必要: {}", self.tolerance),
            });
        }
        Ok(())
    }
}
