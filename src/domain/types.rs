// ==========================================
// シフト不足分析コア - 領域型定義
// ==========================================
// 測定値と推定値を型で区別する（ログ文字列に頼らない）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 値の出所 (Value Source)
// ==========================================
// 序列化形式: SCREAMING_SNAKE_CASE（DB 保存値と一致）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueSource {
    Measured,     // 職種固有の需要ファイルから直接算出
    Estimated,    // 需要データ無し → ヒューリスティック推定
    Proportional, // 残差を人数比で按分
}

impl ValueSource {
    /// 実測値か（推定・按分ではないか）
    pub fn is_measured(&self) -> bool {
        matches!(self, ValueSource::Measured)
    }
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueSource::Measured => write!(f, "MEASURED"),
            ValueSource::Estimated => write!(f, "ESTIMATED"),
            ValueSource::Proportional => write!(f, "PROPORTIONAL"),
        }
    }
}

impl std::str::FromStr for ValueSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MEASURED" => Ok(ValueSource::Measured),
            "ESTIMATED" => Ok(ValueSource::Estimated),
            "PROPORTIONAL" => Ok(ValueSource::Proportional),
            other => Err(format!("未知の ValueSource: {}", other)),
        }
    }
}

// ==========================================
// スロット長の決定経路 (Slot Hours Source)
// ==========================================
// 優先順: Explicit > LegacyMinutes > Detected > Default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotHoursSource {
    Explicit,      // 時間単位で明示指定
    LegacyMinutes, // 旧来の分単位指定
    Detected,      // 中間データのタイムスタンプ間隔から検出
    Default,       // 既定値へフォールバック
}

impl fmt::Display for SlotHoursSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotHoursSource::Explicit => write!(f, "EXPLICIT"),
            SlotHoursSource::LegacyMinutes => write!(f, "LEGACY_MINUTES"),
            SlotHoursSource::Detected => write!(f, "DETECTED"),
            SlotHoursSource::Default => write!(f, "DEFAULT"),
        }
    }
}

impl std::str::FromStr for SlotHoursSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EXPLICIT" => Ok(SlotHoursSource::Explicit),
            "LEGACY_MINUTES" => Ok(SlotHoursSource::LegacyMinutes),
            "DETECTED" => Ok(SlotHoursSource::Detected),
            "DEFAULT" => Ok(SlotHoursSource::Default),
            other => Err(format!("未知の SlotHoursSource: {}", other)),
        }
    }
}

/// 決定済みスロット長
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSlotHours {
    pub hours: f64,
    pub source: SlotHoursSource,
}

impl ResolvedSlotHours {
    pub fn new(hours: f64, source: SlotHoursSource) -> Self {
        Self { hours, source }
    }

    /// 分換算
    pub fn minutes(&self) -> f64 {
        self.hours * 60.0
    }
}
