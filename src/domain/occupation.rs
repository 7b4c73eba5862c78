// ==========================================
// シフト不足分析コア - 職種別過不足
// ==========================================
// 対象職種: 職種固有の需要データで直接算出 (MEASURED)
//          需要データ無しなら推定 (ESTIMATED)
// その他職種: 残差を人数比で按分 (PROPORTIONAL)
// ==========================================

use crate::domain::types::ValueSource;
use serde::Serialize;
use std::collections::BTreeMap;

/// 職種 1 件分の過不足（時間, 符号付き）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OccupationShortage {
    pub occupation: String,
    pub hours: f64,                  // 正=不足, 負=過剰（クリップしない）
    pub source: ValueSource,
    pub demand_hours: Option<f64>,   // MEASURED のみ
    pub staffed_hours: Option<f64>,
    pub row_count: usize,            // 勤務データ行数
    pub headcount: usize,            // 実人数
    pub detail: Option<String>,
}

impl OccupationShortage {
    /// 値のみの簡易構築（詳細は後から埋める）
    pub fn new(occupation: impl Into<String>, hours: f64, source: ValueSource) -> Self {
        Self {
            occupation: occupation.into(),
            hours,
            source,
            demand_hours: None,
            staffed_hours: None,
            row_count: 0,
            headcount: 0,
            detail: None,
        }
    }

    pub fn is_surplus(&self) -> bool {
        self.hours < 0.0
    }
}

/// 職種別内訳
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OccupationBreakdown {
    /// 直接計算の対象職種
    pub target: OccupationShortage,
    /// その他職種の按分結果（比較用ベースライン）
    pub others: Vec<OccupationShortage>,
    /// 「その他職種」まとめ枠（= 残差）
    pub other_bucket: OccupationShortage,
    pub warnings: Vec<String>,
}

impl OccupationBreakdown {
    /// 職種ラベル → 符号付き時間（対象職種 + その他職種まとめ枠）
    pub fn as_map(&self) -> BTreeMap<String, f64> {
        let mut map = BTreeMap::new();
        map.insert(self.target.occupation.clone(), self.target.hours);
        map.insert(self.other_bucket.occupation.clone(), self.other_bucket.hours);
        map
    }

    /// 按分内訳の合計（まとめ枠と一致するはず）
    pub fn proportional_total(&self) -> f64 {
        self.others.iter().map(|o| o.hours).sum()
    }
}
