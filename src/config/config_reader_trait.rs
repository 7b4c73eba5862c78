// ==========================================
// シフト不足分析コア - 設定読み取り Trait
// ==========================================
// 責務: 計算層が必要とする設定の読み取りインターフェース（実装を含まない）
// 原則: 書き込み・業務ロジックを含めない
// ==========================================

use crate::config::shortage_config::ShortageConfig;
use crate::repository::error::RepositoryResult;

// ==========================================
// ShortageConfigReader Trait
// ==========================================
// 実装者: ConfigManager（config_kv テーブルから読む）
pub trait ShortageConfigReader: Send + Sync {
    /// 直接計算の対象職種
    ///
    /// # 既定値
    /// - 介護
    fn get_target_occupation(&self) -> RepositoryResult<String>;

    /// 「その他職種」まとめ枠のラベル
    fn get_other_occupations_label(&self) -> RepositoryResult<String>;

    /// スロット長の既定値（時間）
    ///
    /// # 既定値
    /// - 0.5
    fn get_default_slot_hours(&self) -> RepositoryResult<f64>;

    /// 自動検出の受け入れ範囲 (下限, 上限)
    ///
    /// # 既定値
    /// - (0.1, 2.0)
    fn get_autodetect_range(&self) -> RepositoryResult<(f64, f64)>;

    /// 1 日平均不足時間の妥当性しきい値
    fn get_plausible_daily_shortage_hours(&self) -> RepositoryResult<f64>;

    /// 需要データ無し時の推定パラメータ (1 勤務あたり時間, 想定不足率)
    ///
    /// # 既定値
    /// - (8.0, 0.1)
    fn get_estimate_parameters(&self) -> RepositoryResult<(f64, f64)>;

    fn get_tolerance(&self) -> RepositoryResult<f64>;

    /// 全項目をまとめて読む
    fn load_shortage_config(&self) -> RepositoryResult<ShortageConfig> {
        let (autodetect_min_hours, autodetect_max_hours) = self.get_autodetect_range()?;
        let (assumed_hours_per_shift, assumed_shortage_rate) = self.get_estimate_parameters()?;
        Ok(ShortageConfig {
            target_occupation: self.get_target_occupation()?,
            other_occupations_label: self.get_other_occupations_label()?,
            default_slot_hours: self.get_default_slot_hours()?,
            autodetect_min_hours,
            autodetect_max_hours,
            plausible_daily_shortage_hours: self.get_plausible_daily_shortage_hours()?,
            assumed_hours_per_shift,
            assumed_shortage_rate,
            tolerance: self.get_tolerance()?,
        })
    }
}
