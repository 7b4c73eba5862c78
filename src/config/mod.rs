// ==========================================
// シフト不足分析コア - 設定層
// ==========================================
// 責務: 計算パラメータの既定値と上書き管理
// 保存先: config_kv テーブル
// ==========================================

pub mod config_manager;
pub mod config_reader_trait;
pub mod shortage_config;

pub use config_manager::{config_keys, ConfigManager};
pub use config_reader_trait::ShortageConfigReader;
pub use shortage_config::ShortageConfig;
