// ==========================================
// ConfigManager 統合テスト
// ==========================================
// 対象: config_kv からの設定読み込みと既定値フォールバック
// ==========================================


use shift_shortage::config::{config_keys, ConfigManager, ShortageConfig, ShortageConfigReader};
use shift_shortage::engine::{EngineError, ShortageCalculator};
use test_helpers::{create_test_db, insert_test_config, open_test_connection};

#[test]
fn test_config_manager_creation() {
    let (_temp_file, db_path) = create_test_db().expect("テスト DB 作成失敗");

    let config_manager = ConfigManager::new(&db_path);
    assert!(config_manager.is_ok(), "ConfigManager を作成できるはず");
}

#[test]
fn test_defaults_without_overrides() {
    let (_temp_file, db_path) = create_test_db().expect("テスト DB 作成失敗");
    let manager = ConfigManager::new(&db_path).expect("ConfigManager 作成失敗");

    let config = manager.load_shortage_config().expect("設定読み込み失敗");

    assert_eq!(config, ShortageConfig::default());
    assert_eq!(config.target_occupation, "介護");
    assert_eq!(config.default_slot_hours, 0.5);
}

#[test]
fn test_overrides_and_malformed_values() {
    let (_temp_file, db_path) = create_test_db().expect("テスト DB 作成失敗");
    let conn = open_test_connection(&db_path).expect("DB 接続失敗");
    insert_test_config(&conn).expect("テスト設定の投入失敗");

    let manager = ConfigManager::new(&db_path).expect("ConfigManager 作成失敗");
    let config = manager.load_shortage_config().expect("設定読み込み失敗");

    assert_eq!(config.target_occupation, "看護");
    assert_eq!(config.default_slot_hours, 0.25);
    assert_eq!(config.plausible_daily_shortage_hours, 6.0);
    assert_eq!(config.assumed_shortage_rate, 0.1, "不正値は既定値へ");
    assert_eq!(config.assumed_hours_per_shift, 8.0);
}

#[test]
fn test_out_of_range_config_is_rejected_by_calculator() {
    let (_temp_file, db_path) = create_test_db().expect("テスト DB 作成失敗");
    let manager = ConfigManager::new(&db_path).expect("ConfigManager 作成失敗");
    manager
        .set_config_value(config_keys::DEFAULT_SLOT_HOURS, "48")
        .expect("書き込み失敗");

    let config = manager.load_shortage_config().expect("設定読み込み失敗");
    let err = ShortageCalculator::new(config).err().expect("範囲外はエラー");

    assert!(matches!(err, EngineError::InvalidParameter { .. }));
}

#[test]
fn test_snapshot_contains_overrides() {
    let (_temp_file, db_path) = create_test_db().expect("テスト DB 作成失敗");
    let manager = ConfigManager::new(&db_path).expect("ConfigManager 作成失敗");
    manager
        .set_config_value(config_keys::TARGET_OCCUPATION, "介護")
        .expect("書き込み失敗");
    manager
        .set_config_value(config_keys::TOLERANCE, "0.0001")
        .expect("書き込み失敗");

    let snapshot = manager.get_config_snapshot().expect("スナップショット失敗");
    let parsed: serde_json::Value = serde_json::from_str(&snapshot).expect("JSON のはず");

    assert_eq!(parsed["target_occupation"], "介護");
    assert_eq!(parsed["tolerance"], "0.0001");
}
