// ==========================================
// ShortageRunRepository 統合テスト
// ==========================================
// 対象: 計算結果・職種別内訳の保存と読み出し
// ==========================================


use shift_shortage::config::ShortageConfig;
use shift_shortage::domain::{OccupationBreakdown, OccupationShortage, SlotMatrix, ValueSource};
use shift_shortage::engine::ShortageCalculator;
use shift_shortage::repository::{RunContext, ShortageRunRepository};
use shift_shortage::SlotHoursSource;
use test_helpers::create_test_db;

fn sample_result() -> shift_shortage::ShortageResult {
    let demand = SlotMatrix::from_rows(
        &["09:00", "09:30"],
        &["2025-06-01", "2025-06-02"],
        vec![vec![3.0, 1.0], vec![f64::NAN, 2.0]],
    )
    .unwrap();
    let staffing = SlotMatrix::from_rows(
        &["09:00", "09:30"],
        &["2025-06-01", "2025-06-02"],
        vec![vec![1.0, 2.0], vec![1.0, 2.0]],
    )
    .unwrap();
    ShortageCalculator::new(ShortageConfig::default())
        .unwrap()
        .calculate(&demand, &staffing, 0.5)
        .unwrap()
}

fn sample_breakdown() -> OccupationBreakdown {
    let mut target = OccupationShortage::new("介護", 146.0, ValueSource::Measured);
    target.demand_hours = Some(1500.0);
    target.staffed_hours = Some(1354.0);
    target.row_count = 2708;
    target.headcount = 20;

    OccupationBreakdown {
        target,
        others: vec![OccupationShortage::new("看護師", 54.0, ValueSource::Proportional)],
        other_bucket: OccupationShortage::new("その他職種", 54.0, ValueSource::Proportional),
        warnings: Vec::new(),
    }
}

#[test]
fn test_save_and_find_run() {
    let (_temp_file, db_path) = create_test_db().expect("テスト DB 作成失敗");
    let repo = ShortageRunRepository::new(&db_path).expect("リポジトリ作成失敗");
    let result = sample_result();

    let context = RunContext {
        demand_source: Some("demand.csv".to_string()),
        staffing_source: Some("staff.csv".to_string()),
        config_snapshot_json: Some("{}".to_string()),
    };
    let run_id = repo.save_run(&result, &context).expect("保存失敗");

    let summary = repo
        .find_run(&run_id)
        .expect("取得失敗")
        .expect("保存した結果が見つかるはず");

    assert_eq!(summary.run_id, run_id);
    assert_eq!(summary.demand_source.as_deref(), Some("demand.csv"));
    assert_eq!(summary.slot_hours, 0.5);
    assert_eq!(summary.slot_hours_source, SlotHoursSource::Explicit);
    assert_eq!(summary.net_hours, result.net_hours);
    assert_eq!(summary.shortage_hours, result.shortage_hours);
    assert!(!summary.data_integrity, "欠損セルあり");
    assert_eq!(summary.warnings, result.validation.warnings);

    let json = repo
        .find_result_json(&run_id)
        .expect("取得失敗")
        .expect("結果 JSON");
    let parsed: serde_json::Value = serde_json::from_str(&json).expect("JSON のはず");
    assert_eq!(parsed["slot_hours"], 0.5);
    assert!(parsed["balance"]["values"][1][0].is_null(), "欠損セルは null");
}

#[test]
fn test_find_unknown_run_is_none() {
    let (_temp_file, db_path) = create_test_db().expect("テスト DB 作成失敗");
    let repo = ShortageRunRepository::new(&db_path).expect("リポジトリ作成失敗");

    assert!(repo.find_run("missing").expect("取得失敗").is_none());
}

#[test]
fn test_list_recent_newest_first() {
    let (_temp_file, db_path) = create_test_db().expect("テスト DB 作成失敗");
    let repo = ShortageRunRepository::new(&db_path).expect("リポジトリ作成失敗");
    let result = sample_result();

    let first = repo.save_run(&result, &RunContext::default()).unwrap();
    let second = repo.save_run(&result, &RunContext::default()).unwrap();
    let third = repo.save_run(&result, &RunContext::default()).unwrap();

    let recent = repo.list_recent(2).expect("一覧取得失敗");

    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].run_id, third);
    assert_eq!(recent[1].run_id, second);
    assert!(recent.iter().all(|r| r.run_id != first));
}

#[test]
fn test_occupation_breakdown_round_trip_and_cascade() {
    let (_temp_file, db_path) = create_test_db().expect("テスト DB 作成失敗");
    let repo = ShortageRunRepository::new(&db_path).expect("リポジトリ作成失敗");
    let run_id = repo.save_run(&sample_result(), &RunContext::default()).unwrap();

    let saved = repo
        .save_occupation_breakdown(&run_id, &sample_breakdown())
        .expect("内訳保存失敗");
    assert_eq!(saved, 3);

    let rows = repo.list_occupation_shortages(&run_id).expect("内訳取得失敗");
    assert_eq!(rows.len(), 3);
    let care = rows.iter().find(|r| r.occupation == "介護").expect("介護の行");
    assert_eq!(care.source, ValueSource::Measured);
    assert_eq!(care.staffed_hours, Some(1354.0));
    assert_eq!(care.row_count, 2708);

    assert!(repo.delete_run(&run_id).expect("削除失敗"));
    assert!(repo.list_occupation_shortages(&run_id).unwrap().is_empty());
}

#[test]
fn test_breakdown_requires_existing_run() {
    let (_temp_file, db_path) = create_test_db().expect("テスト DB 作成失敗");
    let repo = ShortageRunRepository::new(&db_path).expect("リポジトリ作成失敗");

    let result = repo.save_occupation_breakdown("no-such-run", &sample_breakdown());
    assert!(result.is_err(), "外部キー制約で失敗するはず");
}
