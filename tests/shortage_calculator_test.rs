// ==========================================
// ShortageCalculator 統合テスト
// ==========================================
// 対象: 形状整合 → 過不足 → 統計 → 検証 の主フロー
// ==========================================


use shift_shortage::config::ShortageConfig;
use shift_shortage::domain::{SlotHoursSource, SlotMatrix};
use shift_shortage::engine::{EngineError, ShortageCalculator, SlotHoursRequest};
use test_helpers::{temp_dir, write_lines, write_matrix_csv};

fn calculator() -> ShortageCalculator {
    ShortageCalculator::new(ShortageConfig::default()).expect("既定設定は有効")
}

fn three_by_three(values: Vec<Vec<f64>>) -> SlotMatrix {
    SlotMatrix::from_rows(
        &["09:00", "09:30", "10:00"],
        &["2025-06-01", "2025-06-02", "2025-06-03"],
        values,
    )
    .expect("3×3 マトリクス")
}

#[test]
fn test_three_by_three_reference_balance() {
    let demand = three_by_three(vec![
        vec![2.0, 1.0, 3.0],
        vec![1.0, 2.0, 1.0],
        vec![3.0, 1.0, 2.0],
    ]);
    let staffing = three_by_three(vec![
        vec![3.0, 1.0, 2.0],
        vec![1.0, 3.0, 1.0],
        vec![2.0, 1.0, 3.0],
    ]);

    let result = calculator().calculate(&demand, &staffing, 0.5).unwrap();

    let expected = three_by_three(vec![
        vec![-1.0, 0.0, 1.0],
        vec![0.0, -1.0, 0.0],
        vec![1.0, 0.0, -1.0],
    ]);
    assert!(result.balance.equals(&expected), "balance が期待値と一致しない");
    // 不足 2 セル, 過剰 3 セル
    assert_eq!(result.shortage_hours, 1.0);
    assert_eq!(result.excess_hours, 1.5);
    assert_eq!(result.net_hours, -0.5);
    assert!(result.hours_consistent(1e-6));

    let stats = &result.statistics;
    assert!((stats.balance_efficiency - 0.8).abs() < 1e-12);
    assert!((stats.utilization_rate - 4.0 / 9.0).abs() < 1e-12);
    assert!(stats.concentration_index.abs() < 1e-12, "均等な不足は集中度 0");
    assert_eq!(stats.daily.days.len(), 3);
    assert_eq!(stats.daily.days[0].demand_hours, Some(3.0));
    assert_eq!(stats.daily.days[0].staffing_hours, Some(3.0));
    assert!(result.validation.is_clean(), "{:?}", result.validation);
}

#[test]
fn test_sign_decomposition_and_hour_consistency() {
    let demand = three_by_three(vec![
        vec![4.0, 0.0, 2.5],
        vec![1.0, 7.0, 0.0],
        vec![3.0, 3.0, 1.0],
    ]);
    let staffing = three_by_three(vec![
        vec![1.0, 2.0, 2.5],
        vec![6.0, 1.0, 0.0],
        vec![0.0, 3.5, 4.0],
    ]);

    for slot_hours in [0.1, 0.25, 0.5, 1.0, 1.5, 24.0] {
        let result = calculator().calculate(&demand, &staffing, slot_hours).unwrap();

        let recomposed = result
            .shortage_only
            .zip_with(&result.excess_only, |s, e| s - e)
            .unwrap();
        assert!(recomposed.equals(&result.balance), "shortage − excess ≠ balance");
        assert!(result.shortage_only.min().unwrap() >= 0.0);
        assert!(result.excess_only.min().unwrap() >= 0.0);
        assert!(
            result.hours_consistent(1e-6),
            "slot_hours={} で net ≠ shortage − excess",
            slot_hours
        );
    }
}

/// 決定的に生成したマトリクス（負値・欠損を含む）
fn generated_matrix(rows: usize, cols: usize, seed: usize) -> SlotMatrix {
    let row_labels: Vec<String> = (0..rows).map(|i| format!("{:02}:00", i)).collect();
    let col_labels: Vec<String> = (0..cols).map(|j| format!("2025-06-{:02}", j + 1)).collect();
    let values = (0..rows)
        .map(|i| {
            (0..cols)
                .map(|j| {
                    if (i + 2 * j + seed) % 7 == 0 {
                        f64::NAN
                    } else {
                        ((i * 7 + j * 13 + seed * 5) % 11) as f64 * 0.75 - 3.0
                    }
                })
                .collect()
        })
        .collect();
    let rows_ref: Vec<&str> = row_labels.iter().map(String::as_str).collect();
    let cols_ref: Vec<&str> = col_labels.iter().map(String::as_str).collect();
    SlotMatrix::from_rows(&rows_ref, &cols_ref, values).expect("生成マトリクス")
}

#[test]
fn test_sign_decomposition_on_generated_matrices() {
    for rows in 1..=4 {
        for cols in 1..=5 {
            for seed in 0..3 {
                let demand = generated_matrix(rows, cols, seed);
                let staffing = generated_matrix(rows, cols, seed + 4);
                let result = calculator().calculate(&demand, &staffing, 0.25).unwrap();

                let recomposed = result
                    .shortage_only
                    .zip_with(&result.excess_only, |s, e| s - e)
                    .unwrap();
                assert!(
                    recomposed.equals(&result.balance),
                    "{}×{} seed={} で shortage − excess ≠ balance",
                    rows,
                    cols,
                    seed
                );
                if let Some(min) = result.shortage_only.min() {
                    assert!(min >= 0.0);
                }
                if let Some(min) = result.excess_only.min() {
                    assert!(min >= 0.0);
                }
                assert!(result.hours_consistent(1e-6));
            }
        }
    }
}

#[test]
fn test_mismatched_days_are_reconciled() {
    let demand = SlotMatrix::from_rows(&["09:00"], &["DayA", "DayB"], vec![vec![3.0, 2.0]]).unwrap();
    let staffing =
        SlotMatrix::from_rows(&["09:00"], &["DayB", "DayC"], vec![vec![1.0, 5.0]]).unwrap();

    let result = calculator().calculate(&demand, &staffing, 1.0).unwrap();

    assert_eq!(result.balance.col_labels(), &["DayB".to_string()]);
    assert_eq!(result.net_hours, 1.0);
    assert!(result.validation.data_integrity);
    assert_eq!(result.validation.warnings.len(), 1, "形状不一致の警告が 1 件");
}

#[test]
fn test_disjoint_labels_yield_zero_results() {
    let demand = SlotMatrix::from_rows(&["09:00"], &["DayA"], vec![vec![3.0]]).unwrap();
    let staffing = SlotMatrix::from_rows(&["09:00"], &["DayB"], vec![vec![1.0]]).unwrap();

    let result = calculator().calculate(&demand, &staffing, 0.5).unwrap();

    assert_eq!(result.balance.n_cols(), 0);
    assert_eq!(result.net_hours, 0.0);
    assert_eq!(result.shortage_hours, 0.0);
    assert!(result.statistics.slots.peak_shortage.is_none());
    assert_eq!(result.statistics.utilization_rate, 0.0);
}

#[test]
fn test_slot_hours_range() {
    let m = SlotMatrix::from_rows(&["09:00"], &["D1"], vec![vec![1.0]]).unwrap();

    for bad in [25.0, 0.0, -1.0, f64::NAN] {
        let err = calculator().calculate(&m, &m, bad).unwrap_err();
        assert!(
            matches!(err, EngineError::InvalidParameter { .. }),
            "slot_hours={} は InvalidParameter のはず",
            bad
        );
    }
    assert!(calculator().calculate(&m, &m, 24.0).is_ok());
}

#[test]
fn test_overstaffing_is_not_an_error() {
    let demand = SlotMatrix::from_rows(&["09:00", "09:30"], &["D1"], vec![vec![1.0], vec![0.0]]).unwrap();
    let staffing =
        SlotMatrix::from_rows(&["09:00", "09:30"], &["D1"], vec![vec![4.0], vec![2.0]]).unwrap();

    let result = calculator().calculate(&demand, &staffing, 0.5).unwrap();

    assert_eq!(result.net_hours, -2.5);
    assert_eq!(result.shortage_hours, 0.0);
    assert_eq!(result.excess_hours, 2.5);
    let peak = result.statistics.slots.peak_excess.as_ref().unwrap();
    assert_eq!(peak.slot, "09:00");
    assert_eq!(peak.hours, 1.5);
    assert_eq!(result.statistics.concentration_index, 0.0);
}

#[test]
fn test_implausible_shortage_is_flagged_but_returned() {
    let demand = SlotMatrix::from_rows(&["09:00"], &["D1"], vec![vec![30.0]]).unwrap();
    let staffing = SlotMatrix::from_rows(&["09:00"], &["D1"], vec![vec![0.0]]).unwrap();

    let result = calculator().calculate(&demand, &staffing, 1.0).unwrap();

    assert_eq!(result.shortage_hours, 30.0);
    assert!(result.validation.calculation_accuracy);
    assert_eq!(result.validation.warnings.len(), 1);
}

#[test]
fn test_calculate_from_files_with_missing_cells() {
    let dir = temp_dir();
    let demand = write_matrix_csv(
        dir.path(),
        "demand.csv",
        &["09:00", "09:30"],
        &["2025-06-01", "2025-06-02"],
        &[vec![2.0, f64::NAN], vec![1.0, 1.0]],
    );
    let staffing = write_matrix_csv(
        dir.path(),
        "staff.csv",
        &["09:00", "09:30"],
        &["2025-06-01", "2025-06-02"],
        &[vec![1.0, 1.0], vec![1.0, 2.0]],
    );

    let result = calculator()
        .calculate_from_files(&demand, &staffing, &SlotHoursRequest::legacy_minutes(30.0))
        .unwrap();

    assert_eq!(result.slot_hours, 0.5);
    assert_eq!(result.slot_hours_source, SlotHoursSource::LegacyMinutes);
    // 欠損セルは合計から除外: (1 + 0 + (-1)) × 0.5
    assert_eq!(result.net_hours, 0.0);
    assert_eq!(result.shortage_hours, 0.5);
    assert!(!result.validation.data_integrity, "欠損ありなら data_integrity=false");
    assert!(result.validation.calculation_accuracy, "欠損は同位置なら一致扱い");
    assert_eq!(result.statistics.evaluated_cells, 3);

    let json = result.to_json_pretty().unwrap();
    assert!(json.contains("null"), "欠損セルは JSON で null");
}

#[test]
fn test_infinite_cells_count_as_missing() {
    let dir = temp_dir();
    let demand = write_lines(
        dir.path(),
        "demand.csv",
        &["slot,2025-06-01,2025-06-02".to_string(), "09:00,inf,2".to_string()],
    );
    let staffing = write_lines(
        dir.path(),
        "staff.csv",
        &["slot,2025-06-01,2025-06-02".to_string(), "09:00,inf,1".to_string()],
    );

    let result = calculator()
        .calculate_from_files(&demand, &staffing, &SlotHoursRequest::explicit(0.5))
        .unwrap();

    assert_eq!(result.net_hours, 0.5);
    assert!(!result.validation.data_integrity, "inf は欠損として扱う");
    assert!(!result.validation.warnings.is_empty());
}

#[test]
fn test_missing_input_file_is_import_error() {
    let dir = temp_dir();
    let missing = dir.path().join("nope.csv");

    let err = calculator()
        .calculate_from_files(&missing, &missing, &SlotHoursRequest::explicit(0.5))
        .unwrap_err();

    assert!(matches!(err, EngineError::Import(_)));
}
