// ==========================================
// シフト不足分析コア - 形状リコンサイラ
// ==========================================
// 行・列ラベル集合が異なる場合は共通部分に揃える（需要側の順序を保持）
// 共通部分が空でも例外にせず、0 行 / 0 列のマトリクスを返す
// ==========================================

use crate::domain::matrix::SlotMatrix;
use std::collections::HashSet;

/// 揃えた結果
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileOutcome {
    pub demand: SlotMatrix,
    pub staffing: SlotMatrix,
    /// ラベル集合が異なり切り詰めたか
    pub changed: bool,
    pub dropped_rows: Vec<String>,
    pub dropped_cols: Vec<String>,
}

impl ReconcileOutcome {
    /// 切り詰めが発生した場合の警告文
    pub fn warning(&self) -> Option<String> {
        if !self.changed {
            return None;
        }
        Some(format!(
            "需要と配置の形状が不一致のため共通部分に揃えた: {}行×{}列 (除外 行={:?}, 列={:?})",
            self.demand.n_rows(),
            self.demand.n_cols(),
            self.dropped_rows,
            self.dropped_cols
        ))
    }
}

// ==========================================
// ShapeReconciler
// ==========================================
pub struct ShapeReconciler;

impl ShapeReconciler {
    pub fn new() -> Self {
        Self
    }

    /// 2 つのマトリクスを同一ラベル・同一形状に揃える
    pub fn reconcile(&self, demand: &SlotMatrix, staffing: &SlotMatrix) -> ReconcileOutcome {
        if demand.same_labels(staffing) {
            return ReconcileOutcome {
                demand: demand.clone(),
                staffing: staffing.clone(),
                changed: false,
                dropped_rows: Vec::new(),
                dropped_cols: Vec::new(),
            };
        }

        let (rows, dropped_rows) = intersect(demand.row_labels(), staffing.row_labels());
        let (cols, dropped_cols) = intersect(demand.col_labels(), staffing.col_labels());
        let changed = !dropped_rows.is_empty() || !dropped_cols.is_empty();

        if changed {
            tracing::warn!(
                demand_shape = ?(demand.n_rows(), demand.n_cols()),
                staffing_shape = ?(staffing.n_rows(), staffing.n_cols()),
                common_shape = ?(rows.len(), cols.len()),
                "需要と配置の形状不一致, 共通部分に揃える"
            );
        }

        // 集合が同じで順序だけ違う場合も、配置側を需要側の順序に並べ替える
        ReconcileOutcome {
            demand: demand.select(&rows, &cols),
            staffing: staffing.select(&rows, &cols),
            changed,
            dropped_rows,
            dropped_cols,
        }
    }
}

impl Default for ShapeReconciler {
    fn default() -> Self {
        Self::new()
    }
}

/// 共通ラベル（左側の順序）と、どちらか一方にしか無いラベル
fn intersect(left: &[String], right: &[String]) -> (Vec<String>, Vec<String>) {
    let left_set: HashSet<&str> = left.iter().map(String::as_str).collect();
    let right_set: HashSet<&str> = right.iter().map(String::as_str).collect();

    let common: Vec<String> = left
        .iter()
        .filter(|l| right_set.contains(l.as_str()))
        .cloned()
        .collect();

    let dropped: Vec<String> = left
        .iter()
        .filter(|l| !right_set.contains(l.as_str()))
        .chain(right.iter().filter(|r| !left_set.contains(r.as_str())))
        .cloned()
        .collect();

    (common, dropped)
}
