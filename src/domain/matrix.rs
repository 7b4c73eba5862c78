// ==========================================
// シフト不足分析コア - 時間帯×日付マトリクス
// ==========================================
// 行: 時間帯ラベル ("09:00", "09:30", ...)
// 列: 日付ラベル ("2025-06-01", ...)
// 欠損セルは NaN で表現し、合計・最小値では無視する
// ==========================================

use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;

/// マトリクス構築エラー
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatrixError {
    #[error("行数不一致: ラベル {labels} 件に対し値 {values} 行")]
    RowCountMismatch { labels: usize, values: usize },

    #[error("列数不一致 (行 {row}): ラベル {labels} 件に対し値 {values} 件")]
    ColumnCountMismatch {
        row: usize,
        labels: usize,
        values: usize,
    },

    #[error("ラベル重複 ({axis}): {label}")]
    DuplicateLabel { axis: &'static str, label: String },

    #[error("ラベル不一致: 行または列のラベルが一致しない")]
    LabelMismatch,
}

// ==========================================
// SlotMatrix - 需要/配置/過不足の共通表現
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotMatrix {
    row_labels: Vec<String>,
    col_labels: Vec<String>,
    values: Vec<Vec<f64>>,
}

impl SlotMatrix {
    /// ラベルと行優先の値からマトリクスを構築
    ///
    /// # 引数
    /// - row_labels: 時間帯ラベル（重複不可）
    /// - col_labels: 日付ラベル（重複不可）
    /// - values: values[行][列]
    pub fn new(
        row_labels: Vec<String>,
        col_labels: Vec<String>,
        values: Vec<Vec<f64>>,
    ) -> Result<Self, MatrixError> {
        if row_labels.len() != values.len() {
            return Err(MatrixError::RowCountMismatch {
                labels: row_labels.len(),
                values: values.len(),
            });
        }
        for (row, cells) in values.iter().enumerate() {
            if cells.len() != col_labels.len() {
                return Err(MatrixError::ColumnCountMismatch {
                    row,
                    labels: col_labels.len(),
                    values: cells.len(),
                });
            }
        }
        ensure_unique("row", &row_labels)?;
        ensure_unique("column", &col_labels)?;

        Ok(Self {
            row_labels,
            col_labels,
            values,
        })
    }

    /// &str ラベルから構築するショートカット（テスト・呼び出し側向け）
    pub fn from_rows(
        row_labels: &[&str],
        col_labels: &[&str],
        values: Vec<Vec<f64>>,
    ) -> Result<Self, MatrixError> {
        Self::new(
            row_labels.iter().map(|s| s.to_string()).collect(),
            col_labels.iter().map(|s| s.to_string()).collect(),
            values,
        )
    }

    /// 0 行 0 列のマトリクス
    pub fn empty() -> Self {
        Self {
            row_labels: Vec::new(),
            col_labels: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    pub fn col_labels(&self) -> &[String] {
        &self.col_labels
    }

    pub fn n_rows(&self) -> usize {
        self.row_labels.len()
    }

    pub fn n_cols(&self) -> usize {
        self.col_labels.len()
    }

    /// セル数 (行数 × 列数)
    pub fn cell_count(&self) -> usize {
        self.n_rows() * self.n_cols()
    }

    /// 行または列が 0 件
    pub fn is_empty(&self) -> bool {
        self.cell_count() == 0
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.values.get(row).and_then(|r| r.get(col)).copied()
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.values
    }

    /// 全セルを行優先で走査（欠損を含む）
    pub fn cells(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().flat_map(|r| r.iter().copied())
    }

    /// 欠損を除いたセル
    pub fn present_cells(&self) -> impl Iterator<Item = f64> + '_ {
        self.cells().filter(|v| !v.is_nan())
    }

    pub fn row_index(&self, label: &str) -> Option<usize> {
        self.row_labels.iter().position(|l| l == label)
    }

    pub fn col_index(&self, label: &str) -> Option<usize> {
        self.col_labels.iter().position(|l| l == label)
    }

    /// 行・列ラベルが順序まで完全一致するか
    pub fn same_labels(&self, other: &SlotMatrix) -> bool {
        self.row_labels == other.row_labels && self.col_labels == other.col_labels
    }

    pub fn has_missing(&self) -> bool {
        self.cells().any(f64::is_nan)
    }

    pub fn missing_count(&self) -> usize {
        self.cells().filter(|v| v.is_nan()).count()
    }

    /// 欠損を無視した総和（空なら 0.0）
    pub fn sum(&self) -> f64 {
        self.present_cells().sum()
    }

    /// 列（日付）ごとの総和
    pub fn column_sums(&self) -> Vec<f64> {
        (0..self.n_cols())
            .map(|c| {
                self.values
                    .iter()
                    .map(|r| r[c])
                    .filter(|v| !v.is_nan())
                    .sum()
            })
            .collect()
    }

    /// 行（時間帯）ごとの総和
    pub fn row_sums(&self) -> Vec<f64> {
        self.values
            .iter()
            .map(|r| r.iter().copied().filter(|v| !v.is_nan()).sum())
            .collect()
    }

    /// 欠損を除いた最小値（有効セルが無ければ None）
    pub fn min(&self) -> Option<f64> {
        self.present_cells().reduce(f64::min)
    }

    /// 各セルに関数を適用した新しいマトリクス
    pub fn map<F>(&self, f: F) -> SlotMatrix
    where
        F: Fn(f64) -> f64,
    {
        SlotMatrix {
            row_labels: self.row_labels.clone(),
            col_labels: self.col_labels.clone(),
            values: self
                .values
                .iter()
                .map(|r| r.iter().map(|&v| f(v)).collect())
                .collect(),
        }
    }

    /// 下限でクリップ（欠損は欠損のまま）
    pub fn clip_lower(&self, floor: f64) -> SlotMatrix {
        self.map(|v| if v.is_nan() { v } else { v.max(floor) })
    }

    /// 同一ラベルのマトリクス同士でセル演算
    pub fn zip_with<F>(&self, other: &SlotMatrix, f: F) -> Result<SlotMatrix, MatrixError>
    where
        F: Fn(f64, f64) -> f64,
    {
        if !self.same_labels(other) {
            return Err(MatrixError::LabelMismatch);
        }
        let values = self
            .values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| a.iter().zip(b.iter()).map(|(&x, &y)| f(x, y)).collect())
            .collect();

        Ok(SlotMatrix {
            row_labels: self.row_labels.clone(),
            col_labels: self.col_labels.clone(),
            values,
        })
    }

    /// 指定ラベルで部分マトリクスを切り出す（存在しないラベルは無視）
    pub fn select(&self, rows: &[String], cols: &[String]) -> SlotMatrix {
        let row_idx: Vec<usize> = rows.iter().filter_map(|l| self.row_index(l)).collect();
        let col_idx: Vec<usize> = cols.iter().filter_map(|l| self.col_index(l)).collect();

        SlotMatrix {
            row_labels: row_idx.iter().map(|&i| self.row_labels[i].clone()).collect(),
            col_labels: col_idx.iter().map(|&j| self.col_labels[j].clone()).collect(),
            values: row_idx
                .iter()
                .map(|&i| col_idx.iter().map(|&j| self.values[i][j]).collect())
                .collect(),
        }
    }

    /// 条件を満たす列だけを残す
    pub fn retain_columns<F>(&self, keep: F) -> SlotMatrix
    where
        F: Fn(&str) -> bool,
    {
        let cols: Vec<String> = self
            .col_labels
            .iter()
            .filter(|l| keep(l))
            .cloned()
            .collect();
        self.select(&self.row_labels, &cols)
    }

    /// 値の同一性比較（同位置の欠損は一致とみなす）
    pub fn equals(&self, other: &SlotMatrix) -> bool {
        self.same_labels(other)
            && self
                .cells()
                .zip(other.cells())
                .all(|(a, b)| a == b || (a.is_nan() && b.is_nan()))
    }
}

fn ensure_unique(axis: &'static str, labels: &[String]) -> Result<(), MatrixError> {
    let mut seen = HashSet::new();
    for label in labels {
        if !seen.insert(label.as_str()) {
            return Err(MatrixError::DuplicateLabel {
                axis,
                label: label.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SlotMatrix {
        SlotMatrix::from_rows(
            &["09:00", "09:30"],
            &["2025-06-01", "2025-06-02"],
            vec![vec![1.0, 2.0], vec![f64::NAN, 4.0]],
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_ragged_rows() {
        let result = SlotMatrix::from_rows(&["a", "b"], &["x"], vec![vec![1.0], vec![1.0, 2.0]]);
        assert!(matches!(
            result,
            Err(MatrixError::ColumnCountMismatch { row: 1, .. })
        ));
    }

    #[test]
    fn test_new_rejects_duplicate_labels() {
        let result = SlotMatrix::from_rows(&["a", "a"], &["x"], vec![vec![1.0], vec![2.0]]);
        assert!(matches!(result, Err(MatrixError::DuplicateLabel { .. })));
    }

    #[test]
    fn test_sums_skip_missing() {
        let m = sample();
        assert_eq!(m.sum(), 7.0);
        assert_eq!(m.column_sums(), vec![1.0, 6.0]);
        assert_eq!(m.row_sums(), vec![3.0, 4.0]);
        assert_eq!(m.missing_count(), 1);
    }

    #[test]
    fn test_clip_keeps_missing() {
        let m = SlotMatrix::from_rows(&["a"], &["x", "y", "z"], vec![vec![-1.0, f64::NAN, 2.0]])
            .unwrap();
        let clipped = m.clip_lower(0.0);
        assert_eq!(clipped.get(0, 0), Some(0.0));
        assert!(clipped.get(0, 1).unwrap().is_nan());
        assert_eq!(clipped.get(0, 2), Some(2.0));
    }

    #[test]
    fn test_equals_treats_aligned_missing_as_equal() {
        let m = sample();
        assert!(m.equals(&m.clone()));
        let shifted = m.map(|v| v + 1.0);
        assert!(!m.equals(&shifted));
    }

    #[test]
    fn test_empty_matrix_sums_to_zero() {
        let m = SlotMatrix::empty();
        assert!(m.is_empty());
        assert_eq!(m.sum(), 0.0);
        assert_eq!(m.min(), None);
    }
}
