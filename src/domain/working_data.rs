// ==========================================
// シフト不足分析コア - 勤務データ（ロング形式）
// ==========================================
// 1 行 = 1 スタッフ × 1 職種 × 1 スロットの勤務記録
// 職種別の配置時間 = 行数 × slot_hours
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// 勤務記録 1 行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkingRecord {
    pub ds: NaiveDateTime,              // スロット開始時刻
    pub staff: String,                  // スタッフ識別子
    pub role: String,                   // 職種ラベル
    pub employment: Option<String>,     // 雇用形態（任意）
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkingData {
    records: Vec<WorkingRecord>,
}

impl WorkingData {
    pub fn new(records: Vec<WorkingRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[WorkingRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 出現する職種ラベル（昇順・重複なし）
    pub fn role_labels(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.role.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// 対象名を部分文字列として含む職種ラベル
    pub fn roles_containing(&self, target: &str) -> Vec<String> {
        self.role_labels()
            .into_iter()
            .filter(|role| role.contains(target))
            .collect()
    }

    /// 指定職種に属する行数
    pub fn count_rows_for(&self, roles: &[String]) -> usize {
        let wanted: HashSet<&str> = roles.iter().map(String::as_str).collect();
        self.records
            .iter()
            .filter(|r| wanted.contains(r.role.as_str()))
            .count()
    }

    /// 指定職種に属する実人数
    pub fn headcount_for(&self, roles: &[String]) -> usize {
        let wanted: HashSet<&str> = roles.iter().map(String::as_str).collect();
        self.records
            .iter()
            .filter(|r| wanted.contains(r.role.as_str()))
            .map(|r| r.staff.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// 勤務データに含まれる暦日
    pub fn distinct_dates(&self) -> BTreeSet<NaiveDate> {
        self.records.iter().map(|r| r.ds.date()).collect()
    }

    pub fn distinct_day_count(&self) -> usize {
        self.distinct_dates().len()
    }

    /// 職種ごとの実人数（スタッフ識別子の重複除去）
    pub fn headcount_by_role(&self) -> BTreeMap<String, usize> {
        let mut staff_by_role: BTreeMap<String, HashSet<&str>> = BTreeMap::new();
        for record in &self.records {
            staff_by_role
                .entry(record.role.clone())
                .or_default()
                .insert(record.staff.as_str());
        }
        staff_by_role
            .into_iter()
            .map(|(role, staff)| (role, staff.len()))
            .collect()
    }
}
