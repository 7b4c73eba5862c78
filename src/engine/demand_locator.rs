// ==========================================
// シフト不足分析コア - 職種別需要ファイル探索
// ==========================================
// ファイル名規約: need_per_date_slot_role_<職種>.csv
// 照合は順序付きの戦略チェーン: 完全一致 → 正規化一致 → 部分一致
// 最初にヒットした戦略の結果を採用し、全職種分をパス重複なしで集める
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEMAND_FILE_PREFIX: &str = "need_per_date_slot_role_";
pub const DEMAND_FILE_EXTENSION: &str = "csv";

/// 正規化で除去する記号（半角・全角）
const STRIPPED_CHARS: &[char] = &[
    '(', ')', '[', ']', '{', '}', '（', '）', '【', '】', '「', '」', '・', '･', '_', '-', '－',
    'ー', '/', '／', '.', '．', ',', '，', '、', '。', ':', '：', '　', ' ',
];

/// ディレクトリ内の需要ファイル候補
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemandFileCandidate {
    pub path: PathBuf,
    /// ファイル名から取り出した職種ラベル
    pub role_label: String,
}

/// 職種 → ファイルの照合結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemandFileMatch {
    pub role: String,
    pub path: PathBuf,
    pub matcher: &'static str,
}

// ==========================================
// Trait: DemandFileMatcher
// ==========================================
// 1 戦略 = 「一致した候補」または「一致なし（空）」を返す
pub trait DemandFileMatcher {
    fn name(&self) -> &'static str;

    fn find<'a>(
        &self,
        role: &str,
        candidates: &'a [DemandFileCandidate],
    ) -> Vec<&'a DemandFileCandidate>;
}

/// 完全一致
pub struct ExactMatcher;

impl DemandFileMatcher for ExactMatcher {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn find<'a>(
        &self,
        role: &str,
        candidates: &'a [DemandFileCandidate],
    ) -> Vec<&'a DemandFileCandidate> {
        candidates.iter().filter(|c| c.role_label == role).collect()
    }
}

/// 記号・空白を除去して一致
pub struct NormalizedMatcher;

impl DemandFileMatcher for NormalizedMatcher {
    fn name(&self) -> &'static str {
        "normalized"
    }

    fn find<'a>(
        &self,
        role: &str,
        candidates: &'a [DemandFileCandidate],
    ) -> Vec<&'a DemandFileCandidate> {
        let wanted = normalize_role_label(role);
        if wanted.is_empty() {
            return Vec::new();
        }
        candidates
            .iter()
            .filter(|c| normalize_role_label(&c.role_label) == wanted)
            .collect()
    }
}

/// 正規化後の部分一致（どちらがどちらを含んでもよい）
pub struct SubstringMatcher;

impl DemandFileMatcher for SubstringMatcher {
    fn name(&self) -> &'static str {
        "substring"
    }

    fn find<'a>(
        &self,
        role: &str,
        candidates: &'a [DemandFileCandidate],
    ) -> Vec<&'a DemandFileCandidate> {
        let wanted = normalize_role_label(role);
        if wanted.is_empty() {
            return Vec::new();
        }
        candidates
            .iter()
            .filter(|c| {
                let label = normalize_role_label(&c.role_label);
                !label.is_empty() && (label.contains(&wanted) || wanted.contains(&label))
            })
            .collect()
    }
}

/// 記号・空白を除去した職種ラベル
pub fn normalize_role_label(label: &str) -> String {
    label
        .chars()
        .filter(|c| !STRIPPED_CHARS.contains(c) && !c.is_whitespace())
        .collect()
}

// ==========================================
// DemandFileLocator
// ==========================================
pub struct DemandFileLocator {
    matchers: Vec<Box<dyn DemandFileMatcher>>,
}

impl DemandFileLocator {
    /// 既定チェーン: exact → normalized → substring
    pub fn new() -> Self {
        Self::with_matchers(vec![
            Box::new(ExactMatcher),
            Box::new(NormalizedMatcher),
            Box::new(SubstringMatcher),
        ])
    }

    pub fn with_matchers(matchers: Vec<Box<dyn DemandFileMatcher>>) -> Self {
        Self { matchers }
    }

    /// ディレクトリ内の需要ファイル候補（ファイル名順）
    pub fn scan(&self, dir: &Path) -> ImportResult<Vec<DemandFileCandidate>> {
        if !dir.is_dir() {
            return Err(ImportError::FileNotFound(dir.display().to_string()));
        }

        let mut candidates = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if let Some(role_label) = role_label_from_path(&path) {
                candidates.push(DemandFileCandidate { path, role_label });
            }
        }
        candidates.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(candidates)
    }

    /// 職種ごとにチェーンを評価し、ヒットしたファイルを重複なしで返す
    pub fn locate(&self, roles: &[String], candidates: &[DemandFileCandidate]) -> Vec<DemandFileMatch> {
        let mut seen: HashSet<&Path> = HashSet::new();
        let mut matches = Vec::new();

        for role in roles {
            let hit = self.matchers.iter().find_map(|matcher| {
                let found = matcher.find(role, candidates);
                if found.is_empty() {
                    None
                } else {
                    Some((matcher.name(), found))
                }
            });

            match hit {
                Some((matcher, found)) => {
                    for candidate in found {
                        if seen.insert(candidate.path.as_path()) {
                            tracing::debug!(
                                role = %role,
                                matcher,
                                file = %candidate.path.display(),
                                "需要ファイルを特定"
                            );
                            matches.push(DemandFileMatch {
                                role: role.clone(),
                                path: candidate.path.clone(),
                                matcher,
                            });
                        }
                    }
                }
                None => {
                    tracing::debug!(role = %role, "需要ファイル無し");
                }
            }
        }

        matches
    }

    /// scan + locate（ディレクトリが無ければ空）
    pub fn locate_in_dir(&self, dir: &Path, roles: &[String]) -> Vec<DemandFileMatch> {
        match self.scan(dir) {
            Ok(candidates) => self.locate(roles, &candidates),
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "需要ファイルの探索に失敗");
                Vec::new()
            }
        }
    }
}

impl Default for DemandFileLocator {
    fn default() -> Self {
        Self::new()
    }
}

/// need_per_date_slot_role_<職種>.csv → 職種
fn role_label_from_path(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?;
    if !ext.eq_ignore_ascii_case(DEMAND_FILE_EXTENSION) {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    stem.strip_prefix(DEMAND_FILE_PREFIX)
        .filter(|role| !role.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(role: &str) -> DemandFileCandidate {
        DemandFileCandidate {
            path: PathBuf::from(format!("{}{}.csv", DEMAND_FILE_PREFIX, role)),
            role_label: role.to_string(),
        }
    }

    #[test]
    fn test_role_label_from_path() {
        assert_eq!(
            role_label_from_path(Path::new("need_per_date_slot_role_介護.csv")),
            Some("介護".to_string())
        );
        assert_eq!(role_label_from_path(Path::new("need_per_date_slot_role_.csv")), None);
        assert_eq!(role_label_from_path(Path::new("need_per_date_slot.csv")), None);
        assert_eq!(
            role_label_from_path(Path::new("need_per_date_slot_role_介護.parquet")),
            None
        );
    }

    #[test]
    fn test_normalize_strips_punctuation() {
        assert_eq!(normalize_role_label("介護（夜勤）"), "介護夜勤");
        assert_eq!(normalize_role_label("介護 (夜勤)"), "介護夜勤");
        assert_eq!(normalize_role_label("介護・看護"), "介護看護");
    }

    #[test]
    fn test_exact_match_takes_precedence() {
        let candidates = vec![candidate("介護"), candidate("介護補助")];
        let matches = DemandFileLocator::new().locate(&["介護".to_string()], &candidates);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].matcher, "exact");
        assert_eq!(matches[0].path, candidates[0].path);
    }

    #[test]
    fn test_normalized_then_substring() {
        let candidates = vec![candidate("介護_夜勤"), candidate("介護職員")];
        let locator = DemandFileLocator::new();

        let normalized = locator.locate(&["介護（夜勤）".to_string()], &candidates);
        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0].matcher, "normalized");

        let substring = locator.locate(&["介護職".to_string()], &candidates);
        assert_eq!(substring.len(), 1);
        assert_eq!(substring[0].matcher, "substring");
        assert_eq!(substring[0].path, candidates[1].path);
    }

    #[test]
    fn test_duplicate_paths_are_collapsed() {
        let candidates = vec![candidate("介護")];
        let roles = vec!["介護".to_string(), "介護（日勤）".to_string()];

        let matches = DemandFileLocator::new().locate(&roles, &candidates);

        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn test_no_match_returns_empty() {
        let candidates = vec![candidate("看護")];
        let matches = DemandFileLocator::new().locate(&["事務".to_string()], &candidates);
        assert!(matches.is_empty());
    }
}
