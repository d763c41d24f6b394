use crate::datatypes::EntryKind;
use crate::record::Entry;
use crate::utils::CatalogError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 聚类规则
///
/// 描述一簇相似条目：纳入/排除模式、作用的条目类型，
/// 以及指定保留的条目名。规则按列表顺序生效。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterRule {
    /// 聚类名（报告展示用）
    pub name: String,
    /// 指定保留的条目名
    pub keep: String,
    /// 纳入模式
    pub patterns: Vec<String>,
    /// 排除模式
    #[serde(default)]
    pub exclude: Vec<String>,
    /// 作用的条目类型
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

impl ClusterRule {
    /// 条目名是否命中该簇（纳入且未被排除）
    pub fn matches(&self, entry_name: &str) -> bool {
        self.patterns.iter().any(|p| matches_pattern(entry_name, p))
            && !self.exclude.iter().any(|p| matches_pattern(entry_name, p))
    }
}

/// 模式匹配
///
/// 带正则锚（`^` 开头或 `$` 结尾）的模式按正则处理，其余按子串包含。
pub fn matches_pattern(name: &str, pattern: &str) -> bool {
    if is_anchored(pattern) {
        Regex::new(pattern)
            .map(|re| re.is_match(name))
            .unwrap_or(false)
    } else {
        name.contains(pattern)
    }
}

fn is_anchored(pattern: &str) -> bool {
    pattern.starts_with('^') || pattern.ends_with('$')
}

/// 聚类规则集
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterSet {
    /// 权威来源路径前缀（保留者决胜用）
    #[serde(default = "default_authoritative_prefix")]
    pub authoritative_prefix: String,
    /// 有序的聚类规则列表
    pub clusters: Vec<ClusterRule>,
}

fn default_authoritative_prefix() -> String {
    "IDETOOLS/".to_string()
}

impl ClusterSet {
    /// 从 JSON 文件加载规则集
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// 从 JSON 文本解析规则集（解析后立即校验）
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let set: ClusterSet = serde_json::from_str(json)?;
        set.validate()?;
        Ok(set)
    }

    /// 校验规则集
    ///
    /// 带锚的模式必须是合法正则，否则在加载时报错而不是匹配时静默失配。
    pub fn validate(&self) -> Result<(), CatalogError> {
        for rule in &self.clusters {
            for pattern in rule.patterns.iter().chain(rule.exclude.iter()) {
                if is_anchored(pattern) {
                    Regex::new(pattern).map_err(|e| {
                        CatalogError::InvalidRules(format!(
                            "聚类 {} 的模式 '{}' 不是合法正则: {}",
                            rule.name, pattern, e
                        ))
                    })?;
                }
            }
        }
        Ok(())
    }
}

/// 决出聚类的保留条目
///
/// 决胜顺序：
/// 1. 名字与 `keep` 完全一致的条目
/// 2. 来源以权威前缀开头的条目中描述最长的（并列取文件顺序靠前的）
/// 3. 都不满足时返回 None，调用方按无操作上报
pub fn select_keeper<'a>(
    rule: &ClusterRule,
    candidates: &'a [Entry],
    authoritative_prefix: &str,
) -> Option<&'a Entry> {
    if let Some(exact) = candidates.iter().find(|e| e.name == rule.keep) {
        return Some(exact);
    }

    candidates
        .iter()
        .filter(|e| e.source_starts_with(authoritative_prefix))
        .fold(None, |best: Option<&Entry>, e| match best {
            Some(b) if e.description_len() > b.description_len() => Some(e),
            None => Some(e),
            other => other,
        })
}
