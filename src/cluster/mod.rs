//! 聚类去重模块
//!
//! 负责把相似条目聚成簇、决出保留者并删除其余条目。
//! 规则是数据驱动的有序列表，独立于文件 IO，可单独测试。

mod data;
mod rules;

pub use data::load_default_rules;
pub use rules::{matches_pattern, select_keeper, ClusterRule, ClusterSet};

use crate::datatypes::EntryKind;
use crate::editor::CatalogEditor;
use crate::record::Entry;
use serde::Serialize;
use std::collections::HashSet;

/// 单个聚类的处理结果
#[derive(Debug, Clone, Serialize)]
pub struct ClusterOutcome {
    pub cluster: String,
    /// 命中的条目数
    pub matched: usize,
    /// 保留的条目名（无法决出保留者时为 None，该簇整体无操作）
    pub kept: Option<String>,
    /// 删除的条目名
    pub removed: Vec<String>,
}

/// 一次去重运行的汇总
#[derive(Debug, Clone, Serialize)]
pub struct DedupSummary {
    pub clusters: Vec<ClusterOutcome>,
    pub skills_before: usize,
    pub skills_after: usize,
    pub agents_before: usize,
    pub agents_after: usize,
}

impl DedupSummary {
    /// 删除的条目总数
    pub fn total_removed(&self) -> usize {
        self.clusters.iter().map(|c| c.removed.len()).sum()
    }

    /// 无法决出保留者的聚类
    pub fn unresolved(&self) -> impl Iterator<Item = &ClusterOutcome> {
        self.clusters
            .iter()
            .filter(|c| c.matched > 0 && c.kept.is_none())
    }
}

impl std::fmt::Display for DedupSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== 去重汇总 ===")?;
        for outcome in &self.clusters {
            if outcome.matched == 0 {
                continue;
            }
            writeln!(f, "\n{}:", outcome.cluster)?;
            writeln!(f, "  命中: {}", outcome.matched)?;
            match &outcome.kept {
                Some(kept) => writeln!(f, "  保留: {}", kept)?,
                None => writeln!(f, "  ⚠ 未能决出保留者，该簇未改动")?,
            }
            writeln!(f, "  删除: {}", outcome.removed.len())?;
            for name in &outcome.removed {
                writeln!(f, "    - {}", name)?;
            }
        }
        writeln!(f)?;
        writeln!(
            f,
            "技能: {} → {} (删除 {})",
            self.skills_before,
            self.skills_after,
            self.skills_before - self.skills_after
        )?;
        writeln!(
            f,
            "代理: {} → {} (删除 {})",
            self.agents_before,
            self.agents_after,
            self.agents_before - self.agents_after
        )?;
        Ok(())
    }
}

/// 按规则集对目录去重
///
/// 逐簇处理：收集命中条目 → 决出保留者 → 删除其余。
/// 已被前面的簇删除的条目不再参与后续簇。无法决出保留者的簇
/// 是无操作，但会出现在汇总里（不静默丢弃）。
pub fn deduplicate(editor: &mut CatalogEditor, rules: &ClusterSet) -> DedupSummary {
    let skills_before = editor.catalog().count_kind(EntryKind::Skill);
    let agents_before = editor.catalog().count_kind(EntryKind::Agent);

    let mut removed_names: HashSet<String> = HashSet::new();
    let mut outcomes = Vec::with_capacity(rules.clusters.len());

    for rule in &rules.clusters {
        let candidates: Vec<Entry> = editor
            .catalog()
            .entries
            .iter()
            .filter(|e| e.kind == Some(rule.kind))
            .filter(|e| rule.matches(&e.name))
            .filter(|e| !removed_names.contains(&e.name))
            .cloned()
            .collect();

        if candidates.is_empty() {
            outcomes.push(ClusterOutcome {
                cluster: rule.name.clone(),
                matched: 0,
                kept: None,
                removed: Vec::new(),
            });
            continue;
        }

        let keeper = select_keeper(rule, &candidates, &rules.authoritative_prefix);
        let Some(keeper_name) = keeper.map(|e| e.name.clone()) else {
            outcomes.push(ClusterOutcome {
                cluster: rule.name.clone(),
                matched: candidates.len(),
                kept: None,
                removed: Vec::new(),
            });
            continue;
        };

        let mut removed = Vec::new();
        for candidate in &candidates {
            if candidate.name == keeper_name {
                continue;
            }
            if editor.delete_block(&candidate.name).is_ok() {
                removed_names.insert(candidate.name.clone());
                removed.push(candidate.name.clone());
            }
        }

        outcomes.push(ClusterOutcome {
            cluster: rule.name.clone(),
            matched: candidates.len(),
            kept: Some(keeper_name),
            removed,
        });
    }

    DedupSummary {
        clusters: outcomes,
        skills_before,
        skills_after: editor.catalog().count_kind(EntryKind::Skill),
        agents_before,
        agents_after: editor.catalog().count_kind(EntryKind::Agent),
    }
}
