/// 编辑变更追踪模块
///
/// 该模块实现追加式的变更日志：记录每个成功应用的操作和每个被跳过的
/// 操作及其原因，便于审计和生成运行摘要。
use crate::ops::{EditAction, SkippedOp};
use std::time::Instant;

/// 单个已应用的变更
#[derive(Debug, Clone)]
pub struct ChangeRecord {
    /// 目标条目名
    pub entry: String,
    /// 动作类别
    pub action: EditAction,
    /// 修改前的值（插入操作为空）
    pub old_value: String,
    /// 修改后的值（删除操作为空）
    pub new_value: String,
    /// 应用时间戳
    pub applied_at: Instant,
}

impl std::fmt::Display for ChangeRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {}: \"{}\" -> \"{}\"",
            self.action,
            self.entry,
            clip(&self.old_value),
            clip(&self.new_value),
        )
    }
}

/// 显示时截断过长的值
fn clip(value: &str) -> String {
    if value.chars().count() > 30 {
        format!("{}...", value.chars().take(30).collect::<String>())
    } else {
        value.to_string()
    }
}

/// 编辑变更日志
///
/// # 功能
/// - 按应用顺序记录所有变更
/// - 记录被跳过的操作及原因（部分成功摘要的数据来源）
/// - 提供按条目的变更查询
#[derive(Debug, Clone, Default)]
pub struct EditDelta {
    /// 已应用变更的完整记录
    changes: Vec<ChangeRecord>,
    /// 被跳过的操作
    skips: Vec<SkippedOp>,
}

impl EditDelta {
    /// 创建新的变更日志
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一个已应用的变更
    pub fn record_change(
        &mut self,
        entry: impl Into<String>,
        action: EditAction,
        old_value: impl Into<String>,
        new_value: impl Into<String>,
    ) {
        self.changes.push(ChangeRecord {
            entry: entry.into(),
            action,
            old_value: old_value.into(),
            new_value: new_value.into(),
            applied_at: Instant::now(),
        });
    }

    /// 记录一个被跳过的操作
    pub fn record_skip(
        &mut self,
        target: impl Into<String>,
        action: EditAction,
        reason: impl Into<String>,
    ) {
        self.skips.push(SkippedOp {
            target: target.into(),
            action,
            reason: reason.into(),
        });
    }

    /// 已应用变更的数量
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// 是否没有任何已应用变更
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// 按应用顺序迭代变更
    pub fn iter(&self) -> impl Iterator<Item = &ChangeRecord> {
        self.changes.iter()
    }

    /// 被跳过的操作
    pub fn skips(&self) -> &[SkippedOp] {
        &self.skips
    }

    /// 指定动作类别的变更数量
    pub fn count_action(&self, action: EditAction) -> usize {
        self.changes.iter().filter(|c| c.action == action).count()
    }

    /// 获取特定条目的所有变更
    pub fn changes_for_entry(&self, entry: &str) -> Vec<&ChangeRecord> {
        self.changes.iter().filter(|c| c.entry == entry).collect()
    }

    /// 清空所有记录
    pub fn clear(&mut self) {
        self.changes.clear();
        self.skips.clear();
    }

    /// 生成变更摘要
    pub fn summary(&self) -> String {
        format!(
            "变更总数: {}, 跳过: {}, 新增: {}, 更新: {}, 重定向: {}, 删除: {}",
            self.changes.len(),
            self.skips.len(),
            self.count_action(EditAction::Insert),
            self.count_action(EditAction::Update),
            self.count_action(EditAction::Redirect),
            self.count_action(EditAction::Delete),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_basic() {
        let mut delta = EditDelta::new();
        assert_eq!(delta.len(), 0);
        assert!(delta.is_empty());

        delta.record_change("a", EditAction::Insert, "", "a");
        assert_eq!(delta.len(), 1);
        assert!(!delta.is_empty());
    }

    #[test]
    fn test_count_action() {
        let mut delta = EditDelta::new();
        delta.record_change("a", EditAction::Insert, "", "a");
        delta.record_change("b", EditAction::Delete, "b", "");
        delta.record_change("c", EditAction::Delete, "c", "");

        assert_eq!(delta.count_action(EditAction::Delete), 2);
        assert_eq!(delta.count_action(EditAction::Insert), 1);
        assert_eq!(delta.count_action(EditAction::Update), 0);
    }

    #[test]
    fn test_changes_for_entry() {
        let mut delta = EditDelta::new();
        delta.record_change("x", EditAction::Redirect, "PENDING/x", "IDETOOLS/skills/x");
        delta.record_change("y", EditAction::Delete, "y", "");
        delta.record_change("x", EditAction::Update, "old", "new");

        let changes = delta.changes_for_entry("x");
        assert_eq!(changes.len(), 2);
    }

    #[test]
    fn test_skips_recorded() {
        let mut delta = EditDelta::new();
        delta.record_skip("ghost", EditAction::Delete, "Record not found: ghost");

        assert!(delta.is_empty());
        assert_eq!(delta.skips().len(), 1);
        assert_eq!(delta.skips()[0].target, "ghost");
    }

    #[test]
    fn test_clear() {
        let mut delta = EditDelta::new();
        delta.record_change("a", EditAction::Insert, "", "a");
        delta.record_skip("b", EditAction::Delete, "missing");

        delta.clear();

        assert!(delta.is_empty());
        assert!(delta.skips().is_empty());
    }

    #[test]
    fn test_summary() {
        let mut delta = EditDelta::new();
        delta.record_change("a", EditAction::Insert, "", "a");
        delta.record_change("b", EditAction::Delete, "b", "");

        let summary = delta.summary();
        assert!(summary.contains("变更总数: 2"));
        assert!(summary.contains("删除: 1"));
    }

    #[test]
    fn test_change_display_clips_long_values() {
        let mut delta = EditDelta::new();
        delta.record_change("long", EditAction::Update, "x".repeat(80), "y");
        let rendered = delta.iter().next().unwrap().to_string();
        assert!(rendered.contains("..."));
        assert!(rendered.len() < 80);
    }
}
