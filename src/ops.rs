use crate::datatypes::EntryKind;
use crate::record::EntryDraft;
use crate::utils::CatalogError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 编辑操作的动作类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditAction {
    Insert,
    Update,
    Redirect,
    Delete,
}

impl std::fmt::Display for EditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            EditAction::Insert => "插入",
            EditAction::Update => "更新",
            EditAction::Redirect => "重定向",
            EditAction::Delete => "删除",
        };
        f.write_str(label)
    }
}

/// 声明式编辑操作
///
/// 三个维护流程（整合、去重、批量导入）都先把意图规划成操作列表，
/// 再交给编辑器按调用顺序应用。操作可以从 JSON 加载，便于脚本化。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditOp {
    /// 在锚点条目（或标记注释）之后插入已序列化的行
    Insert { anchor: String, lines: Vec<String> },
    /// 整块替换既有条目的行
    Update { name: String, lines: Vec<String> },
    /// 只改写条目内单个字段的值
    Redirect {
        name: String,
        field: String,
        value: String,
    },
    /// 删除条目的整个行块
    Delete { name: String },
}

impl EditOp {
    /// 操作针对的条目/锚点名
    pub fn target(&self) -> &str {
        match self {
            EditOp::Insert { anchor, .. } => anchor,
            EditOp::Update { name, .. } => name,
            EditOp::Redirect { name, .. } => name,
            EditOp::Delete { name } => name,
        }
    }

    /// 操作的动作类别
    pub fn action(&self) -> EditAction {
        match self {
            EditOp::Insert { .. } => EditAction::Insert,
            EditOp::Update { .. } => EditAction::Update,
            EditOp::Redirect { .. } => EditAction::Redirect,
            EditOp::Delete { .. } => EditAction::Delete,
        }
    }
}

/// 整合条目规格
///
/// 每条规格描述一个整合后的主条目：`name` 是主条目名，
/// `replaces` 是它取代的旧条目名。JSON 字段名与既有规格文件保持一致
/// （描述字段是 `desc`）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidationSpec {
    pub name: String,
    pub replaces: String,
    pub category: String,
    #[serde(rename = "desc")]
    pub description: String,
}

impl ConsolidationSpec {
    /// 主条目的规范来源路径
    pub fn canonical_source(&self, prefix: &str) -> String {
        format!("{prefix}skills/{}", self.name)
    }

    /// 渲染为条目草稿
    pub fn to_draft(&self, prefix: &str) -> EntryDraft {
        EntryDraft {
            name: self.name.clone(),
            kind: EntryKind::Skill,
            category: self.category.clone(),
            model: None,
            description: self.description.clone(),
            source: self.canonical_source(prefix),
        }
    }

    /// 从 JSON 文件加载规格列表
    pub fn load_list(path: &Path) -> Result<Vec<Self>, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// 被跳过的操作（部分成功运行的摘要组成部分）
#[derive(Debug, Clone, Serialize)]
pub struct SkippedOp {
    pub target: String,
    pub action: EditAction,
    pub reason: String,
}

/// 一次编辑运行的汇总报告
///
/// "未找到"一类的失败按操作记录并继续执行，部分成功是预期结果；
/// 报告可序列化为 JSON 供外部工具消费。
#[derive(Debug, Clone, Default, Serialize)]
pub struct EditReport {
    pub added: usize,
    pub updated: usize,
    pub redirected: usize,
    pub removed: usize,
    pub skipped: Vec<SkippedOp>,
}

impl EditReport {
    /// 是否有任何操作被跳过
    pub fn has_skips(&self) -> bool {
        !self.skipped.is_empty()
    }
}

impl std::fmt::Display for EditReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== 编辑摘要 ===")?;
        writeln!(f, "新增: {}", self.added)?;
        writeln!(f, "更新: {}", self.updated)?;
        writeln!(f, "重定向: {}", self.redirected)?;
        writeln!(f, "删除: {}", self.removed)?;
        writeln!(f, "跳过: {}", self.skipped.len())?;
        for skip in &self.skipped {
            writeln!(f, "  - [{}] {}: {}", skip.action, skip.target, skip.reason)?;
        }
        Ok(())
    }
}
