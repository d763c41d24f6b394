/// 目录聚合模块
///
/// `Catalog` 是一次运行的内存模型：物理行数组、解析出的条目序列、
/// 分区与标记注释的位置，以及需要在重写时还原的格式细节（BOM、行终止符）。
/// 生命周期为"每次运行从文件重建，重写后丢弃"，不跨运行保留状态。
///
/// # 架构设计
///
/// - **parser**: 按行扫描，构建条目/分区/标记（见 §自述文件）
/// - **writer**: 计数器重算与序列化
/// - **stats**: 统计摘要
pub mod parser;
pub mod stats;
pub mod writer;

use crate::datatypes::{EntryKind, LineEnding};
use crate::record::Entry;
use std::collections::HashSet;
use std::path::PathBuf;

/// 文件分区（技能区 / 代理区）
///
/// 由标题注释（`# SKILLS`）或顶层键（`skills:`）标出。
/// 每个条目恰好属于一个分区。
#[derive(Debug, Clone)]
pub struct Section {
    /// 分区对应的条目类型
    pub kind: EntryKind,
    /// 标记行原文（修剪后）
    pub title: String,
    /// 标记行行号
    pub line: usize,
}

/// 标记注释（`# ---` 开头）
///
/// 可作为插入锚点使用，例如 `# --- godmodedev-new`。
#[derive(Debug, Clone)]
pub struct Marker {
    /// 注释原文（修剪后）
    pub text: String,
    /// 所在行号
    pub line: usize,
}

/// 解析告警
///
/// 目录是手工维护的，解析异常一律容忍并上报，不中断运行。
#[derive(Debug, Clone)]
pub enum ParseWarning {
    /// 无法识别形状的行（跳过）
    UnrecognizedLine { line: usize, content: String },
    /// 重名条目（查找时绑定第一个出现的）
    DuplicateName { name: String, line: usize },
}

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseWarning::UnrecognizedLine { line, content } => {
                write!(f, "第 {} 行无法识别，已跳过: {}", line + 1, content.trim())
            }
            ParseWarning::DuplicateName { name, line } => {
                write!(f, "第 {} 行出现重名条目: {}", line + 1, name)
            }
        }
    }
}

/// 目录文件的内存模型
#[derive(Debug, Clone)]
pub struct Catalog {
    /// 文件路径（从文本解析时为 None）
    pub path: Option<PathBuf>,
    /// 物理行（不含行终止符，保留原始缩进）
    pub lines: Vec<String>,
    /// 解析出的条目，按文件顺序
    pub entries: Vec<Entry>,
    /// 分区标记
    pub sections: Vec<Section>,
    /// 标记注释
    pub markers: Vec<Marker>,
    /// 解析告警
    pub warnings: Vec<ParseWarning>,
    /// 头部区域结束行（第一个分区标记所在行；其之前为头部配置区）
    pub header_end: usize,
    /// 源文件是否带 UTF-8 BOM
    pub bom: bool,
    /// 源文件的行终止符
    pub line_ending: LineEnding,
}

impl Catalog {
    /// 按名字查找条目（绑定第一个出现的）
    pub fn find_entry(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// 按名字查找条目下标
    pub fn entry_index(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name)
    }

    /// 所有条目名集合
    pub fn entry_names(&self) -> HashSet<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// 指定类型的条目数量
    pub fn count_kind(&self, kind: EntryKind) -> usize {
        self.entries
            .iter()
            .filter(|e| e.kind == Some(kind))
            .count()
    }

    /// 按前缀查找标记注释
    ///
    /// 匹配修剪后文本以 `text` 开头的第一个标记
    /// （`# --- godmodedev-new` 这类标记后面可能带注释尾巴）。
    pub fn find_marker(&self, text: &str) -> Option<&Marker> {
        self.markers.iter().find(|m| m.text.starts_with(text))
    }

    /// 指定类型分区的标记行
    pub fn find_section(&self, kind: EntryKind) -> Option<&Section> {
        self.sections.iter().find(|s| s.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
version: 3
total_skills: 2
total_agents: 1

# SKILLS
skills:
  - name: alpha
    type: skill
    category: testing
    description: \"First skill\"
    source: IDETOOLS/skills/alpha

  # --- godmodedev-new
  - name: beta
    type: skill
    category: database
    description: \"Second skill\"
    source: PENDING/beta

# AGENTS
agents:
  - name: gamma
    type: agent
    category: development
    model: sonnet
    description: \"An agent\"
    source: PENDING/gamma
";

    #[test]
    fn test_queries() {
        let catalog = Catalog::from_text(SAMPLE);
        assert_eq!(catalog.entries.len(), 3);
        assert_eq!(catalog.count_kind(EntryKind::Skill), 2);
        assert_eq!(catalog.count_kind(EntryKind::Agent), 1);

        let alpha = catalog.find_entry("alpha").unwrap();
        assert_eq!(alpha.category.as_deref(), Some("testing"));
        assert!(catalog.find_entry("missing").is_none());

        assert!(catalog.find_marker("# --- godmodedev-new").is_some());
        assert!(catalog.find_section(EntryKind::Agent).is_some());
    }

    #[test]
    fn test_entry_names() {
        let catalog = Catalog::from_text(SAMPLE);
        let names = catalog.entry_names();
        assert!(names.contains("alpha"));
        assert!(names.contains("gamma"));
        assert_eq!(names.len(), 3);
    }
}
