//! 批量导入模块
//!
//! 扫描待导入目录中的单条目文件（`key: value` 每行一个），
//! 跳过已存在的名字，按关键字表自动归类，修复泛化名，
//! 然后把技能插入到待导入标记处、代理追加到文件末尾。

use crate::datatypes::{split_key_value, strip_quotes, EntryKind};
use crate::editor::CatalogEditor;
use crate::record::EntryDraft;
use crate::utils::{repair_generic_name, truncate_description, CatalogError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// 归类关键字规则（一条分类与它的触发关键字）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRule {
    pub category: String,
    pub keywords: Vec<String>,
}

/// 技能/代理两套归类关键字表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryTables {
    pub skills: Vec<CategoryRule>,
    pub agents: Vec<CategoryRule>,
}

/// 归类器 trait
///
/// 负责从条目名和描述推断分类标签。规则独立于文件 IO，可单独测试。
pub trait Categorizer {
    /// 推断分类（无规则命中时返回 "general"）
    fn categorize(&self, name: &str, description: &str, kind: EntryKind) -> String;
}

/// 默认归类器实现
///
/// 使用 category_keywords.json 中的有序关键字表：
/// 第一条命中的规则决定分类。
#[derive(Debug, Clone)]
pub struct DefaultCategorizer {
    tables: CategoryTables,
}

impl DefaultCategorizer {
    /// 创建新的归类器实例
    pub fn new(tables: CategoryTables) -> Self {
        Self { tables }
    }

    /// 从内置的 category_keywords.json 创建默认归类器
    ///
    /// # 错误
    /// 如果 JSON 解析失败，返回错误
    pub fn from_embedded_data() -> Result<Self, CatalogError> {
        let json_data = include_str!("../data/category_keywords.json");
        let tables: CategoryTables = serde_json::from_str(json_data)?;
        Ok(Self::new(tables))
    }
}

impl Categorizer for DefaultCategorizer {
    fn categorize(&self, name: &str, description: &str, kind: EntryKind) -> String {
        let haystack = format!("{name} {description}").to_lowercase();
        let rules = match kind {
            EntryKind::Agent => &self.tables.agents,
            EntryKind::Skill => &self.tables.skills,
        };
        rules
            .iter()
            .find(|r| r.keywords.iter().any(|k| haystack.contains(k.as_str())))
            .map(|r| r.category.clone())
            .unwrap_or_else(|| "general".to_string())
    }
}

/// 待导入条目
#[derive(Debug, Clone)]
pub struct PendingItem {
    pub name: String,
    pub kind: EntryKind,
    pub description: Option<String>,
    /// 条目内容的原始路径（泛化名修复用）
    pub source_path: Option<String>,
}

/// 解析单条目文件（简化的 `key: value` 每行一个）
///
/// `name` 和 `type` 缺一不可；`type` 不是 `agent` 的一律按技能处理。
pub fn parse_pending_item(content: &str) -> Option<PendingItem> {
    let mut name = None;
    let mut kind_value = None;
    let mut description = None;
    let mut source_path = None;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('#') {
            continue;
        }
        let Some((key, value)) = split_key_value(trimmed) else {
            continue;
        };
        let value = strip_quotes(value).to_string();
        match key {
            "name" => name = Some(value),
            "type" => kind_value = Some(value),
            "description" => description = Some(value),
            "source_path" => source_path = Some(value),
            _ => {}
        }
    }

    let name = name.filter(|n| !n.is_empty())?;
    let kind_value = kind_value.filter(|t| !t.is_empty())?;
    let kind = if kind_value.trim() == "agent" {
        EntryKind::Agent
    } else {
        EntryKind::Skill
    };

    Some(PendingItem {
        name,
        kind,
        description,
        source_path,
    })
}

/// 扫描待导入目录
///
/// 只取 `.yaml` 文件，排除扫描状态文件 `.last-scan.yaml`。
/// 按文件名排序保证导入顺序确定。解析失败的文件记录文件名后继续。
pub fn scan_pending_dir(dir: &Path) -> Result<(Vec<PendingItem>, Vec<String>), CatalogError> {
    let mut files: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.extension().map(|ext| ext == "yaml").unwrap_or(false)
                && p.file_name()
                    .map(|n| n != ".last-scan.yaml")
                    .unwrap_or(false)
        })
        .collect();
    files.sort();

    let mut items = Vec::new();
    let mut failed = Vec::new();
    for file in files {
        let display_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match std::fs::read_to_string(&file) {
            Ok(content) => match parse_pending_item(&content) {
                Some(item) => items.push(item),
                None => failed.push(display_name),
            },
            Err(_) => failed.push(display_name),
        }
    }
    Ok((items, failed))
}

/// 导入选项
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// 技能插入锚点（标记注释前缀）
    pub skill_marker: String,
    /// 新条目的来源路径前缀
    pub source_prefix: String,
    /// 代理条目附带的 `model:` 字段值
    pub agent_model: String,
    /// 描述长度上限
    pub max_description: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            skill_marker: "# --- godmodedev-new".to_string(),
            source_prefix: "PENDING/".to_string(),
            agent_model: "sonnet".to_string(),
            max_description: 200,
        }
    }
}

/// 一次导入运行的汇总
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportSummary {
    pub imported_skills: usize,
    pub imported_agents: usize,
    /// 名字已存在而跳过的条目
    pub skipped_existing: Vec<String>,
    /// 泛化名修复记录（原名 → 新名）
    pub renamed: Vec<(String, String)>,
    /// 分类统计（按数量降序）
    pub categories: Vec<(String, usize)>,
    /// 无法解析的待导入文件
    pub failed_files: Vec<String>,
    /// 非致命问题（锚点缺失等）
    pub warnings: Vec<String>,
}

impl std::fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== 导入汇总 ===")?;
        writeln!(
            f,
            "导入: {} 个技能, {} 个代理",
            self.imported_skills, self.imported_agents
        )?;
        writeln!(f, "跳过（已存在）: {}", self.skipped_existing.len())?;
        if !self.renamed.is_empty() {
            writeln!(f, "泛化名修复:")?;
            for (old, new) in &self.renamed {
                writeln!(f, "  \"{}\" → \"{}\"", old, new)?;
            }
        }
        if !self.categories.is_empty() {
            writeln!(f, "分类统计:")?;
            for (category, count) in &self.categories {
                writeln!(f, "  - {}: {}", category, count)?;
            }
        }
        for warning in &self.warnings {
            writeln!(f, "⚠ {}", warning)?;
        }
        Ok(())
    }
}

/// 执行批量导入
///
/// 技能作为一个带日期标记的块插入到 `skill_marker` 锚点处，
/// 代理同样作为带日期标记的块追加到文件末尾。
/// 已存在的名字跳过；泛化名先修复再查重。
pub fn import_pending(
    editor: &mut CatalogEditor,
    items: &[PendingItem],
    categorizer: &dyn Categorizer,
    options: &ImportOptions,
    today: NaiveDate,
) -> ImportSummary {
    let mut summary = ImportSummary::default();
    let existing: HashSet<String> = editor
        .catalog()
        .entry_names()
        .into_iter()
        .map(str::to_string)
        .collect();

    let mut skills: Vec<EntryDraft> = Vec::new();
    let mut agents: Vec<EntryDraft> = Vec::new();
    let mut category_counts: Vec<(String, usize)> = Vec::new();

    for item in items {
        let name = match repair_generic_name(
            &item.name,
            item.source_path.as_deref(),
            item.description.as_deref(),
        ) {
            Some(repaired) => {
                summary.renamed.push((item.name.clone(), repaired.clone()));
                repaired
            }
            None => item.name.clone(),
        };

        if existing.contains(&name) {
            summary.skipped_existing.push(name);
            continue;
        }

        let raw_description = item
            .description
            .clone()
            .unwrap_or_else(|| "No description available".to_string());
        let description = truncate_description(&raw_description, options.max_description);
        let category = categorizer.categorize(&name, &description, item.kind);

        match category_counts.iter_mut().find(|(c, _)| *c == category) {
            Some(pair) => pair.1 += 1,
            None => category_counts.push((category.clone(), 1)),
        }

        let draft = EntryDraft {
            source: format!("{}{}", options.source_prefix, name),
            name,
            kind: item.kind,
            category,
            model: (item.kind == EntryKind::Agent).then(|| options.agent_model.clone()),
            description,
        };
        match item.kind {
            EntryKind::Agent => agents.push(draft),
            EntryKind::Skill => skills.push(draft),
        }
    }

    let date = today.format("%Y-%m-%d");

    // 技能插入到标记锚点处
    if !skills.is_empty() {
        let mut block = vec![format!(
            "  # --- pending-imports ({}) --- Imported {}",
            skills.len(),
            date
        )];
        for draft in &skills {
            block.push(String::new());
            block.extend(draft.render_lines(2));
        }
        block.push(String::new());

        match editor.insert_after(&options.skill_marker, &block) {
            Ok(()) => summary.imported_skills = skills.len(),
            Err(e) => summary
                .warnings
                .push(format!("技能块未插入（{}）", e)),
        }
    }

    // 代理追加到文件末尾
    if !agents.is_empty() {
        let mut block = vec![format!(
            "  # --- pending-imports ({}) --- Imported {}",
            agents.len(),
            date
        )];
        for draft in &agents {
            block.push(String::new());
            block.extend(draft.render_lines(2));
        }

        editor.append_block(&block);
        summary.imported_agents = agents.len();
    }

    category_counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    summary.categories = category_counts;
    summary
}
