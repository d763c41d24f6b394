use crate::datatypes::{is_quoted, strip_quotes, EntryKind};

/// 目录条目
///
/// 对应源文件中一个 `- name:` 起始的记录块，保留其物理行范围
/// 以便结构化编辑时做行数组的拼接和偏移修正。
#[derive(Debug, Clone)]
pub struct Entry {
    /// 条目名（在同类型分区内唯一，不做全局强制）
    pub name: String,
    /// 条目类型（`type:` 字段优先，缺省继承所在分区）
    pub kind: Option<EntryKind>,
    /// 分类标签
    pub category: Option<String>,
    /// 单行描述（源文件中可能带引号，存储时已去引号）
    pub description: Option<String>,
    /// 来源路径
    pub source: Option<String>,
    /// 其他已识别的键值对（如 `model`），保持出现顺序
    pub extra: Vec<(String, String)>,
    /// 起始行的缩进（前导空白字符数）
    pub base_indent: usize,
    /// 起始行号（含，0 基）
    pub start_line: usize,
    /// 结束行号（含）
    pub end_line: usize,
}

impl Entry {
    /// 以 `- name:` 行开启一个新条目
    pub fn open(name: &str, indent: usize, line_idx: usize) -> Self {
        Entry {
            name: strip_quotes(name).to_string(),
            kind: None,
            category: None,
            description: None,
            source: None,
            extra: Vec::new(),
            base_indent: indent,
            start_line: line_idx,
            end_line: line_idx,
        }
    }

    /// 吸收条目范围内的一个属性行
    ///
    /// 识别的键提取为结构化字段，其余键进入 `extra` 透传。
    /// 值两侧的引号在此处剥离。
    pub fn absorb_property(&mut self, key: &str, value: &str, line_idx: usize) {
        let clean = strip_quotes(value).to_string();
        match key {
            "type" => self.kind = EntryKind::parse(&clean),
            "category" => self.category = Some(clean),
            "description" => self.description = Some(clean),
            "source" => self.source = Some(clean),
            _ => self.extra.push((key.to_string(), clean)),
        }
        self.end_line = line_idx;
    }

    /// 把结束行扩展到指定行（空行、续行）
    pub fn extend_to(&mut self, line_idx: usize) {
        self.end_line = line_idx;
    }

    /// 条目占用的物理行数
    pub fn line_count(&self) -> usize {
        self.end_line - self.start_line + 1
    }

    /// 指定行是否落在条目范围内
    pub fn contains_line(&self, line_idx: usize) -> bool {
        line_idx >= self.start_line && line_idx <= self.end_line
    }

    /// 整体平移行范围（拼接后修正偏移）
    pub fn shift(&mut self, delta: isize) {
        self.start_line = (self.start_line as isize + delta) as usize;
        self.end_line = (self.end_line as isize + delta) as usize;
    }

    /// 描述长度（计数器选主时的平分决胜依据）
    pub fn description_len(&self) -> usize {
        self.description.as_deref().map(str::len).unwrap_or(0)
    }

    /// 来源是否以权威路径前缀开头
    pub fn source_starts_with(&self, prefix: &str) -> bool {
        self.source
            .as_deref()
            .map(|s| s.starts_with(prefix))
            .unwrap_or(false)
    }
}

/// 待序列化的新条目
///
/// 插入和更新操作先在内存中构造草稿，再按目标缩进渲染为物理行。
#[derive(Debug, Clone)]
pub struct EntryDraft {
    pub name: String,
    pub kind: EntryKind,
    pub category: String,
    /// 可选的 `model:` 字段（代理条目使用）
    pub model: Option<String>,
    pub description: String,
    pub source: String,
}

impl EntryDraft {
    /// 渲染为物理行序列
    ///
    /// 布局与手工维护的目录一致：`description` 带双引号，其余裸值；
    /// 属性行比 `- name:` 行多两格缩进。
    pub fn render_lines(&self, indent: usize) -> Vec<String> {
        let pad = " ".repeat(indent);
        let mut lines = vec![
            format!("{pad}- name: {}", self.name),
            format!("{pad}  type: {}", self.kind),
            format!("{pad}  category: {}", self.category),
        ];
        if let Some(model) = &self.model {
            lines.push(format!("{pad}  model: {model}"));
        }
        lines.push(format!("{pad}  description: \"{}\"", self.description));
        lines.push(format!("{pad}  source: {}", self.source));
        lines
    }
}

/// 按原有引号风格重写属性行的值
///
/// `redirect_field` 只改值不动格式：缩进、键名拼写、引号风格都保持原样。
pub fn rewrite_property_line(original: &str, key: &str, new_value: &str) -> String {
    let indent: String = original
        .chars()
        .take_while(|c| c.is_whitespace())
        .collect();
    let trimmed = original.trim();
    let old_value = trimmed
        .find(':')
        .map(|i| &trimmed[i + 1..])
        .unwrap_or("");
    if is_quoted(old_value) {
        format!("{indent}{key}: \"{new_value}\"")
    } else {
        format!("{indent}{key}: {new_value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_and_absorb() {
        let mut entry = Entry::open("testing-patterns", 2, 10);
        entry.absorb_property("type", "skill", 11);
        entry.absorb_property("category", "testing", 12);
        entry.absorb_property("description", "\"TDD and friends\"", 13);
        entry.absorb_property("source", "IDETOOLS/skills/testing-patterns", 14);
        entry.absorb_property("model", "sonnet", 15);

        assert_eq!(entry.name, "testing-patterns");
        assert_eq!(entry.kind, Some(EntryKind::Skill));
        assert_eq!(entry.description.as_deref(), Some("TDD and friends"));
        assert_eq!(entry.extra, vec![("model".to_string(), "sonnet".to_string())]);
        assert_eq!(entry.line_count(), 6);
    }

    #[test]
    fn test_name_only_entry_is_valid() {
        // 零属性条目也是合法条目
        let entry = Entry::open("bare", 2, 0);
        assert_eq!(entry.line_count(), 1);
        assert_eq!(entry.kind, None);
        assert_eq!(entry.description_len(), 0);
    }

    #[test]
    fn test_shift() {
        let mut entry = Entry::open("x", 2, 10);
        entry.extend_to(14);
        entry.shift(3);
        assert_eq!(entry.start_line, 13);
        assert_eq!(entry.end_line, 17);
        entry.shift(-5);
        assert_eq!(entry.start_line, 8);
    }

    #[test]
    fn test_draft_render() {
        let draft = EntryDraft {
            name: "testing-master".to_string(),
            kind: EntryKind::Skill,
            category: "testing".to_string(),
            model: None,
            description: "Comprehensive testing guide".to_string(),
            source: "IDETOOLS/skills/testing-master".to_string(),
        };
        let lines = draft.render_lines(2);
        assert_eq!(lines[0], "  - name: testing-master");
        assert_eq!(lines[1], "    type: skill");
        assert_eq!(lines[3], "    description: \"Comprehensive testing guide\"");
        assert_eq!(lines[4], "    source: IDETOOLS/skills/testing-master");
    }

    #[test]
    fn test_draft_render_with_model() {
        let draft = EntryDraft {
            name: "agent-x".to_string(),
            kind: EntryKind::Agent,
            category: "development".to_string(),
            model: Some("sonnet".to_string()),
            description: "d".to_string(),
            source: "PENDING/agent-x".to_string(),
        };
        let lines = draft.render_lines(2);
        assert_eq!(lines[3], "    model: sonnet");
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn test_rewrite_property_line_keeps_style() {
        // 裸值保持裸值
        let rewritten = rewrite_property_line("    source: PENDING/x", "source", "IDETOOLS/skills/x");
        assert_eq!(rewritten, "    source: IDETOOLS/skills/x");

        // 带引号的值保持引号
        let rewritten = rewrite_property_line("    source: \"PENDING/x\"", "source", "IDETOOLS/skills/x");
        assert_eq!(rewritten, "    source: \"IDETOOLS/skills/x\"");
    }
}
