use serde::{Deserialize, Serialize};

/// 条目类型
///
/// 目录中的每个条目要么是技能（skill）要么是代理（agent），
/// 两类条目各自维护独立的头部计数器和文件分区。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Skill,
    Agent,
}

impl EntryKind {
    /// 从 `type:` 字段值解析条目类型
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "skill" => Some(EntryKind::Skill),
            "agent" => Some(EntryKind::Agent),
            _ => None,
        }
    }

    /// 类型标签（写入 `type:` 字段的形式）
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Skill => "skill",
            EntryKind::Agent => "agent",
        }
    }

    /// 对应的头部计数器键名
    pub fn counter_key(&self) -> &'static str {
        match self {
            EntryKind::Skill => "total_skills",
            EntryKind::Agent => "total_agents",
        }
    }

    /// 分区标题中识别该类型的关键字
    pub fn section_keyword(&self) -> &'static str {
        match self {
            EntryKind::Skill => "SKILLS",
            EntryKind::Agent => "AGENTS",
        }
    }

    /// 分区顶层键名（`skills:` / `agents:`）
    pub fn section_key(&self) -> &'static str {
        match self {
            EntryKind::Skill => "skills",
            EntryKind::Agent => "agents",
        }
    }

    /// 所有已知条目类型
    pub fn all() -> &'static [EntryKind] {
        &[EntryKind::Skill, EntryKind::Agent]
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 行终止符
///
/// 重写目录时必须使用源文件原有的终止符，否则零修改重写也会产生差异。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
}

impl LineEnding {
    /// 检测文本使用的行终止符
    pub fn detect(text: &str) -> Self {
        if text.contains("\r\n") {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// 物理行的形状分类
///
/// 解析器按行扫描，每行先归入一种形状再驱动状态机。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineShape<'a> {
    /// 空行（或仅空白）
    Blank,
    /// 条目起始：`- name: <value>`
    EntryStart { name: &'a str, indent: usize },
    /// 属性行：`key: value`
    Property {
        key: &'a str,
        value: &'a str,
        indent: usize,
    },
    /// 注释行（`#` 开头）
    Comment { text: &'a str },
    /// 其他无法识别的行
    Other,
}

/// 分类单个物理行
pub fn classify_line(line: &str) -> LineShape<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineShape::Blank;
    }
    let indent = indent_width(line);
    if trimmed.starts_with('#') {
        return LineShape::Comment { text: trimmed };
    }
    if let Some(name) = parse_entry_name(trimmed) {
        return LineShape::EntryStart { name, indent };
    }
    if let Some((key, value)) = split_key_value(trimmed) {
        return LineShape::Property { key, value, indent };
    }
    LineShape::Other
}

/// 前导空白字符数（缩进）
pub fn indent_width(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

/// 从条目起始行提取名字
///
/// 匹配修剪后形如 `- name: <value>` 的行，返回修剪后的名字。
pub fn parse_entry_name(trimmed: &str) -> Option<&str> {
    let rest = trimmed.strip_prefix('-')?.trim_start();
    let value = rest.strip_prefix("name:")?;
    let name = value.trim();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// 把修剪后的行拆分为 `key: value`
///
/// 键必须由字母、数字、下划线或连字符组成，排除 `- name:` 这类列表项。
pub fn split_key_value(trimmed: &str) -> Option<(&str, &str)> {
    let colon = trimmed.find(':')?;
    let key = trimmed[..colon].trim();
    if key.is_empty()
        || !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return None;
    }
    Some((key, trimmed[colon + 1..].trim()))
}

/// 去掉值两侧成对的引号
pub fn strip_quotes(value: &str) -> &str {
    let v = value.trim();
    if v.len() >= 2 {
        let bytes = v.as_bytes();
        if (bytes[0] == b'"' && bytes[v.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[v.len() - 1] == b'\'')
        {
            return &v[1..v.len() - 1];
        }
    }
    v
}

/// 值在源文件中是否带引号（重写字段时保持原有引号风格）
pub fn is_quoted(value: &str) -> bool {
    let v = value.trim();
    v.len() >= 2
        && ((v.starts_with('"') && v.ends_with('"'))
            || (v.starts_with('\'') && v.ends_with('\'')))
}

/// 检测并剥离字节序标记（BOM）
///
/// 返回 `(是否带BOM, BOM之后的字节)`。仅 UTF-8 BOM 视为有效，
/// 其他编码的 BOM 按原样保留在数据中。
pub fn strip_bom(bytes: &[u8]) -> (bool, &[u8]) {
    if let Some((encoding, bom_len)) = encoding_rs::Encoding::for_bom(bytes) {
        if encoding == encoding_rs::UTF_8 {
            return (true, &bytes[bom_len..]);
        }
    }
    (false, bytes)
}

/// UTF-8 BOM 字节序列
pub const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
