use super::{Catalog, Marker, ParseWarning, Section};
use crate::datatypes::{
    classify_line, indent_width, strip_bom, EntryKind, LineEnding, LineShape,
};
use crate::io::CatalogReader;
use crate::record::Entry;
use crate::utils::CatalogError;
use std::collections::HashSet;
use std::ops::Range;
use std::path::PathBuf;

impl Catalog {
    /// 从文件加载目录
    pub fn load(path: PathBuf) -> Result<Self, CatalogError> {
        let reader = crate::io::DefaultCatalogReader;
        Self::load_with_reader(path, &reader)
    }

    /// 使用自定义 Reader 加载目录
    ///
    /// 通过依赖注入支持自定义 IO 实现（内存、网络等），便于测试和扩展。
    pub fn load_with_reader(
        path: PathBuf,
        reader: &dyn CatalogReader,
    ) -> Result<Self, CatalogError> {
        let raw = reader.read(&path)?;
        Ok(Self::from_bytes(&raw.bytes, Some(path)))
    }

    /// 从原始字节解析（处理 BOM 与编码）
    pub fn from_bytes(bytes: &[u8], path: Option<PathBuf>) -> Self {
        let (bom, rest) = strip_bom(bytes);
        // 目录是手工编辑的，容忍非法序列（替换字符），不中断
        let (text, _had_errors) = encoding_rs::UTF_8.decode_without_bom_handling(rest);
        let mut catalog = Self::from_text(&text);
        catalog.bom = bom;
        catalog.path = path;
        catalog
    }

    /// 从文本解析目录
    ///
    /// 两遍扫描：第一遍定位分区标记、标记注释和头部边界；
    /// 第二遍逐分区解析条目块。头部区域（第一个分区标记之前）
    /// 的所有行原样保留，不产生告警。
    pub fn from_text(text: &str) -> Self {
        let line_ending = LineEnding::detect(text);
        let lines: Vec<String> = text
            .split('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l).to_string())
            .collect();

        let mut sections = Vec::new();
        let mut markers = Vec::new();

        // 第一遍：分区与标记
        for (i, line) in lines.iter().enumerate() {
            match classify_line(line) {
                LineShape::Comment { text } => {
                    if let Some(kind) = section_kind_of_comment(text) {
                        sections.push(Section {
                            kind,
                            title: text.to_string(),
                            line: i,
                        });
                    } else if text.starts_with("# ---") {
                        markers.push(Marker {
                            text: text.to_string(),
                            line: i,
                        });
                    }
                }
                LineShape::Property { key, value, indent } => {
                    if indent == 0 && value.is_empty() {
                        if let Some(kind) =
                            EntryKind::all().iter().find(|k| k.section_key() == key)
                        {
                            sections.push(Section {
                                kind: *kind,
                                title: key.to_string(),
                                line: i,
                            });
                        }
                    }
                }
                _ => {}
            }
        }

        let header_end = sections.first().map(|s| s.line).unwrap_or(lines.len());

        // 第二遍：逐分区解析条目
        let mut entries = Vec::new();
        let mut warnings = Vec::new();
        for (idx, section) in sections.iter().enumerate() {
            let region_end = sections
                .get(idx + 1)
                .map(|s| s.line)
                .unwrap_or(lines.len());
            scan_entries(
                &lines,
                section.line + 1..region_end,
                Some(section.kind),
                &mut entries,
                &mut warnings,
            );
        }

        // 重名检测：查找绑定第一个出现的，其余上报
        let mut seen: HashSet<&str> = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.name.as_str()) {
                warnings.push(ParseWarning::DuplicateName {
                    name: entry.name.clone(),
                    line: entry.start_line,
                });
            }
        }

        Catalog {
            path: None,
            lines,
            entries,
            sections,
            markers,
            warnings,
            header_end,
            bom: false,
            line_ending,
        }
    }
}

/// 分区标题注释识别（`# SKILLS` / `# AGENTS`）
fn section_kind_of_comment(trimmed: &str) -> Option<EntryKind> {
    EntryKind::all()
        .iter()
        .copied()
        .find(|k| trimmed.contains(k.section_keyword()))
}

/// 扫描一段行区间内的条目块
///
/// 状态机规则（与手工目录的实际形状对齐）：
/// - `- name:` 行开启新条目，记录其缩进为基准
/// - 空行归入当前条目
/// - 缩进大于基准的属性行被吸收；其他缩进更深的行按换行续行处理
/// - 注释行和缩进 ≤ 基准的非条目行关闭当前条目，且不计入条目范围
/// - 区间结束时关闭未完的条目
///
/// 无法识别的行跳过并产生告警，解析不中断。
pub(crate) fn scan_entries(
    lines: &[String],
    range: Range<usize>,
    default_kind: Option<EntryKind>,
    entries: &mut Vec<Entry>,
    warnings: &mut Vec<ParseWarning>,
) {
    let mut open: Option<Entry> = None;

    let close = |open: &mut Option<Entry>, entries: &mut Vec<Entry>| {
        if let Some(mut entry) = open.take() {
            if entry.kind.is_none() {
                entry.kind = default_kind;
            }
            entries.push(entry);
        }
    };

    for i in range {
        let line = &lines[i];
        match classify_line(line) {
            LineShape::EntryStart { name, indent } => {
                close(&mut open, entries);
                open = Some(Entry::open(name, indent, i));
            }
            LineShape::Blank => {
                if let Some(entry) = open.as_mut() {
                    entry.extend_to(i);
                }
            }
            LineShape::Comment { .. } => {
                // 注释关闭条目，自身不计入条目范围
                close(&mut open, entries);
            }
            LineShape::Property { key, value, indent } => {
                let absorbed = match open.as_mut() {
                    Some(entry) if indent > entry.base_indent => {
                        entry.absorb_property(key, value, i);
                        true
                    }
                    _ => false,
                };
                if !absorbed {
                    // 顶层键：关闭条目，行本身不消费
                    close(&mut open, entries);
                }
            }
            LineShape::Other => {
                let absorbed = match open.as_mut() {
                    Some(entry) if indent_width(line) > entry.base_indent => {
                        // 换行续行（description 折行等）
                        entry.extend_to(i);
                        true
                    }
                    _ => false,
                };
                if !absorbed {
                    close(&mut open, entries);
                    warnings.push(ParseWarning::UnrecognizedLine {
                        line: i,
                        content: line.clone(),
                    });
                }
            }
        }
    }

    close(&mut open, entries);
}
