/// 目录编辑器模块
///
/// 提供有状态的目录编辑接口，支持批量修改和延迟保存。
/// 遵循"修改-保存分离"原则，所有修改操作仅在内存中进行，
/// 需要显式调用保存。
use std::path::Path;

use super::delta::EditDelta;
use crate::catalog::parser::scan_entries;
use crate::catalog::Catalog;
use crate::datatypes::{classify_line, strip_quotes, EntryKind, LineShape};
use crate::io::CatalogWriter;
use crate::ops::{ConsolidationSpec, EditAction, EditOp, EditReport};
use crate::record::rewrite_property_line;
use crate::utils::CatalogError;

/// 插入位置
struct Placement {
    at: usize,
    leading_blank: bool,
    trailing_blank: bool,
}

/// 目录编辑器 - 管理目录的修改状态
///
/// # 核心特性
/// - **Stateful**: 维护修改状态，支持多次修改后统一保存
/// - **可追踪**: 所有变更与跳过的操作都进入变更日志
/// - **偏移一致**: 每次拼接后立即修正所有条目/分区/标记的行偏移，
///   重复编辑始终作用在正确的行范围上
///
/// # 使用示例
///
/// ```rust,ignore
/// use catalog_editor::{Catalog, CatalogEditor};
/// use catalog_editor::io::AtomicCatalogWriter;
///
/// let catalog = Catalog::load("index.yaml".into())?;
/// let mut editor = CatalogEditor::new(catalog);
///
/// editor.delete_block("obsolete-skill")?;
/// println!("已修改 {} 处", editor.modified_count());
///
/// let writer = AtomicCatalogWriter;
/// editor.save(&writer, Path::new("index.yaml"))?;
/// ```
pub struct CatalogEditor {
    /// 底层目录实例
    catalog: Catalog,
    /// 变更日志
    delta: EditDelta,
}

impl CatalogEditor {
    /// 创建新的目录编辑器
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            delta: EditDelta::new(),
        }
    }

    /// 在锚点之后插入已序列化的条目行
    ///
    /// 锚点优先解析为条目名：在该条目行范围之后拼接一个空行分隔符
    /// 加新行。条目不存在时回退为标记注释（按前缀匹配）：新行拼接在
    /// 标记行之前，后跟一个空行。两者都不存在时返回 `AnchorNotFound`。
    pub fn insert_after(
        &mut self,
        anchor: &str,
        new_lines: &[String],
    ) -> Result<(), CatalogError> {
        let placement = if let Some(entry) = self.catalog.find_entry(anchor) {
            Placement {
                at: entry.end_line + 1,
                leading_blank: true,
                trailing_blank: false,
            }
        } else if let Some(marker) = self.catalog.find_marker(anchor) {
            Placement {
                at: marker.line,
                leading_blank: false,
                trailing_blank: true,
            }
        } else {
            return Err(CatalogError::AnchorNotFound(anchor.to_string()));
        };

        let mut block: Vec<String> = Vec::with_capacity(new_lines.len() + 1);
        if placement.leading_blank {
            block.push(String::new());
        }
        block.extend(new_lines.iter().cloned());
        if placement.trailing_blank {
            block.push(String::new());
        }

        let at = placement.at;
        let block_len = block.len();
        self.catalog.lines.splice(at..at, block);
        Self::shift_tracking(&mut self.catalog, at, block_len as isize);

        for name in self.register_block(at, block_len) {
            self.delta
                .record_change(name.clone(), EditAction::Insert, "", name);
        }
        Ok(())
    }

    /// 把已序列化的条目块追加到文件末尾
    ///
    /// 先收掉末尾的空白行，再以一个空行分隔追加新块，
    /// 块后保留一个空元素使输出以换行结尾。
    pub fn append_block(&mut self, new_lines: &[String]) {
        while self
            .catalog
            .lines
            .last()
            .map(|l| l.trim().is_empty())
            .unwrap_or(false)
        {
            self.catalog.lines.pop();
        }
        // 被收掉的尾部空行可能在某个条目范围内，收敛其结束行
        let last = self.catalog.lines.len().saturating_sub(1);
        for entry in &mut self.catalog.entries {
            if entry.end_line > last {
                entry.end_line = last;
            }
        }

        let at = self.catalog.lines.len();
        self.catalog.lines.push(String::new());
        self.catalog.lines.extend(new_lines.iter().cloned());
        self.catalog.lines.push(String::new());

        for name in self.register_block(at + 1, new_lines.len()) {
            self.delta
                .record_change(name.clone(), EditAction::Insert, "", name);
        }
    }

    /// 整块替换条目的行
    ///
    /// 旧行范围全量替换：新内容比旧的短时不会留下孤儿尾行，
    /// 后续条目的行范围按长度差整体平移。
    pub fn update_in_place(
        &mut self,
        name: &str,
        new_lines: &[String],
    ) -> Result<(), CatalogError> {
        let idx = self
            .catalog
            .entry_index(name)
            .ok_or_else(|| CatalogError::RecordNotFound(name.to_string()))?;
        let removed = self.catalog.entries.remove(idx);
        let old_len = removed.line_count();
        let new_len = new_lines.len();

        self.catalog
            .lines
            .splice(removed.start_line..=removed.end_line, new_lines.iter().cloned());
        Self::shift_tracking(
            &mut self.catalog,
            removed.end_line + 1,
            new_len as isize - old_len as isize,
        );

        let inserted = self.register_block(removed.start_line, new_len);
        self.delta.record_change(
            removed.name,
            EditAction::Update,
            removed.description.unwrap_or_default(),
            inserted
                .first()
                .and_then(|n| self.catalog.find_entry(n))
                .and_then(|e| e.description.clone())
                .unwrap_or_default(),
        );
        Ok(())
    }

    /// 只改写条目内单个字段的值
    ///
    /// 在条目行范围内找到键匹配的属性行，保持其缩进和引号风格重写值。
    /// 值已相等时是无操作（返回 Ok(false)，不计入变更日志）。
    pub fn redirect_field(
        &mut self,
        name: &str,
        field: &str,
        new_value: &str,
    ) -> Result<bool, CatalogError> {
        let idx = self
            .catalog
            .entry_index(name)
            .ok_or_else(|| CatalogError::RecordNotFound(name.to_string()))?;
        let (start, end, base_indent) = {
            let entry = &self.catalog.entries[idx];
            (entry.start_line, entry.end_line, entry.base_indent)
        };

        // 起始行是 `- name:`，属性行从下一行开始
        for i in start + 1..=end.min(self.catalog.lines.len().saturating_sub(1)) {
            let (key_matches, old_value) = match classify_line(&self.catalog.lines[i]) {
                LineShape::Property { key, value, indent }
                    if key == field && indent > base_indent =>
                {
                    (true, strip_quotes(value).to_string())
                }
                _ => (false, String::new()),
            };
            if !key_matches {
                continue;
            }

            if old_value == new_value {
                return Ok(false);
            }

            self.catalog.lines[i] =
                rewrite_property_line(&self.catalog.lines[i], field, new_value);

            // 同步结构化字段
            let entry = &mut self.catalog.entries[idx];
            match field {
                "category" => entry.category = Some(new_value.to_string()),
                "description" => entry.description = Some(new_value.to_string()),
                "source" => entry.source = Some(new_value.to_string()),
                "type" => entry.kind = EntryKind::parse(new_value),
                _ => {
                    if let Some(pair) = entry.extra.iter_mut().find(|(k, _)| k == field) {
                        pair.1 = new_value.to_string();
                    }
                }
            }

            self.delta
                .record_change(name, EditAction::Redirect, old_value, new_value);
            return Ok(true);
        }

        Err(CatalogError::FieldNotFound {
            name: name.to_string(),
            field: field.to_string(),
        })
    }

    /// 删除条目的整个行块
    pub fn delete_block(&mut self, name: &str) -> Result<(), CatalogError> {
        let idx = self
            .catalog
            .entry_index(name)
            .ok_or_else(|| CatalogError::RecordNotFound(name.to_string()))?;
        let removed = self.catalog.entries.remove(idx);

        self.catalog
            .lines
            .drain(removed.start_line..=removed.end_line);
        Self::shift_tracking(
            &mut self.catalog,
            removed.end_line + 1,
            -(removed.line_count() as isize),
        );

        self.delta.record_change(
            removed.name,
            EditAction::Delete,
            removed.description.unwrap_or_default(),
            "",
        );
        Ok(())
    }

    /// 按调用顺序应用一组声明式操作
    ///
    /// "未找到"一类的失败按操作记入跳过列表后继续执行，
    /// 返回当前会话的汇总报告（部分成功是预期结果）。
    pub fn apply_ops(&mut self, ops: &[EditOp]) -> EditReport {
        for op in ops {
            let result = match op {
                EditOp::Insert { anchor, lines } => self.insert_after(anchor, lines),
                EditOp::Update { name, lines } => self.update_in_place(name, lines),
                EditOp::Redirect { name, field, value } => {
                    self.redirect_field(name, field, value).map(|_| ())
                }
                EditOp::Delete { name } => self.delete_block(name),
            };
            if let Err(e) = result {
                self.delta
                    .record_skip(op.target(), op.action(), e.to_string());
            }
        }
        self.report()
    }

    /// 应用整合规格列表
    ///
    /// 每条规格：主条目已存在则原位更新，否则插入到被取代条目之后；
    /// 随后把被取代条目的 `source` 重定向到主条目的规范路径。
    /// 被取代条目不存在时该规格记为跳过，继续处理后续规格。
    pub fn apply_consolidation(
        &mut self,
        specs: &[ConsolidationSpec],
        source_prefix: &str,
    ) -> EditReport {
        for spec in specs {
            let draft = spec.to_draft(source_prefix);

            if let Some(existing) = self.catalog.find_entry(&spec.name) {
                let lines = draft.render_lines(existing.base_indent);
                if let Err(e) = self.update_in_place(&spec.name, &lines) {
                    self.delta
                        .record_skip(&spec.name, EditAction::Update, e.to_string());
                }
            } else if let Some(replaced) = self.catalog.find_entry(&spec.replaces) {
                let lines = draft.render_lines(replaced.base_indent);
                if let Err(e) = self.insert_after(&spec.replaces, &lines) {
                    self.delta
                        .record_skip(&spec.name, EditAction::Insert, e.to_string());
                }
            } else {
                self.delta.record_skip(
                    &spec.name,
                    EditAction::Insert,
                    format!("Anchor not found: {}", spec.replaces),
                );
                continue;
            }

            // 被取代条目重定向到主条目
            if self.catalog.find_entry(&spec.replaces).is_some() {
                if let Err(e) =
                    self.redirect_field(&spec.replaces, "source", &spec.canonical_source(source_prefix))
                {
                    self.delta
                        .record_skip(&spec.replaces, EditAction::Redirect, e.to_string());
                }
            }
        }
        self.report()
    }

    /// 当前会话的汇总报告
    pub fn report(&self) -> EditReport {
        EditReport {
            added: self.delta.count_action(EditAction::Insert),
            updated: self.delta.count_action(EditAction::Update),
            redirected: self.delta.count_action(EditAction::Redirect),
            removed: self.delta.count_action(EditAction::Delete),
            skipped: self.delta.skips().to_vec(),
        }
    }

    /// 检查是否有修改
    pub fn is_modified(&self) -> bool {
        !self.delta.is_empty()
    }

    /// 获取修改数量
    pub fn modified_count(&self) -> usize {
        self.delta.len()
    }

    /// 获取变更日志的引用
    pub fn modifications(&self) -> &EditDelta {
        &self.delta
    }

    /// 保存到文件（需要显式调用）
    ///
    /// 保存前重算头部计数器，保证计数器等于存活条目数。
    ///
    /// # 参数
    /// * `writer` - 目录文件写入器（流水线默认用 AtomicCatalogWriter）
    /// * `path` - 目标文件路径
    pub fn save(&mut self, writer: &dyn CatalogWriter, path: &Path) -> Result<(), CatalogError> {
        self.catalog.update_counters();
        self.catalog.write_with(writer, path)
    }

    /// 保存到原路径
    pub fn save_to_original(&mut self, writer: &dyn CatalogWriter) -> Result<(), CatalogError> {
        let path = self.catalog.path.clone().ok_or_else(|| {
            CatalogError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "目录不是从文件加载的，没有原路径",
            ))
        })?;
        self.save(writer, &path)
    }

    /// 获取底层 Catalog 的不可变引用
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// 获取底层 Catalog 的可变引用
    ///
    /// # 警告
    /// 直接修改 Catalog 可能导致变更日志失效，请谨慎使用
    pub fn catalog_mut(&mut self) -> &mut Catalog {
        &mut self.catalog
    }

    /// 生成编辑摘要
    pub fn summary(&self) -> String {
        format!(
            "目录: {}, 修改状态: {}, {}",
            self.catalog
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<memory>".to_string()),
            if self.is_modified() { "已修改" } else { "未修改" },
            self.delta.summary()
        )
    }

    /// 拼接后修正所有行偏移追踪
    fn shift_tracking(catalog: &mut Catalog, from: usize, delta: isize) {
        for entry in &mut catalog.entries {
            if entry.start_line >= from {
                entry.shift(delta);
            }
        }
        for section in &mut catalog.sections {
            if section.line >= from {
                section.line = (section.line as isize + delta) as usize;
            }
        }
        for marker in &mut catalog.markers {
            if marker.line >= from {
                marker.line = (marker.line as isize + delta) as usize;
            }
        }
        if catalog.header_end >= from {
            catalog.header_end = (catalog.header_end as isize + delta) as usize;
        }
    }

    /// 解析新拼接的行块并登记条目
    ///
    /// 返回登记的条目名，保持 entries 按起始行有序。
    fn register_block(&mut self, at: usize, len: usize) -> Vec<String> {
        let default_kind = Self::section_kind_at(&self.catalog, at);
        let mut parsed = Vec::new();
        let mut warnings = Vec::new();
        scan_entries(
            &self.catalog.lines,
            at..at + len,
            default_kind,
            &mut parsed,
            &mut warnings,
        );
        self.catalog.warnings.extend(warnings);

        let mut names = Vec::with_capacity(parsed.len());
        for entry in parsed {
            names.push(entry.name.clone());
            let pos = self
                .catalog
                .entries
                .partition_point(|e| e.start_line < entry.start_line);
            self.catalog.entries.insert(pos, entry);
        }
        names
    }

    /// 指定行所在的分区类型
    fn section_kind_at(catalog: &Catalog, line: usize) -> Option<EntryKind> {
        catalog
            .sections
            .iter()
            .filter(|s| s.line < line)
            .next_back()
            .map(|s| s.kind)
    }
}
